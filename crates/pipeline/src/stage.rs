use std::fmt;

use bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{EmptyPipelineError, ExecutionError};

/// A single aggregation stage, an operator name mapped to its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(Map<String, Value>);

impl Stage {
    pub fn new(inner: Map<String, Value>) -> Self {
        Stage(inner)
    }

    /// Operator name of this stage, e.g. `$match`.
    ///
    /// A well formed stage has exactly one key. Extra keys are left for the
    /// store to reject.
    pub fn operator(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }

    pub fn to_document(&self) -> Result<Document, bson::ser::Error> {
        bson::to_document(&self.0)
    }
}

/// An ordered, non-empty sequence of stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Never true for a constructed pipeline.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn to_documents(&self) -> Result<Vec<Document>, ExecutionError> {
        self.stages
            .iter()
            .map(|stage| stage.to_document().map_err(ExecutionError::from))
            .collect()
    }
}

/// Compact json, the same text the validator inspects.
impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.stages).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl TryFrom<Vec<Stage>> for Pipeline {
    type Error = EmptyPipelineError;

    fn try_from(stages: Vec<Stage>) -> Result<Self, Self::Error> {
        if stages.is_empty() {
            return Err(EmptyPipelineError);
        }
        Ok(Pipeline { stages })
    }
}

impl From<Pipeline> for Vec<Stage> {
    fn from(pipeline: Pipeline) -> Self {
        pipeline.stages
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pipeline(v: Value) -> Pipeline {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn empty_pipeline_rejected() {
        let res: Result<Pipeline, _> = serde_json::from_value(json!([]));
        assert!(res.is_err());
        assert_eq!(Err(EmptyPipelineError), Pipeline::try_from(Vec::new()));
    }

    #[test]
    fn operator_is_first_key() {
        let p = pipeline(json!([{"$limit": 5}, {"$sort": {"totalValue": -1}}]));
        let ops: Vec<_> = p.stages().iter().map(|s| s.operator()).collect();
        assert_eq!(vec![Some("$limit"), Some("$sort")], ops);
    }

    #[test]
    fn serializes_as_plain_array() {
        let v = json!([{"$unwind": "$commodity_doc"}]);
        let p = pipeline(v.clone());
        assert_eq!(v, serde_json::to_value(&p).unwrap());
    }

    #[test]
    fn displays_as_compact_json() {
        let p = pipeline(json!([
            {"$match": {"trade_type": "Export"}},
            {"$sort": {"year": 1, "value_usd": -1}},
        ]));
        assert_eq!(
            r#"[{"$match":{"trade_type":"Export"}},{"$sort":{"year":1,"value_usd":-1}}]"#,
            p.to_string()
        );
    }

    #[test]
    fn to_documents_keeps_key_order() {
        let p = pipeline(json!([{"$sort": {"year": 1, "totalValue": -1}}]));
        let docs = p.to_documents().unwrap();
        assert_eq!(1, docs.len());

        let sort = docs[0].get_document("$sort").unwrap();
        let keys: Vec<_> = sort.keys().map(String::as_str).collect();
        assert_eq!(vec!["year", "totalValue"], keys);
    }
}
