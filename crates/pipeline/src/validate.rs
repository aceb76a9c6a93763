//! Safety policy for model generated pipelines.
//!
//! Two checks run on every pipeline:
//!
//! - The whole pipeline is serialized, lowercased, and scanned for denied
//!   operator substrings. This catches operators nested anywhere inside stage
//!   arguments (`$function` inside a `$group` accumulator, `$where` inside a
//!   `$lookup` sub-pipeline) without having to understand every operator's
//!   argument shape.
//! - Top level stage names are compared against denied stages. Write stages
//!   are only valid at the top level, so a structural check is exact there
//!   and avoids false positives like `$mergeObjects`.
//!
//! A match anywhere rejects the entire pipeline.
use tracing::error;

use crate::errors::SecurityRejection;
use crate::stage::Pipeline;

/// Operators that evaluate arbitrary JavaScript inside the server.
pub const DEFAULT_DENIED_OPERATORS: &[&str] = &["$where", "$function", "$accumulator"];

/// Stages that write to collections.
pub const DEFAULT_DENIED_STAGES: &[&str] = &["$out", "$merge"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Substrings that may not appear anywhere in the serialized pipeline.
    pub denied_operators: Vec<String>,
    /// Operator names that may not be used as a top level stage.
    pub denied_stages: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            denied_operators: DEFAULT_DENIED_OPERATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            denied_stages: DEFAULT_DENIED_STAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ValidatorConfig {
    pub fn with_denied_operator(mut self, operator: impl Into<String>) -> Self {
        self.denied_operators.push(operator.into());
        self
    }

    pub fn with_denied_stage(mut self, stage: impl Into<String>) -> Self {
        self.denied_stages.push(stage.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct PipelineValidator {
    denied_operators: Vec<String>,
    denied_stages: Vec<String>,
}

impl PipelineValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        let normalize = |entries: Vec<String>| -> Vec<String> {
            let mut entries: Vec<_> = entries
                .into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            entries.sort();
            entries.dedup();
            entries
        };

        PipelineValidator {
            denied_operators: normalize(config.denied_operators),
            denied_stages: normalize(config.denied_stages),
        }
    }

    pub fn denied_operators(&self) -> &[String] {
        &self.denied_operators
    }

    pub fn denied_stages(&self) -> &[String] {
        &self.denied_stages
    }

    /// Pass the pipeline through if it satisfies the policy.
    pub fn validate(&self, pipeline: Pipeline) -> Result<Pipeline, SecurityRejection> {
        match self.check(&pipeline) {
            Ok(()) => Ok(pipeline),
            Err(rejection) => {
                error!(%rejection, %pipeline, "rejected pipeline");
                Err(rejection)
            }
        }
    }

    /// Check the pipeline against the policy without consuming it.
    pub fn check(&self, pipeline: &Pipeline) -> Result<(), SecurityRejection> {
        for (index, stage) in pipeline.stages().iter().enumerate() {
            let Some(op) = stage.operator() else {
                continue;
            };
            let op = op.to_lowercase();
            if self.denied_stages.iter().any(|denied| *denied == op) {
                return Err(SecurityRejection::DeniedStage { index, stage: op });
            }
        }

        let canonical = serde_json::to_string(pipeline)?.to_lowercase();
        if let Some(operator) = self
            .denied_operators
            .iter()
            .find(|denied| canonical.contains(denied.as_str()))
        {
            return Err(SecurityRejection::DeniedOperator {
                operator: operator.clone(),
            });
        }

        Ok(())
    }
}

impl Default for PipelineValidator {
    fn default() -> Self {
        PipelineValidator::new(ValidatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::translate::parse_pipeline;

    fn pipeline(v: Value) -> Pipeline {
        serde_json::from_value(v).unwrap()
    }

    fn top_commodities() -> Pipeline {
        pipeline(json!([
            {"$lookup": {"from": "commodities", "localField": "commodity_id", "foreignField": "_id", "as": "commodity_doc"}},
            {"$unwind": "$commodity_doc"},
            {"$group": {"_id": "$commodity_doc.commodity_name", "totalValue": {"$sum": "$value_usd"}}},
            {"$sort": {"totalValue": -1}},
            {"$limit": 5},
        ]))
    }

    #[test]
    fn passes_read_only_pipeline() {
        let validator = PipelineValidator::default();
        let p = top_commodities();
        assert_eq!(p, validator.validate(p.clone()).unwrap());
    }

    #[test]
    fn validation_is_idempotent() {
        let validator = PipelineValidator::default();
        let once = validator.validate(top_commodities()).unwrap();
        let twice = validator.validate(once.clone()).unwrap();
        assert_eq!(once, twice);

        let bad = pipeline(json!([{"$where": "this.value_usd > 0"}]));
        let first = validator.check(&bad).unwrap_err().to_string();
        let second = validator.check(&bad).unwrap_err().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_top_level_where() {
        let validator = PipelineValidator::default();
        let p = pipeline(json!([{"$where": "this.value_usd > 0"}]));
        match validator.validate(p).unwrap_err() {
            SecurityRejection::DeniedOperator { operator } => assert_eq!("$where", operator),
            other => panic!("unexpected rejection: {other}"),
        }
    }

    #[test]
    fn rejects_regardless_of_casing() {
        let validator = PipelineValidator::default();
        let p = pipeline(json!([{"$match": {"$WhErE": "sleep(1000)"}}]));
        assert!(validator.check(&p).is_err());
    }

    #[test]
    fn rejects_deeply_nested_operators() {
        let validator = PipelineValidator::default();
        let p = pipeline(json!([
            {"$lookup": {
                "from": "countries",
                "pipeline": [
                    {"$match": {"$expr": {"$and": [{"$function": {"body": "function() { return true }", "args": [], "lang": "js"}}]}}}
                ],
                "as": "c",
            }},
        ]));
        match validator.check(&p).unwrap_err() {
            SecurityRejection::DeniedOperator { operator } => assert_eq!("$function", operator),
            other => panic!("unexpected rejection: {other}"),
        }
    }

    #[test]
    fn rejects_operator_in_string_values() {
        // Matches inside string values too.
        let validator = PipelineValidator::default();
        let p = pipeline(json!([{"$match": {"note": "use $accumulator here"}}]));
        assert!(validator.check(&p).is_err());
    }

    #[test]
    fn rejects_unicode_escaped_operator() {
        let validator = PipelineValidator::default();
        let p = parse_pipeline(r#"[{"$wh\u0065re": "true"}]"#).unwrap();
        assert!(validator.check(&p).is_err());
    }

    #[test]
    fn rejects_write_stages() {
        let validator = PipelineValidator::default();
        for stage in ["$out", "$merge", "$OUT"] {
            let p = pipeline(json!([{"$match": {}}, {stage: "trades"}]));
            match validator.check(&p).unwrap_err() {
                SecurityRejection::DeniedStage { index, stage: got } => {
                    assert_eq!(1, index);
                    assert_eq!(stage.to_lowercase(), got);
                }
                other => panic!("unexpected rejection: {other}"),
            }
        }
    }

    #[test]
    fn merge_objects_is_not_a_write_stage() {
        let validator = PipelineValidator::default();
        let p = pipeline(json!([
            {"$group": {"_id": "$trade_type", "doc": {"$mergeObjects": "$$ROOT"}}},
        ]));
        validator.check(&p).unwrap();
    }

    #[test]
    fn denylist_is_extendable() {
        let config = ValidatorConfig::default().with_denied_operator("  $LOOKUP ");
        let validator = PipelineValidator::new(config);
        assert!(validator.denied_operators().contains(&"$lookup".to_string()));
        assert!(validator.check(&top_commodities()).is_err());

        let validator = PipelineValidator::new(ValidatorConfig::default().with_denied_stage("$unwind"));
        match validator.check(&top_commodities()).unwrap_err() {
            SecurityRejection::DeniedStage { index, .. } => assert_eq!(1, index),
            other => panic!("unexpected rejection: {other}"),
        }
    }

    #[test]
    fn empty_entries_ignored() {
        let config = ValidatorConfig {
            denied_operators: vec!["".to_string(), "   ".to_string()],
            denied_stages: Vec::new(),
        };
        let validator = PipelineValidator::new(config);
        assert!(validator.denied_operators().is_empty());
        validator.check(&top_commodities()).unwrap();
    }
}
