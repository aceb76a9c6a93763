//! Natural language to pipeline translation.
//!
//! The model output is untrusted. Whatever comes back is parsed strictly and
//! anything that isn't a non-empty list of stage objects is a failure. The
//! one leniency is a bare object, which models emit when asked for json
//! mode, and which is wrapped into a one stage pipeline.
use std::sync::Arc;

use llm::CompletionBackend;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::errors::TranslationError;
use crate::stage::{Pipeline, Stage};

/// Schema description and output contract given to the model.
///
/// The user's query is never spliced into this text, it's sent as a separate
/// user message.
pub const SYSTEM_INSTRUCTIONS: &str = r#"You translate questions about international trade into MongoDB aggregation pipelines.

Respond with ONLY a JSON array of pipeline stages. The first character of your
response must be '[' and the last must be ']'. Do not wrap the array in
markdown code fences and do not add any explanation.

The pipeline runs against the 'trades' collection. Collections:
- trades: { country_id: ObjectId, commodity_id: ObjectId, year_id: ObjectId, trade_type: String ("Import" or "Export"), value_usd: Number }
- countries: { _id: ObjectId, country_name: String }
- commodities: { _id: ObjectId, commodity_name: String }
- years: { _id: ObjectId, year: Number }

Country, commodity, and year details live in their own collections. Join them
onto trades with '$lookup' followed by '$unwind' before filtering or grouping
on them.

Example question: "exports from india"
Example response:
[{"$lookup": {"from": "countries", "localField": "country_id", "foreignField": "_id", "as": "country_doc"}}, {"$unwind": "$country_doc"}, {"$match": {"country_doc.country_name": "India", "trade_type": "Export"}}]

Example question: "top 5 commodities by value"
Example response:
[{"$lookup": {"from": "commodities", "localField": "commodity_id", "foreignField": "_id", "as": "commodity_doc"}}, {"$unwind": "$commodity_doc"}, {"$group": {"_id": "$commodity_doc.commodity_name", "totalValue": {"$sum": "$value_usd"}}}, {"$sort": {"totalValue": -1}}, {"$limit": 5}]
"#;

#[derive(Debug, Clone)]
pub struct Translator {
    backend: Arc<dyn CompletionBackend>,
}

impl Translator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Translator { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Ask the model for a pipeline answering `user_query`.
    ///
    /// Every failure is logged here with the raw model output since the
    /// output isn't reproducible.
    pub async fn translate(&self, user_query: &str) -> Result<Pipeline, TranslationError> {
        let raw = match self.backend.complete(SYSTEM_INSTRUCTIONS, user_query).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(backend = self.backend.name(), %user_query, error = %e, "completion request failed");
                return Err(e.into());
            }
        };

        debug!(backend = self.backend.name(), %raw, "raw model response");

        parse_pipeline(&raw).inspect_err(|e| {
            warn!(
                backend = self.backend.name(),
                %user_query,
                error = %e,
                raw = e.raw_response().unwrap_or_default(),
                "model response is not a usable pipeline"
            );
        })
    }
}

/// Parse raw model output into a pipeline.
pub fn parse_pipeline(raw: &str) -> Result<Pipeline, TranslationError> {
    let value: Value = serde_json::from_str(raw).map_err(|source| {
        TranslationError::InvalidJson {
            source,
            raw: raw.to_string(),
        }
    })?;

    let elements = match value {
        Value::Array(elements) => elements,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(TranslationError::UnsupportedShape {
                found: json_kind(&other),
                raw: raw.to_string(),
            });
        }
    };

    let stages = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::Object(map) => Ok(Stage::new(map)),
            other => Err(TranslationError::InvalidStage {
                index,
                found: json_kind(&other),
                raw: raw.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Pipeline::try_from(stages).map_err(|_| TranslationError::EmptyPipeline {
        raw: raw.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
