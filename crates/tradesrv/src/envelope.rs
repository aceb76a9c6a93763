//! Response shaping for successful queries.
use bson::{Bson, Document};
use pipeline::Pipeline;
use serde::Serialize;
use serde_json::Value;

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct Envelope {
    /// The question exactly as received.
    pub query: String,
    /// The pipeline that was executed.
    pub pipeline: Pipeline,
    /// Result documents, empty when nothing matched.
    pub results: Vec<Value>,
}

impl Envelope {
    pub fn new(query: String, pipeline: Pipeline, results: Vec<Document>) -> Self {
        Envelope {
            query,
            pipeline,
            results: results.into_iter().map(document_to_json).collect(),
        }
    }
}

pub fn document_to_json(doc: Document) -> Value {
    bson_to_json(Bson::Document(doc))
}

/// Render bson as json for the front end.
///
/// Object ids become their hex string, everything else follows relaxed
/// extended json.
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(k, v)| (k, bson_to_json(v)))
                .collect(),
        ),
        Bson::Array(values) => Value::Array(values.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
