use std::time::Duration;

use llm::errors::LlmError;

/// The model did not produce a usable pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("completion backend failed: {0}")]
    Backend(#[from] LlmError),

    #[error("model response is not valid json: {source}")]
    InvalidJson {
        source: serde_json::Error,
        raw: String,
    },

    #[error("model returned {found} where a pipeline was expected")]
    UnsupportedShape { found: &'static str, raw: String },

    #[error("model returned an empty pipeline")]
    EmptyPipeline { raw: String },

    #[error("stage {index} is {found}, expected an object")]
    InvalidStage {
        index: usize,
        found: &'static str,
        raw: String,
    },
}

impl TranslationError {
    /// Raw model output that failed to parse, if we got that far.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Backend(_) => None,
            Self::InvalidJson { raw, .. }
            | Self::UnsupportedShape { raw, .. }
            | Self::EmptyPipeline { raw }
            | Self::InvalidStage { raw, .. } => Some(raw),
        }
    }
}

/// The pipeline was well formed but violates the safety policy.
#[derive(Debug, thiserror::Error)]
pub enum SecurityRejection {
    #[error("pipeline contains denied operator '{operator}'")]
    DeniedOperator { operator: String },

    #[error("stage {index} is a denied stage '{stage}'")]
    DeniedStage { index: usize, stage: String },

    #[error("pipeline could not be serialized for inspection: {0}")]
    Unserializable(#[from] serde_json::Error),
}

/// The store failed to run a validated pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to convert pipeline to bson: {0}")]
    Conversion(#[from] bson::ser::Error),

    #[error("aggregation did not complete within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pipeline must contain at least one stage")]
pub struct EmptyPipelineError;
