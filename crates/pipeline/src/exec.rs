use std::fmt::Debug;

use async_trait::async_trait;
use bson::Document;

use crate::errors::ExecutionError;
use crate::stage::Pipeline;

/// Runs validated pipelines against the store.
#[async_trait]
pub trait PipelineExecutor: Debug + Sync + Send {
    /// Whether the store handle is usable.
    ///
    /// Checked before a request spends a model call.
    fn is_connected(&self) -> bool {
        true
    }

    /// Run the pipeline and buffer every result document.
    ///
    /// Documents are returned exactly as the store produced them.
    async fn execute(&self, pipeline: &Pipeline) -> Result<Vec<Document>, ExecutionError>;
}
