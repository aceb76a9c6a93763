use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::Document;
use pipeline::errors::ExecutionError;
use pipeline::{Pipeline, PipelineExecutor};
use tracing::{debug, error};

use crate::MongoCollectionInfo;

/// Runs pipelines with the native aggregation of a single collection.
#[derive(Debug, Clone)]
pub struct MongoPipelineExecutor {
    info: MongoCollectionInfo,
    collection: Collection<Document>,
    timeout: Option<Duration>,
}

impl MongoPipelineExecutor {
    pub(crate) fn new(info: MongoCollectionInfo, collection: Collection<Document>) -> Self {
        MongoPipelineExecutor {
            info,
            collection,
            timeout: None,
        }
    }

    /// Bound the time spent on a single aggregation, including server
    /// selection and draining the cursor.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn info(&self) -> &MongoCollectionInfo {
        &self.info
    }

    async fn aggregate(&self, stages: Vec<Document>) -> mongodb::error::Result<Vec<Document>> {
        let cursor = self.collection.aggregate(stages).await?;
        cursor.try_collect().await
    }
}

#[async_trait]
impl PipelineExecutor for MongoPipelineExecutor {
    async fn execute(&self, pipeline: &Pipeline) -> Result<Vec<Document>, ExecutionError> {
        let stages = pipeline.to_documents()?;
        debug!(
            database = %self.info.database,
            collection = %self.info.collection,
            stages = stages.len(),
            "running aggregation"
        );

        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.aggregate(stages)).await {
                Ok(result) => result,
                Err(_) => {
                    error!(?timeout, %pipeline, "aggregation timed out");
                    return Err(ExecutionError::Timeout(timeout));
                }
            },
            None => self.aggregate(stages).await,
        };

        match result {
            Ok(docs) => {
                debug!(count = docs.len(), "aggregation complete");
                Ok(docs)
            }
            Err(e) => {
                error!(error = %e, %pipeline, "aggregation failed");
                Err(ExecutionError::Store(Box::new(e)))
            }
        }
    }
}
