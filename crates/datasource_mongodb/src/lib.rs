//! MongoDB as the store for model generated pipelines.
pub mod errors;

mod exec;

pub use exec::MongoPipelineExecutor;

use errors::{MongoError, Result};
use mongodb::Client;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use tracing::{debug, info};

pub const DEFAULT_DATABASE: &str = "trade";
pub const DEFAULT_COLLECTION: &str = "trades";

#[derive(Debug, Clone)]
pub struct MongoAccessor {
    client: Client,
}

impl MongoAccessor {
    /// Create a client for the connection string.
    ///
    /// The driver connects lazily, use `ping` to verify the server is
    /// actually reachable.
    pub async fn connect(connection_string: &str) -> Result<MongoAccessor> {
        if connection_string.trim().is_empty() {
            return Err(MongoError::MissingConnectionString);
        }

        let mut opts = ClientOptions::parse(connection_string).await?;
        opts.app_name = Some("tradesrv".to_string());
        let client = Client::with_options(opts)?;

        Ok(MongoAccessor { client })
    }

    /// Round trip to the server.
    pub async fn ping(&self) -> Result<()> {
        debug!("pinging mongodb");
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(MongoError::Ping)?;
        info!("mongodb connected");
        Ok(())
    }

    pub fn into_executor(self, info: MongoCollectionInfo) -> MongoPipelineExecutor {
        let collection = self
            .client
            .database(&info.database)
            .collection(&info.collection);
        MongoPipelineExecutor::new(info, collection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoCollectionInfo {
    pub database: String,
    pub collection: String,
}

impl Default for MongoCollectionInfo {
    fn default() -> Self {
        MongoCollectionInfo {
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}
