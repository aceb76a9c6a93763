use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use datasource_mongodb::{DEFAULT_COLLECTION, DEFAULT_DATABASE, MongoCollectionInfo};
use logutil::LogFormat;
use pipeline::ValidatorConfig;
use tracing::Level;

use crate::config::{DEFAULT_BIND, DEFAULT_CORS_ORIGIN, LlmBackendKind, LlmConfig, ServerConfig};

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum LoggingMode {
    #[default]
    Human,
    Json,
}

impl From<LoggingMode> for LogFormat {
    fn from(mode: LoggingMode) -> Self {
        match mode {
            LoggingMode::Human => LogFormat::HumanReadable,
            LoggingMode::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "tradesrv")]
#[clap(version)]
#[clap(about = "Answer trade questions with MongoDB aggregations", long_about = None)]
pub struct Cli {
    /// Address to serve http on.
    #[arg(long, env = "TRADESRV_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// MongoDB connection string.
    #[arg(long, env = "MONGO_ATLAS_URI", hide_env_values = true)]
    pub mongo_uri: Option<String>,

    #[arg(long, env = "TRADESRV_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    #[arg(long, env = "TRADESRV_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Which completion api generates pipelines.
    #[arg(long, env = "TRADESRV_LLM_BACKEND", value_enum, default_value_t)]
    pub llm_backend: LlmBackendKind,

    /// Base url of the completion api. Defaults depend on the backend.
    #[arg(long, env = "TRADESRV_LLM_URL")]
    pub llm_url: Option<String>,

    /// Model name. Defaults depend on the backend.
    #[arg(long, env = "TRADESRV_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Give up on the completion api after this many seconds.
    #[arg(long, env = "TRADESRV_LLM_TIMEOUT_SECS")]
    pub llm_timeout_secs: Option<u64>,

    /// Give up on an aggregation after this many seconds.
    #[arg(long, env = "TRADESRV_STORE_TIMEOUT_SECS")]
    pub store_timeout_secs: Option<u64>,

    /// Additional operator to reject anywhere in a pipeline. May be repeated.
    #[arg(long = "deny-operator")]
    pub deny_operators: Vec<String>,

    #[arg(long, env = "TRADESRV_CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origin: String,

    #[arg(long, value_enum, default_value_t)]
    pub log_format: LoggingMode,

    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Cli {
    pub fn into_config(self) -> ServerConfig {
        let validator = self
            .deny_operators
            .into_iter()
            .fold(ValidatorConfig::default(), |conf, op| conf.with_denied_operator(op));

        ServerConfig {
            bind: self.bind,
            mongo_uri: self.mongo_uri,
            collection: MongoCollectionInfo {
                database: self.database,
                collection: self.collection,
            },
            llm: LlmConfig {
                kind: self.llm_backend,
                url: self.llm_url,
                model: self.model,
                api_key: self.openai_api_key,
                timeout: self.llm_timeout_secs.map(Duration::from_secs),
            },
            store_timeout: self.store_timeout_secs.map(Duration::from_secs),
            validator,
            cors_origin: self.cors_origin,
        }
    }
}
