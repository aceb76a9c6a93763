#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("Missing connection string")]
    MissingConnectionString,

    #[error("Failed to reach MongoDB: {0}")]
    Ping(mongodb::error::Error),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

pub type Result<T, E = MongoError> = std::result::Result<T, E>;
