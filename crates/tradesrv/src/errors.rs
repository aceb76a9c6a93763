use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use datasource_mongodb::errors::MongoError;
use llm::errors::LlmError;
use pipeline::errors::{ExecutionError, SecurityRejection, TranslationError};
use serde::Serialize;

pub type ServerResult<T, E = ServerError> = std::result::Result<T, E>;

/// Message shown to clients for anything that went wrong on the model side.
///
/// Rejected pipelines use the same message, the distinction only shows up in
/// the logs.
pub const TRANSLATION_FAILED_MESSAGE: &str = "AI failed to generate a valid query. See server logs.";

/// Errors that end a single request.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Query parameter is required")]
    MissingQuery,

    #[error("Database not connected")]
    StoreUnavailable,

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Rejected(#[from] SecurityRejection),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingQuery => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable
            | Self::Translation(_)
            | Self::Rejected(_)
            | Self::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text returned in the `error` field of the response body.
    pub fn client_message(&self) -> String {
        match self {
            Self::MissingQuery | Self::StoreUnavailable => self.to_string(),
            Self::Translation(_) | Self::Rejected(_) => TRANSLATION_FAILED_MESSAGE.to_string(),
            Self::Execution(e) => format!("An error occurred: {e}"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MONGO_ATLAS_URI not set, pass --mongo-uri or set the environment variable")]
    MissingMongoUri,

    #[error("OPENAI_API_KEY must be set when using the openai backend")]
    MissingApiKey,

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Failed to configure completion backend: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to connect to store: {0}")]
    Store(#[from] MongoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(StatusCode::BAD_REQUEST, ServerError::MissingQuery.status());
        assert_eq!(
            StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::StoreUnavailable.status()
        );
        assert_eq!(
            StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Execution(ExecutionError::Timeout(Duration::from_secs(1))).status()
        );
    }

    #[test]
    fn rejection_looks_like_translation_failure() {
        let rejected = ServerError::Rejected(SecurityRejection::DeniedOperator {
            operator: "$where".to_string(),
        });
        let translation = ServerError::Translation(TranslationError::EmptyPipeline {
            raw: "[]".to_string(),
        });
        assert_eq!(translation.client_message(), rejected.client_message());
        assert_eq!(translation.status(), rejected.status());
    }

    #[test]
    fn execution_message_includes_store_error() {
        let err = ServerError::Execution(ExecutionError::Store(
            "Unrecognized pipeline stage name: '$bogus'".into(),
        ));
        assert_eq!(
            "An error occurred: Unrecognized pipeline stage name: '$bogus'",
            err.client_message()
        );
    }
}
