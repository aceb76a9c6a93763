use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{backend} responded with {status}: {body}")]
    UnexpectedStatus {
        backend: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{backend} response could not be decoded: {source}, body: {body}")]
    InvalidResponse {
        backend: &'static str,
        source: serde_json::Error,
        body: String,
    },

    #[error("{0} response did not contain any message content")]
    MissingContent(&'static str),

    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

pub type Result<T, E = LlmError> = std::result::Result<T, E>;
