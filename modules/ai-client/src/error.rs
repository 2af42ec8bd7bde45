use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiClientError>;

#[derive(Debug, Error)]
pub enum AiClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Rate limited by model endpoint: {0}")]
    RateLimited(String),

    #[error("Model endpoint error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No response content from model")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiClientError {
    fn from(err: reqwest::Error) -> Self {
        AiClientError::Connection(err.to_string())
    }
}
