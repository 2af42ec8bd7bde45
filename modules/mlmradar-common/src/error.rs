use thiserror::Error;

#[derive(Debug, Error)]
pub enum MlmRadarError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Failed to fetch {0} data: retry budget exhausted")]
    FetchExhausted(&'static str),

    #[error("Post data is missing the owner id needed for the profile fetch")]
    MissingIdentifier,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
