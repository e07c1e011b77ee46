use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("secret resolution error: {0}")]
    Secret(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("too many requests: {0}")]
    TooManyRequests(String),

    #[error("translation quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("DeepL API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, TranslatorError>;
