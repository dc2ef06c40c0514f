use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to write payload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Submission dropped before completing")]
    Cancelled,
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}
