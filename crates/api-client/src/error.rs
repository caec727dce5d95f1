use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to perform the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("WebSocket transport error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("The gateway returned an error: {0}")]
    Gateway(String),

    #[error("Failed to deserialize the gateway response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from the gateway: {0}")]
    InvalidData(String),
}
