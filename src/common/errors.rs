//! Error types for the application

use thiserror::Error;

/// Result type alias using our TraderError
pub type Result<T> = std::result::Result<T, TraderError>;

/// Main error type for trader operations
#[derive(Error, Debug)]
pub enum TraderError {
    /// WebSocket connection errors
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    /// WebSocket send/receive errors
    #[error("WebSocket communication error: {0}")]
    WebSocketCommunication(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Reserve attribute parsing errors
    #[error("Reserve parsing error: {0}")]
    ReserveParse(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Quote simulation errors
    #[error("Quote simulation error: {0}")]
    Simulation(String),

    /// Swap execution errors
    #[error("Swap execution error: {0}")]
    Execution(String),

    /// Zone-state persistence errors
    #[error("State persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Channel send errors
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for TraderError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TraderError::WebSocketCommunication(err.to_string())
    }
}
