use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("invalid socket url: {0}")]
    InvalidUrl(String),

    #[error("no auth token available")]
    MissingToken,

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("socket is not connected")]
    NotConnected,

    #[error("connection task has stopped")]
    ChannelClosed,
}
