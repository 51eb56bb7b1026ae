//! Error types for the game runtime
//!
//! The core components never fail; only the outer surfaces (configuration,
//! replay scripts, channels, terminal I/O) return these.

use thiserror::Error;

/// Result type alias for fallible game operations
pub type GameResult<T> = Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Replay script error: {0}")]
    Script(String),

    #[error("Invalid input line: {0}")]
    Input(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl<T> From<flume::SendError<T>> for GameError {
    fn from(_: flume::SendError<T>) -> Self {
        GameError::ChannelClosed("send")
    }
}

/// Input dropped at the fusion boundary. Logged, never propagated.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    #[error("hand digit {0} outside 0..=5")]
    HandOutOfRange(u8),

    #[error("voice number {0} is not a hand total or a target")]
    UnknownNumber(u8),

    #[error("confidence {0:.2} below threshold")]
    LowConfidence(f32),
}
