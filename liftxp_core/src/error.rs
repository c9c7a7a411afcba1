//! Error types for the liftxp_core library.

use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftxp_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout form input rejected before touching any store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The trainee has no avatar to accrue XP on
    #[error("No avatar found for user '{user_id}' - select an avatar first")]
    NoAvatar { user_id: String },

    /// The trainee already picked an avatar
    #[error("User '{user_id}' already has an avatar")]
    AvatarExists { user_id: String },

    /// Referenced workout log does not exist
    #[error("Workout log {0} not found")]
    LogNotFound(Uuid),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
