//! Error types for Fanout

use thiserror::Error;

use crate::types::Platform;

pub type Result<T> = std::result::Result<T, FanoutError>;

/// Message recorded for platforms without a usable connected account
pub const ACCOUNT_NOT_CONNECTED: &str = "Account not connected";

#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl FanoutError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FanoutError::Validation(_) => 3,
            FanoutError::Config(_) => 2,
            FanoutError::Store(_) => 1,
            FanoutError::Publish(_) => 1,
            FanoutError::Output(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Reorder rejected: {0}")]
    ReorderRejected(String),
}

/// Failure of a single publish attempt on one platform
///
/// These never abort sibling platforms: the dispatcher folds them into a
/// failed `DispatchResult` using the display message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("{0} requires an image or video")]
    MissingMedia(Platform),

    #[error("{0}")]
    MissingIdentity(String),

    #[error("{platform} API rejected the request (HTTP {status}): {message}")]
    Rejected {
        platform: Platform,
        status: u16,
        message: String,
    },

    #[error("{platform} network error: {message}")]
    Network { platform: Platform, message: String },

    #[error("{platform} returned an unexpected response: {message}")]
    InvalidResponse { platform: Platform, message: String },

    #[error("{platform} did not respond within {secs}s")]
    Timeout { platform: Platform, secs: u64 },
}
