//! Error types for the taskcal sync core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the remote calendar provider.
///
/// The sync engines branch on `CursorExpired` and `AuthRevoked`; every other
/// variant is treated as transient and retried on the next scheduled cycle.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The incremental sync cursor is no longer valid; a full resync is needed.
    #[error("incremental sync cursor expired")]
    CursorExpired,

    /// The user revoked access (or the refresh credential is otherwise dead).
    #[error("authorization revoked by the remote provider")]
    AuthRevoked,

    /// No usable credentials were available for the call.
    #[error("no credentials available for remote calendar calls")]
    NotConnected,

    #[error("calendar API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

/// Errors from the on-disk user store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt store document at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize store document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("could not determine the platform {0} directory")]
    MissingDir(&'static str),
}

/// Top-level error for sync engine operations.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("unknown user: {0}")]
    UserNotFound(String),

    #[error("user is not connected to the remote calendar")]
    NotConnected,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;
