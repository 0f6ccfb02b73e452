//! Error types.

/// Result type for reset-hotkey operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the write interface or by snapshot decoding.
///
/// Nothing in the core propagates these to the host page. Absence of an
/// element is not an error; locators return `Option`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("host rejected action: {0}")]
    Host(String),

    #[error("snapshot decode error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("invalid retry schedule: {0}")]
    InvalidSchedule(String),
}
