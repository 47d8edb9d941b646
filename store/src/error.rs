use thiserror::Error;

/// Errors surfaced by any storage backend.
///
/// Backend-specific errors convert into [`StoreError::Backend`]; the access
/// engine treats every variant as a transient failure of the call that hit it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// An index entry points at a record that does not exist.
    #[error("audit log is corrupted: {0}")]
    Corruption(String),
}
