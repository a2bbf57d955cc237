//! Error types for the session layer.

/// Errors from the local identity port.
///
/// Recovery itself never returns these to the caller: a failure to read
/// or check the remembered identity turns into a fresh session. They
/// surface only from direct [`IdentityStore`](crate::IdentityStore)
/// calls such as saving the identity after a join.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backing file could not be read or written.
    #[error("identity storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored identity is not valid JSON for [`LocalState`](crate::LocalState).
    #[error("stored identity is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
