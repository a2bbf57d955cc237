//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating
/// protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or an
    /// unknown `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A room code that is not six ASCII letters or digits.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),
}
