//! Unified error type for Impostor Protocol.

use impostor_protocol::ProtocolError;
use impostor_room::GameError;
use impostor_session::SessionError;
use impostor_store::StoreError;
use impostor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ImpostorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad handshake).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The Session Store failed outside an intent.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An intent was rejected.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The local identity could not be read or written.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An environment variable held an unusable value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: ImpostorError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, ImpostorError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ImpostorError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, ImpostorError::Protocol(_)));
    }

    #[test]
    fn test_from_game_error_keeps_message() {
        let err: ImpostorError = GameError::RoomNotFound("ZZZ999".into()).into();
        assert!(matches!(err, ImpostorError::Game(_)));
        assert_eq!(err.to_string(), "room ZZZ999 not found");
    }

    #[test]
    fn test_from_store_error() {
        let err: ImpostorError = StoreError::Unavailable("offline".into()).into();
        assert!(matches!(err, ImpostorError::Store(_)));
    }
}
