//! Codec trait and the JSON implementation used by the hosted backend.
//!
//! The server and its tests only ever talk to a [`Codec`]; swapping the
//! JSON form for a binary one touches nothing above this module.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns wire values into bytes and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` for malformed or mistyped input.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use impostor_protocol::{ClientMessage, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = Envelope::new(1, 50, ClientMessage::Heartbeat { client_time: 50 });
/// let bytes = codec.encode(&frame).unwrap();
/// let back: Envelope<ClientMessage> = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, back);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
