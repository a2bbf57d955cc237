//! Room code generation.

use impostor_protocol::{ProtocolError, RoomCode};
use rand::Rng;

/// Draws a random room code.
///
/// 36^6 (about 2.2 billion) codes make a collision between the few
/// active rooms unlikely; the coordinator still retries when the store
/// reports one.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> Result<RoomCode, ProtocolError> {
    let code: String = (0..RoomCode::LEN)
        .map(|_| {
            let i = rng.random_range(0..RoomCode::ALPHABET.len());
            char::from(RoomCode::ALPHABET[i])
        })
        .collect();
    RoomCode::parse(&code)
}
