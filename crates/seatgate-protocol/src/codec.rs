//! Codec trait and the JSON implementation.
//!
//! A "codec" converts between Rust types and raw bytes. Frames produced by
//! the framework itself ([`ServerMessage`](crate::ServerMessage)) always go
//! through [`JsonCodec`]; room implementations can bring their own codec
//! for game data and still use the same trait.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so one codec value can be shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use seatgate_protocol::{Codec, ErrorCode, JsonCodec, ServerMessage};
///
/// let msg = ServerMessage::Error {
///     code: ErrorCode::MATCHMAKE_EXPIRED,
///     message: "seat reservation expired.".into(),
/// };
/// let bytes = JsonCodec.encode(&msg).unwrap();
/// let decoded: ServerMessage = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
