//! Encode/decode errors.

/// Errors that can occur while converting frames to or from bytes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong types.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
