//! Error types for the session layer.

use seatgate_protocol::ProtocolError;
use seatgate_transport::TransportError;

/// Errors that can occur while managing clients and seat reservations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The client's connection is closed or its writer is gone.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No seat is reserved for this session id.
    #[error("no seat reserved for session {0}")]
    SeatNotFound(String),

    /// The reconnection token doesn't match the reserved seat.
    #[error("invalid reconnection token")]
    InvalidToken,

    /// The reservation's time-to-live has elapsed.
    #[error("seat reservation for session {0} expired")]
    SeatExpired(String),

    /// A live reservation already exists for this session id.
    #[error("session {0} already has a reserved seat")]
    AlreadyReserved(String),
}
