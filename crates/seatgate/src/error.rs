//! Unified error type for Seatgate.

use seatgate_protocol::{ProtocolError, ServerError};
use seatgate_room::RoomError;
use seatgate_session::SessionError;
use seatgate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `seatgate` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
#[derive(Debug, thiserror::Error)]
pub enum SeatgateError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (reservation, send through a client).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-directory error (duplicate or unknown room).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A client-visible error that escaped to the caller.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Binding or serving the HTTP listener failed.
    #[error("http server: {0}")]
    Io(#[from] std::io::Error),

    /// The server was built without a required part.
    #[error("invalid server configuration: {0}")]
    Config(String),
}
