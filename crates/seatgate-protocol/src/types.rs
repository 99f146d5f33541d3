//! Core protocol types for Seatgate's wire format.
//!
//! Everything here is serialized: [`ServerMessage`] frames go out over the
//! socket, [`RoomListing`] and [`ErrorBody`] go out as HTTP JSON bodies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ServerError;

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// A numeric error code sent to clients.
///
/// A newtype over `u16` so codes can't be mixed up with HTTP statuses or
/// close codes by accident. `#[serde(transparent)]` keeps it a plain number
/// on the wire: `ErrorCode(4214)` serializes as `4214`.
///
/// The associated constants are the matchmaking codes clients already know
/// how to interpret. Any other number is allowed; a room may raise its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    /// No handler is registered for the requested room name.
    pub const MATCHMAKE_NO_HANDLER: Self = Self(4210);
    /// Matchmaking criteria were rejected.
    pub const MATCHMAKE_INVALID_CRITERIA: Self = Self(4211);
    /// The requested room id does not exist.
    pub const MATCHMAKE_INVALID_ROOM_ID: Self = Self(4212);
    /// Matchmaking failed for an unclassified reason.
    pub const MATCHMAKE_UNHANDLED: Self = Self(4213);
    /// The seat reservation is missing or has expired.
    pub const MATCHMAKE_EXPIRED: Self = Self(4214);
    /// Authentication was rejected.
    pub const AUTH_FAILED: Self = Self(4215);
    /// A room's own code raised an error.
    pub const APPLICATION_ERROR: Self = Self(4216);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ServerMessage: socket frames sent by the framework
// ---------------------------------------------------------------------------

/// Frames the framework sends over a client's socket.
///
/// Internally tagged, so an error frame looks like:
///
/// ```json
/// { "type": "Error", "code": 4214, "message": "seat reservation expired." }
/// ```
///
/// Room implementations send their own game data as raw bytes; these are
/// only the frames the onboarding and session layers produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Server → Client: "You're in." Carries the token the client needs
    /// to reconnect to the same seat later.
    JoinRoom {
        #[serde(rename = "reconnectionToken")]
        reconnection_token: String,
    },

    /// Server → Client: "Something went wrong." Usually followed by the
    /// server closing the socket.
    Error { code: ErrorCode, message: String },
}

// ---------------------------------------------------------------------------
// HTTP bodies
// ---------------------------------------------------------------------------

/// A room summary returned by the matchmake `GET` route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListing {
    /// The room's unique id (what clients put in the socket URL).
    pub room_id: String,
    /// The registered room name (what clients match against).
    pub name: String,
    /// Number of connected clients.
    pub clients: usize,
    /// Maximum clients allowed, if the room has a limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clients: Option<usize>,
    /// Locked rooms accept no new reservations.
    #[serde(default)]
    pub locked: bool,
    /// Room-defined metadata, passed through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// JSON body of every failed matchmake response.
///
/// `code` is omitted when the error carries none, so a parse failure
/// serializes as `{"error":"invalid JSON input"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub error: String,
}

impl From<&ServerError> for ErrorBody {
    fn from(err: &ServerError) -> Self {
        Self {
            code: err.code(),
            error: err.message(),
        }
    }
}
