//! The error type shared by connection onboarding and matchmake dispatch.
//!
//! Every failure a client can observe is a [`ServerError`]. Each one has
//! the same four-part view: a [`kind`](ServerError::kind), an HTTP
//! [`status`](ServerError::status), an optional client-facing
//! [`code`](ServerError::code), and a [`message`](ServerError::message).

use crate::ErrorCode;

/// Status used when an error doesn't specify one.
const DEFAULT_STATUS: u16 = 500;

/// Broad classification of a [`ServerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No valid seat reservation for the connecting client.
    ReservationExpired,
    /// The HTTP request itself was malformed.
    RequestParse,
    /// The server is draining and refuses new matchmaking.
    ShuttingDown,
    /// Raised by a room or the matchmaker, passed through as-is.
    Collaborator,
}

/// A client-visible failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerError {
    /// The room doesn't exist or holds no seat for this session/token.
    /// Both cases are reported identically.
    #[error("seat reservation expired.")]
    ReservationExpired,

    /// The POST body was empty or not valid JSON.
    #[error("invalid JSON input")]
    InvalidJson,

    /// The HTTP method isn't one the matchmake route serves.
    #[error("invalid request method")]
    InvalidMethod,

    /// The path has no matchmake method segment.
    #[error("invalid matchmake route")]
    InvalidRoute,

    /// Graceful shutdown is in progress.
    #[error("server is shutting down")]
    ShuttingDown,

    /// Raised by a collaborator with its own status, code, and message.
    #[error("{message}")]
    Raised {
        status: Option<u16>,
        code: Option<ErrorCode>,
        message: String,
    },
}

impl ServerError {
    /// A collaborator error with a code and the default status.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Raised {
            status: None,
            code: Some(code),
            message: message.into(),
        }
    }

    /// A collaborator error with an explicit HTTP status.
    pub fn with_status(
        status: u16,
        code: Option<ErrorCode>,
        message: impl Into<String>,
    ) -> Self {
        Self::Raised {
            status: Some(status),
            code,
            message: message.into(),
        }
    }

    /// Returns the error's classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReservationExpired => ErrorKind::ReservationExpired,
            Self::InvalidJson | Self::InvalidMethod | Self::InvalidRoute => {
                ErrorKind::RequestParse
            }
            Self::ShuttingDown => ErrorKind::ShuttingDown,
            Self::Raised { .. } => ErrorKind::Collaborator,
        }
    }

    /// HTTP status for this error. Defaults to 500.
    pub fn status(&self) -> u16 {
        match self {
            Self::ShuttingDown => 503,
            Self::Raised {
                status: Some(status),
                ..
            } => *status,
            _ => DEFAULT_STATUS,
        }
    }

    /// Client-facing error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::ReservationExpired => Some(ErrorCode::MATCHMAKE_EXPIRED),
            Self::ShuttingDown => Some(ErrorCode(503)),
            Self::Raised { code, .. } => *code,
            Self::InvalidJson | Self::InvalidMethod | Self::InvalidRoute => None,
        }
    }

    /// Human-readable message sent to the client.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
