//! Room interfaces for Seatgate.
//!
//! Seatgate doesn't simulate rooms. It needs exactly two things from
//! whatever does:
//!
//! - [`RoomDirectory`]: find a live room by id
//! - [`Room`]: answer "is this seat reserved?" and accept a joining
//!   [`Client`](seatgate_session::Client)
//!
//! [`RoomRegistry`] is a ready-made in-memory directory for servers that
//! keep their rooms in-process.

mod error;
mod registry;

pub use error::RoomError;
pub use registry::RoomRegistry;

use std::sync::Arc;

use async_trait::async_trait;
use seatgate_protocol::ServerError;
use seatgate_session::Client;
use seatgate_transport::ConnectionInfo;

/// A live room that clients join over a socket.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use seatgate_protocol::ServerError;
/// use seatgate_room::Room;
/// use seatgate_session::Client;
/// use seatgate_transport::ConnectionInfo;
///
/// /// Lets exactly one session in, with a fixed token.
/// struct Lobby;
///
/// #[async_trait]
/// impl Room for Lobby {
///     fn room_id(&self) -> &str {
///         "lobby"
///     }
///
///     fn has_reserved_seat(&self, session_id: &str, token: &str) -> bool {
///         session_id == "abc" && token == "tok1"
///     }
///
///     async fn on_join(
///         &self,
///         client: Client,
///         _connection: ConnectionInfo,
///     ) -> Result<(), ServerError> {
///         client
///             .confirm_join("tok1")
///             .map_err(|e| ServerError::with_status(500, None, e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Room: Send + Sync + 'static {
    /// The room's unique id, as used in socket URLs.
    fn room_id(&self) -> &str;

    /// Returns `true` if a non-expired seat is reserved for this session id
    /// and reconnection token.
    fn has_reserved_seat(&self, session_id: &str, reconnection_token: &str) -> bool;

    /// Admits a client whose reservation has been checked.
    ///
    /// `connection` is the metadata of the raw socket (peer address,
    /// request URL). Returning an error makes the onboarder send it to
    /// the client and close the socket.
    async fn on_join(
        &self,
        client: Client,
        connection: ConnectionInfo,
    ) -> Result<(), ServerError>;
}

/// Looks up live rooms by id.
pub trait RoomDirectory: Send + Sync + 'static {
    /// Returns the room with this id, if it exists.
    fn get_room_by_id(&self, room_id: &str) -> Option<Arc<dyn Room>>;
}

impl<D: RoomDirectory + ?Sized> RoomDirectory for Arc<D> {
    fn get_room_by_id(&self, room_id: &str) -> Option<Arc<dyn Room>> {
        (**self).get_room_by_id(room_id)
    }
}
