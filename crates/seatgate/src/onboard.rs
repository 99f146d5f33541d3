//! Connection onboarding: from an accepted socket to a room participant.
//!
//! The socket URL says which room the client wants and which seat it
//! holds:
//!
//! ```text
//! ws://host/<process>/<roomId>?sessionId=<id>&reconnectionToken=<token>
//! ```
//!
//! The onboarder registers the connection, checks the seat with the room,
//! and either hands a [`Client`] to the room or reports the failure to the
//! client and closes the socket.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use seatgate_protocol::{ErrorCode, ServerError};
use seatgate_room::RoomDirectory;
use seatgate_session::Client;
use seatgate_transport::{
    ClientEvent, ClientWrapper, ConnectionId, ConnectionInfo, ConnectionRegistry, RawSend,
};
use url::Url;

/// Trailing `/<segment>/<roomId>` of a socket path.
static ROOM_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/[A-Za-z0-9_-]+/([A-Za-z0-9_-]+)$").expect("valid room path pattern")
});

/// Socket URLs are usually just path and query; resolve them against a
/// dummy origin so both forms parse.
static URL_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("ws://localhost/").expect("valid base url"));

/// Identifiers a client supplies in its socket URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinRequest {
    /// `sessionId` query parameter; empty if absent.
    pub session_id: String,
    /// Last path segment, if the path has the `/<segment>/<roomId>` shape.
    pub room_id: Option<String>,
    /// `reconnectionToken` query parameter; empty if absent.
    pub reconnection_token: String,
}

impl JoinRequest {
    /// Parses a socket URL. Never fails: anything missing comes back empty
    /// and is caught by the seat check.
    pub fn parse(raw: &str) -> Self {
        let Ok(url) = URL_BASE.join(raw) else {
            return Self::default();
        };

        let mut request = Self {
            room_id: ROOM_PATH
                .captures(url.path())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            ..Self::default()
        };
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "sessionId" => request.session_id = value.into_owned(),
                "reconnectionToken" => request.reconnection_token = value.into_owned(),
                _ => {}
            }
        }
        request
    }
}

/// Turns accepted connections into room participants.
///
/// Cheap to clone; clones share the room directory and the registry.
#[derive(Clone)]
pub struct ConnectionOnboarder {
    rooms: Arc<dyn RoomDirectory>,
    registry: ConnectionRegistry,
}

impl ConnectionOnboarder {
    pub fn new(rooms: Arc<dyn RoomDirectory>, registry: ConnectionRegistry) -> Self {
        Self { rooms, registry }
    }

    /// The registry of live connections.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Onboards a newly accepted connection.
    ///
    /// Call exactly once per connection, before feeding it any
    /// [`on_message`](Self::on_message) or [`on_close`](Self::on_close).
    /// Outbound frames for the connection go through `sink`.
    ///
    /// On failure the error has already been sent to the client and the
    /// connection asked to close; the returned error is informational.
    /// The registry entry stays until [`on_close`](Self::on_close).
    pub async fn on_connection(
        &self,
        info: ConnectionInfo,
        sink: Arc<dyn RawSend>,
    ) -> Result<Client, ServerError> {
        let wrapper = ClientWrapper::new(info.id, sink);
        self.registry.add(info.id, wrapper.clone());

        let request = JoinRequest::parse(&info.url);
        let client = Client::new(request.session_id.clone(), wrapper);
        let conn_id = info.id;

        match self.join(&request, client.clone(), info).await {
            Ok(()) => {
                tracing::info!(
                    %conn_id,
                    room_id = request.room_id.as_deref().unwrap_or_default(),
                    session_id = %request.session_id,
                    "client joined room"
                );
                Ok(client)
            }
            Err(err) => {
                tracing::warn!(
                    %conn_id,
                    room_id = request.room_id.as_deref().unwrap_or_default(),
                    session_id = %request.session_id,
                    error = %err,
                    "onboarding failed"
                );
                let code = err.code().unwrap_or(ErrorCode::APPLICATION_ERROR);
                if let Err(e) = client.reject(code, &err.message()) {
                    tracing::debug!(%conn_id, error = %e, "could not report onboarding failure");
                }
                Err(err)
            }
        }
    }

    async fn join(
        &self,
        request: &JoinRequest,
        client: Client,
        info: ConnectionInfo,
    ) -> Result<(), ServerError> {
        let room = request
            .room_id
            .as_deref()
            .and_then(|room_id| self.rooms.get_room_by_id(room_id))
            .filter(|room| {
                room.has_reserved_seat(&request.session_id, &request.reconnection_token)
            })
            .ok_or(ServerError::ReservationExpired)?;

        room.on_join(client, info).await
    }

    /// Redelivers a data frame to the connection's subscriber.
    pub fn on_message(&self, id: ConnectionId, data: Vec<u8>) {
        if let Some(wrapper) = self.registry.get(&id) {
            wrapper.emit(ClientEvent::Message(data));
        }
    }

    /// Handles the connection's terminal close.
    ///
    /// The registry entry is removed before `Close` is emitted, so a
    /// subscriber looking the connection up sees it gone. Repeated calls
    /// are no-ops.
    pub fn on_close(&self, id: ConnectionId, code: u16) {
        if let Some(wrapper) = self.registry.remove(&id) {
            tracing::debug!(conn_id = %id, code, "connection closed");
            wrapper.emit(ClientEvent::Close(code));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let request = JoinRequest::parse("/proc1/room42?sessionId=abc&reconnectionToken=tok1");

        assert_eq!(request.session_id, "abc");
        assert_eq!(request.room_id.as_deref(), Some("room42"));
        assert_eq!(request.reconnection_token, "tok1");
    }

    #[test]
    fn test_parse_missing_query_is_empty() {
        let request = JoinRequest::parse("/proc1/room42");

        assert_eq!(request.session_id, "");
        assert_eq!(request.reconnection_token, "");
        assert_eq!(request.room_id.as_deref(), Some("room42"));
    }

    #[test]
    fn test_parse_single_segment_has_no_room() {
        assert_eq!(JoinRequest::parse("/room42?sessionId=abc").room_id, None);
    }

    #[test]
    fn test_parse_disallowed_characters_has_no_room() {
        assert_eq!(JoinRequest::parse("/proc1/room.42").room_id, None);
    }

    #[test]
    fn test_parse_trailing_slash_has_no_room() {
        assert_eq!(JoinRequest::parse("/proc1/room42/").room_id, None);
    }

    #[test]
    fn test_parse_uses_last_two_segments() {
        let request = JoinRequest::parse("/a/b/proc1/xyz?sessionId=s");
        assert_eq!(request.room_id.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_absolute_url() {
        let request = JoinRequest::parse("ws://game.example:2567/p/xyz?sessionId=abc");

        assert_eq!(request.room_id.as_deref(), Some("xyz"));
        assert_eq!(request.session_id, "abc");
    }

    #[test]
    fn test_parse_decodes_query_values() {
        let request = JoinRequest::parse("/p/xyz?sessionId=a%20b&reconnectionToken=t%2B1");

        assert_eq!(request.session_id, "a b");
        assert_eq!(request.reconnection_token, "t+1");
    }
}
