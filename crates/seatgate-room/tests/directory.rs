//! Integration tests for the room registry using a mock room.

use std::sync::Arc;

use async_trait::async_trait;
use seatgate_protocol::{ErrorCode, ServerError};
use seatgate_room::{Room, RoomDirectory, RoomError, RoomRegistry};
use seatgate_session::{Client, ClientState};
use seatgate_transport::{
    ClientWrapper, ConnectionId, ConnectionInfo, Outbox, Outgoing,
};
use tokio::sync::mpsc::UnboundedReceiver;

// =========================================================================
// Mock room: admits one fixed session, refuses everyone else.
// =========================================================================

struct FixedSeatRoom {
    id: String,
}

impl FixedSeatRoom {
    fn new(id: &str) -> Arc<dyn Room> {
        Arc::new(Self { id: id.to_string() })
    }
}

#[async_trait]
impl Room for FixedSeatRoom {
    fn room_id(&self) -> &str {
        &self.id
    }

    fn has_reserved_seat(&self, session_id: &str, reconnection_token: &str) -> bool {
        session_id == "abc" && reconnection_token.is_empty()
    }

    async fn on_join(
        &self,
        client: Client,
        _connection: ConnectionInfo,
    ) -> Result<(), ServerError> {
        if client.session_id() == "banned" {
            return Err(ServerError::new(ErrorCode::AUTH_FAILED, "banned"));
        }
        client
            .confirm_join("tok")
            .map_err(|e| ServerError::with_status(500, None, e.to_string()))
    }
}

fn client(session_id: &str) -> (Client, UnboundedReceiver<Outgoing>) {
    let id = ConnectionId::new(7);
    let (outbox, rx) = Outbox::channel(id);
    (Client::new(session_id, ClientWrapper::new(id, Arc::new(outbox))), rx)
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn test_insert_then_get_room_by_id_returns_room() {
    let rooms = RoomRegistry::new();
    rooms.insert(FixedSeatRoom::new("r1")).unwrap();

    let room = rooms.get_room_by_id("r1").expect("registered room");

    assert_eq!(room.room_id(), "r1");
    assert_eq!(rooms.len(), 1);
}

#[test]
fn test_get_room_by_id_unknown_returns_none() {
    let rooms = RoomRegistry::new();

    assert!(rooms.get_room_by_id("nope").is_none());
    assert!(rooms.is_empty());
}

#[test]
fn test_insert_duplicate_id_is_rejected() {
    let rooms = RoomRegistry::new();
    rooms.insert(FixedSeatRoom::new("r1")).unwrap();

    let result = rooms.insert(FixedSeatRoom::new("r1"));

    assert!(matches!(result, Err(RoomError::AlreadyRegistered(id)) if id == "r1"));
    assert_eq!(rooms.len(), 1);
}

#[test]
fn test_remove_unregisters_room() {
    let rooms = RoomRegistry::new();
    rooms.insert(FixedSeatRoom::new("r1")).unwrap();

    let removed = rooms.remove("r1").unwrap();

    assert_eq!(removed.room_id(), "r1");
    assert!(rooms.get_room_by_id("r1").is_none());
    assert!(matches!(rooms.remove("r1"), Err(RoomError::NotFound(_))));
}

#[test]
fn test_room_ids_lists_every_room() {
    let rooms = RoomRegistry::new();
    rooms.insert(FixedSeatRoom::new("a")).unwrap();
    rooms.insert(FixedSeatRoom::new("b")).unwrap();

    let mut ids = rooms.room_ids();
    ids.sort();

    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_arc_directory_delegates_lookup() {
    let rooms = Arc::new(RoomRegistry::new());
    rooms.insert(FixedSeatRoom::new("r1")).unwrap();
    let directory: Arc<dyn RoomDirectory> = Arc::new(Arc::clone(&rooms));

    assert!(directory.get_room_by_id("r1").is_some());
}

#[tokio::test]
async fn test_on_join_through_directory_admits_reserved_session() {
    let rooms = RoomRegistry::new();
    rooms.insert(FixedSeatRoom::new("r1")).unwrap();
    let room = rooms.get_room_by_id("r1").unwrap();
    let (joining, mut rx) = client("abc");

    assert!(room.has_reserved_seat("abc", ""));
    let info = ConnectionInfo::new(joining.id(), "/r1?sessionId=abc");
    room.on_join(joining.clone(), info).await.unwrap();

    assert_eq!(joining.state(), ClientState::Joined);
    assert!(matches!(rx.try_recv(), Ok(Outgoing::Data(_))));
}

#[tokio::test]
async fn test_on_join_error_carries_code() {
    let room = FixedSeatRoom::new("r1");
    let (joining, _rx) = client("banned");

    let info = ConnectionInfo::new(joining.id(), "/r1?sessionId=banned");
    let err = room.on_join(joining, info).await.unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::AUTH_FAILED));
    assert_eq!(err.message(), "banned");
}
