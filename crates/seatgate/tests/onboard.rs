//! Integration tests for the connection onboarder over in-memory outboxes.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use seatgate::ConnectionOnboarder;
use seatgate::prelude::*;
use seatgate_transport::{ConnectionId, ConnectionRegistry, Outbox, Outgoing};
use tokio::sync::mpsc::UnboundedReceiver;

// =========================================================================
// Mock room: a reservation table plus a record of joins.
// =========================================================================

struct MockRoom {
    id: String,
    seats: Mutex<SeatReservations>,
    joined: Mutex<Vec<String>>,
    fail_with: Option<ServerError>,
}

impl MockRoom {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            seats: Mutex::new(SeatReservations::new(Duration::from_secs(60))),
            joined: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    fn failing(id: &str, err: ServerError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::new(id)
        }
    }

    fn reserve(&self, session_id: &str, token: &str) {
        self.seats
            .lock()
            .unwrap()
            .reserve_reconnection(session_id, token)
            .unwrap();
    }
}

#[async_trait]
impl Room for MockRoom {
    fn room_id(&self) -> &str {
        &self.id
    }

    fn has_reserved_seat(&self, session_id: &str, reconnection_token: &str) -> bool {
        self.seats
            .lock()
            .unwrap()
            .has_reserved_seat(session_id, reconnection_token)
    }

    async fn on_join(
        &self,
        client: Client,
        _connection: ConnectionInfo,
    ) -> Result<(), ServerError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.joined
            .lock()
            .unwrap()
            .push(client.session_id().to_string());
        client
            .confirm_join("tok1")
            .map_err(|e| ServerError::with_status(500, None, e.to_string()))
    }
}

// =========================================================================
// Helpers
// =========================================================================

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct Harness {
    onboarder: ConnectionOnboarder,
    room: Arc<MockRoom>,
}

impl Harness {
    fn new(room: MockRoom) -> Self {
        let room = Arc::new(room);
        let rooms = Arc::new(RoomRegistry::new());
        rooms.insert(room.clone()).unwrap();
        Self {
            onboarder: ConnectionOnboarder::new(rooms, ConnectionRegistry::new()),
            room,
        }
    }

    fn registry(&self) -> &ConnectionRegistry {
        self.onboarder.registry()
    }

    async fn connect(
        &self,
        url: &str,
    ) -> (
        ConnectionId,
        Result<Client, ServerError>,
        UnboundedReceiver<Outgoing>,
    ) {
        let id = ConnectionId::new(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        let (outbox, rx) = Outbox::channel(id);
        let result = self
            .onboarder
            .on_connection(ConnectionInfo::new(id, url), Arc::new(outbox))
            .await;
        (id, result, rx)
    }
}

fn json(out: Outgoing) -> serde_json::Value {
    match out {
        Outgoing::Data(bytes) => serde_json::from_slice(&bytes).expect("json frame"),
        other => panic!("expected data frame, got {other:?}"),
    }
}

// =========================================================================
// Onboarding
// =========================================================================

#[tokio::test]
async fn test_on_connection_valid_reservation_joins_and_stays_open() {
    let h = Harness::new(MockRoom::new("xyz"));
    h.room.reserve("abc", "tok1");

    let (id, result, mut rx) = h
        .connect("/room/xyz?sessionId=abc&reconnectionToken=tok1")
        .await;

    let client = result.expect("joined");
    assert_eq!(client.state(), ClientState::Joined);
    assert_eq!(*h.room.joined.lock().unwrap(), vec!["abc".to_string()]);
    assert_eq!(json(rx.try_recv().unwrap())["type"], "JoinRoom");
    assert!(rx.try_recv().is_err(), "no close after a successful join");
    assert!(h.registry().contains(&id));
}

#[tokio::test]
async fn test_on_connection_wrong_token_sends_error_then_closes() {
    let h = Harness::new(MockRoom::new("xyz"));
    h.room.reserve("abc", "tok1");

    let (id, result, mut rx) = h
        .connect("/room/xyz?sessionId=abc&reconnectionToken=wrong")
        .await;

    assert_eq!(result.unwrap_err(), ServerError::ReservationExpired);
    let frame = json(rx.try_recv().unwrap());
    assert_eq!(frame["type"], "Error");
    assert_eq!(frame["code"], 4214);
    assert_eq!(frame["message"], "seat reservation expired.");
    assert!(matches!(
        rx.try_recv().unwrap(),
        Outgoing::Close { code: close_code::WITH_ERROR, .. }
    ));
    assert!(h.room.joined.lock().unwrap().is_empty());

    // Entry stays until the socket's close event arrives.
    assert!(h.registry().contains(&id));
    h.onboarder.on_close(id, close_code::WITH_ERROR);
    assert!(!h.registry().contains(&id));
}

#[tokio::test]
async fn test_on_connection_unknown_room_is_seat_expired() {
    let h = Harness::new(MockRoom::new("xyz"));
    h.room.reserve("abc", "tok1");

    let (_, result, mut rx) = h
        .connect("/room/nope?sessionId=abc&reconnectionToken=tok1")
        .await;

    assert_eq!(result.unwrap_err(), ServerError::ReservationExpired);
    assert_eq!(json(rx.try_recv().unwrap())["code"], 4214);
}

#[tokio::test]
async fn test_on_connection_path_without_room_is_seat_expired() {
    let h = Harness::new(MockRoom::new("xyz"));

    let (_, result, _rx) = h.connect("/xyz?sessionId=abc").await;

    assert_eq!(result.unwrap_err(), ServerError::ReservationExpired);
}

#[tokio::test]
async fn test_on_connection_missing_token_matches_empty_reservation() {
    let h = Harness::new(MockRoom::new("xyz"));
    h.room.reserve("abc", "");

    let (_, result, _rx) = h.connect("/room/xyz?sessionId=abc").await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_on_connection_join_error_reports_its_code() {
    let h = Harness::new(MockRoom::failing(
        "xyz",
        ServerError::new(ErrorCode::AUTH_FAILED, "not allowed"),
    ));
    h.room.reserve("abc", "tok1");

    let (_, result, mut rx) = h
        .connect("/room/xyz?sessionId=abc&reconnectionToken=tok1")
        .await;

    assert!(result.is_err());
    let frame = json(rx.try_recv().unwrap());
    assert_eq!(frame["code"], 4215);
    assert_eq!(frame["message"], "not allowed");
    assert_eq!(
        rx.try_recv().unwrap(),
        Outgoing::Close {
            code: close_code::WITH_ERROR,
            reason: "not allowed".into(),
        }
    );
}

#[tokio::test]
async fn test_on_connection_join_error_without_code_uses_application_error() {
    let h = Harness::new(MockRoom::failing(
        "xyz",
        ServerError::with_status(500, None, "room crashed"),
    ));
    h.room.reserve("abc", "tok1");

    let (_, _, mut rx) = h
        .connect("/room/xyz?sessionId=abc&reconnectionToken=tok1")
        .await;

    assert_eq!(json(rx.try_recv().unwrap())["code"], 4216);
}

#[tokio::test]
async fn test_on_connection_rejected_wrapper_emits_nothing() {
    let h = Harness::new(MockRoom::new("xyz"));

    let (id, result, _rx) = h.connect("/room/xyz?sessionId=abc").await;
    assert!(result.is_err());
    let wrapper = h.registry().get(&id).unwrap();
    let mut events = wrapper.subscribe();

    h.onboarder.on_message(id, b"late".to_vec());
    h.onboarder.on_close(id, close_code::WITH_ERROR);

    assert!(wrapper.is_closed());
    assert!(events.try_recv().is_err());
}

// =========================================================================
// Redelivery and registry lifecycle
// =========================================================================

#[tokio::test]
async fn test_on_message_reaches_subscriber() {
    let h = Harness::new(MockRoom::new("xyz"));
    h.room.reserve("abc", "tok1");
    let (id, result, _rx) = h
        .connect("/room/xyz?sessionId=abc&reconnectionToken=tok1")
        .await;
    let mut events = result.unwrap().events();

    h.onboarder.on_message(id, b"move".to_vec());

    assert_eq!(events.try_recv().unwrap(), ClientEvent::Message(b"move".to_vec()));
}

#[tokio::test]
async fn test_on_close_removes_entry_before_emitting_close_once() {
    let h = Harness::new(MockRoom::new("xyz"));
    h.room.reserve("abc", "tok1");
    let (id, result, _rx) = h
        .connect("/room/xyz?sessionId=abc&reconnectionToken=tok1")
        .await;
    let mut events = result.unwrap().events();

    h.onboarder.on_close(id, close_code::CONSENTED);
    h.onboarder.on_close(id, close_code::CONSENTED);

    assert_eq!(events.try_recv().unwrap(), ClientEvent::Close(close_code::CONSENTED));
    assert!(h.registry().get(&id).is_none());
    assert!(events.try_recv().is_err(), "close is delivered exactly once");
}

#[tokio::test]
async fn test_registry_tracks_each_open_connection_regardless_of_close_order() {
    let h = Harness::new(MockRoom::new("xyz"));
    for session in ["a", "b", "c"] {
        h.room.reserve(session, "");
    }

    let (a, _, _ra) = h.connect("/room/xyz?sessionId=a").await;
    let (b, _, _rb) = h.connect("/room/xyz?sessionId=b").await;
    let (c, _, _rc) = h.connect("/room/xyz?sessionId=c").await;
    assert_eq!(h.registry().len(), 3);

    h.onboarder.on_close(b, close_code::NORMAL);
    assert_eq!(h.registry().len(), 2);
    assert!(h.registry().contains(&a) && h.registry().contains(&c));

    h.onboarder.on_close(c, close_code::NORMAL);
    h.onboarder.on_close(a, close_code::NORMAL);
    assert!(h.registry().is_empty());
}

#[tokio::test]
async fn test_on_message_after_close_is_dropped() {
    let h = Harness::new(MockRoom::new("xyz"));
    h.room.reserve("abc", "");
    let (id, result, _rx) = h.connect("/room/xyz?sessionId=abc").await;
    let mut events = result.unwrap().events();

    h.onboarder.on_close(id, close_code::NORMAL);
    h.onboarder.on_message(id, b"ghost".to_vec());

    assert_eq!(events.try_recv().unwrap(), ClientEvent::Close(close_code::NORMAL));
    assert!(events.try_recv().is_err());
}
