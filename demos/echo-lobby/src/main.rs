use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use seatgate::prelude::*;
use serde_json::{Value, json};

const LOBBY_ID: &str = "lobby";
const LOBBY_NAME: &str = "echo";

// ---------------------------------------------------------------------------
// Lobby state
// ---------------------------------------------------------------------------

/// Everyone in the lobby plus the seats reserved for people on their way.
struct LobbyState {
    seats: Mutex<SeatReservations>,
    members: Mutex<HashMap<String, Client>>,
    max_clients: usize,
}

impl LobbyState {
    fn new(max_clients: usize, seat_ttl: Duration) -> Self {
        Self {
            seats: Mutex::new(SeatReservations::new(seat_ttl)),
            members: Mutex::new(HashMap::new()),
            max_clients,
        }
    }

    /// Members plus pending reservations.
    fn occupancy(&self) -> usize {
        self.members.lock().len() + self.seats.lock().len()
    }

    fn is_full(&self) -> bool {
        self.occupancy() >= self.max_clients
    }

    /// Members still joining get the frame once their join is confirmed.
    fn broadcast(&self, data: &[u8]) {
        for (session_id, client) in self.members.lock().iter() {
            if let Err(e) = client.enqueue_raw(data.to_vec()) {
                tracing::debug!(%session_id, error = %e, "relay failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

struct Lobby {
    state: Arc<LobbyState>,
}

#[async_trait]
impl Room for Lobby {
    fn room_id(&self) -> &str {
        LOBBY_ID
    }

    fn has_reserved_seat(&self, session_id: &str, reconnection_token: &str) -> bool {
        self.state
            .seats
            .lock()
            .has_reserved_seat(session_id, reconnection_token)
    }

    async fn on_join(
        &self,
        client: Client,
        _connection: ConnectionInfo,
    ) -> Result<(), ServerError> {
        let seat = self
            .state
            .seats
            .lock()
            .cancel(client.session_id())
            .ok_or(ServerError::ReservationExpired)?;
        let events = client.events();
        self.state
            .members
            .lock()
            .insert(seat.session_id.clone(), client.clone());
        tokio::spawn(relay(
            Arc::clone(&self.state),
            seat.session_id.clone(),
            events,
        ));

        client
            .confirm_join(&seat.reconnection_token)
            .map_err(|e| ServerError::new(ErrorCode::APPLICATION_ERROR, e.to_string()))?;
        if seat.is_reconnection {
            client.mark_reconnected();
        }
        Ok(())
    }
}

/// Relays one member's messages to the whole lobby until they leave.
async fn relay(
    state: Arc<LobbyState>,
    session_id: String,
    mut events: tokio::sync::mpsc::UnboundedReceiver<ClientEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::Message(data) => state.broadcast(&data),
            ClientEvent::Close(code) => {
                tracing::info!(%session_id, code, "member left");
                break;
            }
        }
    }
    state.members.lock().remove(&session_id);
}

// ---------------------------------------------------------------------------
// Matchmaker
// ---------------------------------------------------------------------------

struct LobbyMatchmaker {
    lobby: Arc<LobbyState>,
    next_session: AtomicU64,
    shutdown: ShutdownHandle,
}

impl LobbyMatchmaker {
    fn reserve(&self) -> Result<Value, ServerError> {
        if self.lobby.is_full() {
            return Err(ServerError::with_status(
                409,
                Some(ErrorCode::MATCHMAKE_INVALID_CRITERIA),
                "lobby is full",
            ));
        }
        let session_id = format!("{:08x}", self.next_session.fetch_add(1, Ordering::Relaxed));
        let mut seats = self.lobby.seats.lock();
        let seat = seats
            .reserve(session_id)
            .map_err(|e| ServerError::new(ErrorCode::MATCHMAKE_UNHANDLED, e.to_string()))?;

        Ok(json!({
            "sessionId": seat.session_id,
            "reconnectionToken": seat.reconnection_token,
            "room": { "roomId": LOBBY_ID, "name": LOBBY_NAME },
        }))
    }
}

#[async_trait]
impl MatchmakeController for LobbyMatchmaker {
    async fn get_available_rooms(
        &self,
        room_name: &str,
    ) -> Result<Vec<RoomListing>, ServerError> {
        if !room_name.is_empty() && room_name != LOBBY_NAME {
            return Ok(Vec::new());
        }
        Ok(vec![RoomListing {
            room_id: LOBBY_ID.into(),
            name: LOBBY_NAME.into(),
            clients: self.lobby.members.lock().len(),
            max_clients: Some(self.lobby.max_clients),
            locked: self.lobby.is_full(),
            metadata: Value::Null,
        }])
    }

    async fn invoke_method(
        &self,
        method: &str,
        room_name: &str,
        _payload: Value,
    ) -> Result<Value, ServerError> {
        match (method, room_name) {
            ("joinOrCreate" | "join", LOBBY_NAME) => self.reserve(),
            ("joinById", LOBBY_ID) => self.reserve(),
            _ => Err(ServerError::new(
                ErrorCode::MATCHMAKE_NO_HANDLER,
                format!("no handler for \"{method}\" on \"{room_name}\""),
            )),
        }
    }

    fn is_gracefully_shutting_down(&self) -> bool {
        self.shutdown.is_shutting_down()
    }
}

/// Drops reservations nobody showed up for.
async fn sweep_seats(lobby: Arc<LobbyState>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        lobby.seats.lock().expire_stale();
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config: ServerConfig = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => ServerConfig::default(),
    };

    let lobby = Arc::new(LobbyState::new(16, Duration::from_secs(15)));
    let rooms = Arc::new(RoomRegistry::new());
    rooms.insert(Arc::new(Lobby {
        state: Arc::clone(&lobby),
    }))?;

    let shutdown = ShutdownHandle::new();
    let matchmaker = Arc::new(LobbyMatchmaker {
        lobby: Arc::clone(&lobby),
        next_session: AtomicU64::new(1),
        shutdown: shutdown.clone(),
    });

    let server = SeatgateServer::builder()
        .config(config)
        .rooms(rooms)
        .matchmaker(matchmaker)
        .shutdown_handle(shutdown.clone())
        .build()
        .await?;

    tokio::spawn(sweep_seats(Arc::clone(&lobby), Duration::from_secs(5)));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, shutting down");
            shutdown.shutdown();
        }
    });

    tracing::info!(
        ws = %server.local_addr()?,
        http = ?server.http_local_addr(),
        "echo lobby ready"
    );
    server.run().await?;
    Ok(())
}
