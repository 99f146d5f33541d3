//! # Seatgate
//!
//! The boundary between raw sockets and a room-based multiplayer server.
//!
//! Clients reserve a seat over HTTP (the matchmake routes), then open a
//! WebSocket whose URL names the room and the seat. Seatgate checks the
//! reservation, hands the client to the room, and redelivers its messages
//! and close event. The rooms and the matchmaking algorithm are yours:
//! implement [`Room`], [`RoomDirectory`] and [`MatchmakeController`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seatgate::prelude::*;
//!
//! // Implement Room and MatchmakeController, then:
//! // let server = SeatgateServer::builder()
//! //     .ws_addr("0.0.0.0:2567")
//! //     .rooms(Arc::new(rooms))
//! //     .matchmaker(Arc::new(controller))
//! //     .build()
//! //     .await?;
//! // server.run().await
//! ```

mod config;
mod error;
mod onboard;
mod server;
mod shutdown;

pub use config::ServerConfig;
pub use error::SeatgateError;
pub use onboard::{ConnectionOnboarder, JoinRequest};
pub use server::{SeatgateServer, SeatgateServerBuilder};
pub use shutdown::ShutdownHandle;

pub use seatgate_matchmake::{MatchmakeController, MatchmakeDispatcher};
pub use seatgate_room::{Room, RoomDirectory, RoomRegistry};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this
/// more than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything needed to write rooms and a matchmaker and run a server.
pub mod prelude {
    pub use std::sync::Arc;

    pub use seatgate_matchmake::MatchmakeController;
    pub use seatgate_protocol::{ErrorCode, RoomListing, ServerError, ServerMessage};
    pub use seatgate_room::{Room, RoomDirectory, RoomRegistry};
    pub use seatgate_session::{Client, ClientState, SeatReservations};
    pub use seatgate_transport::{ClientEvent, ConnectionInfo, close_code};

    pub use crate::{
        SeatgateError, SeatgateServer, SeatgateServerBuilder, ServerConfig, ShutdownHandle,
        init_tracing,
    };
}
