//! Client identity and seat reservations for Seatgate.
//!
//! This crate sits between the raw connection and the room:
//!
//! 1. **Seat reservations** ([`SeatReservations`]): which session ids
//!    may join a room, with which reconnection token, until when
//! 2. **Client identity** ([`Client`]): a session id coupled with the
//!    connection's [`ClientWrapper`](seatgate_transport::ClientWrapper),
//!    tracking where the client is in the join handshake
//!
//! ```text
//! Room Layer (above)  ← checks reservations, receives Clients on join
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Transport / Protocol (below)  ← wrappers, frames, ServerError
//! ```

mod client;
mod error;
mod reservation;

pub use client::{Client, ClientState};
pub use error::SessionError;
pub use reservation::{Seat, SeatReservations};
