//! HTTP entry point for seat discovery and reservation.
//!
//! Before a client opens its socket it talks to the matchmaker over HTTP:
//! it lists rooms (`GET`), reserves a seat (`POST`), and its browser may
//! preflight either (`OPTIONS`). This crate routes those requests to a
//! [`MatchmakeController`] and gives every response the same CORS headers
//! and error shape.
//!
//! ```text
//! OPTIONS /matchmake/*              → 200, CORS only
//! GET     /matchmake/[roomName]     → 200, [RoomListing, ...]
//! POST    /matchmake/<method>/<roomName>
//!                                   → 200, controller result
//! failure                           → status, {"code": .., "error": ..}
//! ```
//!
//! The dispatcher is framework-agnostic ([`MatchmakeDispatcher::handle`]
//! takes a plain [`MatchmakeRequest`]); [`router`] mounts it on axum.

mod controller;
pub mod cors;
mod dispatch;
mod route;
mod router;

pub use controller::{
    ALLOWED_ROOM_NAME_CHARS, DEFAULT_MATCHMAKE_ROUTE, MatchmakeController,
};
pub use dispatch::{MatchmakeDispatcher, MatchmakeRequest, MatchmakeResponse};
pub use route::{Invocation, parse_list_filter};
pub use router::router;
