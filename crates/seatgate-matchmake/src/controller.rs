//! The matchmaker as seen by the dispatcher.

use std::sync::LazyLock;

use async_trait::async_trait;
use axum::http::HeaderMap;
use regex::Regex;
use seatgate_protocol::{RoomListing, ServerError};
use serde_json::Value;

use crate::cors;

/// Path segment the matchmake routes live under.
pub const DEFAULT_MATCHMAKE_ROUTE: &str = "matchmake";

/// Characters allowed in room names, room ids, and matchmake methods.
pub static ALLOWED_ROOM_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+").expect("valid room name pattern"));

/// Seat allocation and room selection live behind this trait.
///
/// Only the two async actions are required. The rest have defaults that
/// match a standard deployment.
#[async_trait]
pub trait MatchmakeController: Send + Sync + 'static {
    /// The path segment the matchmake routes are mounted under.
    fn matchmake_route(&self) -> &str {
        DEFAULT_MATCHMAKE_ROUTE
    }

    /// Pattern a single path segment must match to count as a room name
    /// or method.
    fn allowed_room_name_chars(&self) -> &Regex {
        &ALLOWED_ROOM_NAME_CHARS
    }

    /// CORS headers attached to every response.
    fn default_cors_headers(&self) -> HeaderMap {
        cors::default_headers()
    }

    /// CORS headers computed from the request; these override the
    /// defaults.
    fn cors_headers(&self, request: &HeaderMap) -> HeaderMap {
        cors::origin_headers(request)
    }

    /// Lists rooms, optionally filtered by name (`""` means all).
    async fn get_available_rooms(
        &self,
        room_name: &str,
    ) -> Result<Vec<RoomListing>, ServerError>;

    /// Runs a matchmaking method such as `joinOrCreate` and returns its
    /// JSON result (usually a seat reservation).
    async fn invoke_method(
        &self,
        method: &str,
        room_name: &str,
        payload: Value,
    ) -> Result<Value, ServerError>;

    /// `true` while the server drains; new `POST`s are refused with 503.
    fn is_gracefully_shutting_down(&self) -> bool {
        false
    }
}
