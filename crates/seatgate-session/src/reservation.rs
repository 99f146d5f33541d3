//! Seat reservations: who may join a room, and until when.
//!
//! Matchmaking reserves a seat over HTTP; the client then opens a socket
//! and presents its session id and reconnection token. A room answers
//! "is this pair reserved here?" from a [`SeatReservations`] table.
//!
//! # Concurrency note
//!
//! `SeatReservations` is a plain `HashMap` with `&mut self` mutators. A
//! room owns one and puts it behind whatever lock it already uses for
//! its own state.
//!
//! ## Lifecycle
//!
//! ```text
//! reserve() ──→ [Reserved] ──(client joins)──→ consume() ──→ gone
//!                   │
//!                   └──(ttl elapses)──→ expire_stale() ──→ gone
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::SessionError;

/// One reserved seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    /// Session id the seat belongs to.
    pub session_id: String,
    /// Token the client must present when it connects.
    pub reconnection_token: String,
    /// `true` if this seat was re-reserved for a dropped client.
    pub is_reconnection: bool,
    /// When the reservation stops being honored.
    pub expires_at: Instant,
}

impl Seat {
    /// Returns `true` once the reservation's ttl has elapsed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Reserved seats of one room, keyed by session id.
#[derive(Debug)]
pub struct SeatReservations {
    seats: HashMap<String, Seat>,
    ttl: Duration,
}

impl SeatReservations {
    /// Creates an empty table whose reservations live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            seats: HashMap::new(),
            ttl,
        }
    }

    /// Reserves a seat for a new session and generates its token.
    ///
    /// An expired reservation for the same session id is replaced.
    ///
    /// # Errors
    /// [`SessionError::AlreadyReserved`] if a live reservation exists.
    pub fn reserve(
        &mut self,
        session_id: impl Into<String>,
    ) -> Result<&Seat, SessionError> {
        self.insert(session_id.into(), generate_token(), false)
    }

    /// Reserves a seat for a dropped client, reusing its existing token.
    ///
    /// # Errors
    /// [`SessionError::AlreadyReserved`] if a live reservation exists.
    pub fn reserve_reconnection(
        &mut self,
        session_id: impl Into<String>,
        reconnection_token: impl Into<String>,
    ) -> Result<&Seat, SessionError> {
        self.insert(session_id.into(), reconnection_token.into(), true)
    }

    fn insert(
        &mut self,
        session_id: String,
        reconnection_token: String,
        is_reconnection: bool,
    ) -> Result<&Seat, SessionError> {
        let seat = Seat {
            session_id: session_id.clone(),
            reconnection_token,
            is_reconnection,
            expires_at: Instant::now() + self.ttl,
        };

        match self.seats.entry(session_id) {
            Entry::Occupied(mut slot) => {
                if !slot.get().is_expired() {
                    return Err(SessionError::AlreadyReserved(slot.key().clone()));
                }
                tracing::debug!(session_id = %slot.key(), is_reconnection, "seat re-reserved");
                slot.insert(seat);
                Ok(slot.into_mut())
            }
            Entry::Vacant(slot) => {
                tracing::debug!(session_id = %slot.key(), is_reconnection, "seat reserved");
                Ok(slot.insert(seat))
            }
        }
    }

    /// Returns `true` if a live seat is reserved for exactly this
    /// session id and token.
    pub fn has_reserved_seat(
        &self,
        session_id: &str,
        reconnection_token: &str,
    ) -> bool {
        self.seats.get(session_id).is_some_and(|seat| {
            !seat.is_expired() && seat.reconnection_token == reconnection_token
        })
    }

    /// Takes the seat when its client joins.
    ///
    /// # Errors
    /// - [`SessionError::SeatNotFound`]: nothing reserved for the session
    /// - [`SessionError::InvalidToken`]: token doesn't match (seat kept)
    /// - [`SessionError::SeatExpired`]: ttl elapsed (seat dropped)
    pub fn consume(
        &mut self,
        session_id: &str,
        reconnection_token: &str,
    ) -> Result<Seat, SessionError> {
        let seat = self
            .seats
            .get(session_id)
            .ok_or_else(|| SessionError::SeatNotFound(session_id.to_string()))?;

        if seat.reconnection_token != reconnection_token {
            return Err(SessionError::InvalidToken);
        }
        if seat.is_expired() {
            self.seats.remove(session_id);
            return Err(SessionError::SeatExpired(session_id.to_string()));
        }

        self.seats
            .remove(session_id)
            .ok_or_else(|| SessionError::SeatNotFound(session_id.to_string()))
    }

    /// Drops a reservation without it being used.
    pub fn cancel(&mut self, session_id: &str) -> Option<Seat> {
        self.seats.remove(session_id)
    }

    /// Removes every reservation whose ttl has elapsed and returns their
    /// session ids.
    pub fn expire_stale(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        self.seats.retain(|session_id, seat| {
            if seat.is_expired() {
                expired.push(session_id.clone());
                false
            } else {
                true
            }
        });
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired seat reservations");
        }
        expired
    }

    /// Looks up the seat reserved for a session.
    pub fn get(&self, session_id: &str) -> Option<&Seat> {
        self.seats.get(session_id)
    }

    /// Number of reservations (live or not yet swept).
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Returns `true` if there are no reservations.
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
