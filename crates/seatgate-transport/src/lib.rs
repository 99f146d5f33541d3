//! Transport layer for Seatgate.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! socket implementations, plus the pieces that sit directly on top of a
//! raw connection:
//!
//! - [`ClientWrapper`]: the capability object (`send`, `close`, events)
//!   the room layer talks to instead of the socket itself
//! - [`ConnectionRegistry`]: keyed store of every live connection's wrapper
//! - [`RawSend`], [`Outbox`], [`Latency`]: the outbound half of a
//!   connection and a delaying decorator for latency simulation
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod registry;
mod sink;
#[cfg(feature = "websocket")]
mod websocket;
mod wrapper;

pub use error::TransportError;
pub use registry::ConnectionRegistry;
pub use sink::{Latency, Outbox, Outgoing, RawSend};
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};
pub use wrapper::{ClientEvent, ClientWrapper};

use std::fmt;
use std::net::SocketAddr;

/// WebSocket close codes used by the framework.
pub mod close_code {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;
    /// The peer went away without a close frame.
    pub const ABNORMAL: u16 = 1006;
    /// A close frame arrived without a status code.
    pub const NO_STATUS: u16 = 1005;
    /// The client asked to leave.
    pub const CONSENTED: u16 = 4000;
    /// The server closed the socket after sending an error frame.
    pub const WITH_ERROR: u16 = 4002;
}

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Metadata captured when a connection is accepted.
///
/// This is what the room layer sees of the raw socket: who it is, where
/// it came from, and the request URL it was upgraded on. The URL is the
/// path plus query string exactly as the client sent it
/// (e.g. `/proc/room42?sessionId=abc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Unique identity of the connection.
    pub id: ConnectionId,
    /// Request URL (path and query) of the upgrade request.
    pub url: String,
    /// Peer address, when the transport knows it.
    pub remote_addr: Option<SocketAddr>,
}

impl ConnectionInfo {
    /// Creates connection metadata without a peer address.
    pub fn new(id: ConnectionId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            remote_addr: None,
        }
    }
}

/// An inbound event read from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A data frame (binary, or text as UTF-8 bytes).
    Data(Vec<u8>),
    /// The connection ended. Carries the close code.
    Closed(u16),
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// A socket that still has to complete its protocol handshake.
    type Pending: Upgrade<Connection = Self::Connection, Error = Self::Error>;
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next socket.
    ///
    /// Only the accept itself happens here. The handshake is left to
    /// [`Upgrade::upgrade`], so callers can run it on the connection's own
    /// task and a silent peer never holds up the accept loop.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;
}

/// An accepted socket whose handshake hasn't run yet.
pub trait Upgrade: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// The peer's address.
    fn remote_addr(&self) -> SocketAddr;

    /// Runs the handshake. Waits as long as the peer does, so callers
    /// should bound it with a timeout.
    async fn upgrade(self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive bytes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next event from the remote peer.
    ///
    /// Returns `Ok(Incoming::Closed(code))` once the connection has ended;
    /// callers should stop reading after that.
    async fn recv(&self) -> Result<Incoming, Self::Error>;

    /// Closes the connection with the given close code and reason.
    async fn close(&self, code: u16, reason: &str) -> Result<(), Self::Error>;

    /// Returns the metadata captured at accept time.
    fn info(&self) -> &ConnectionInfo;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId {
        self.info().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }

    #[test]
    fn test_connection_info_new_has_no_peer_addr() {
        let info = ConnectionInfo::new(ConnectionId::new(3), "/p/r?sessionId=a");
        assert_eq!(info.id, ConnectionId::new(3));
        assert_eq!(info.url, "/p/r?sessionId=a");
        assert!(info.remote_addr.is_none());
    }
}
