//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`SeatgateServer`](crate::SeatgateServer).
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds (default `127.0.0.1:2567`).
    pub ws_addr: String,
    /// Address the matchmake HTTP listener binds (default `127.0.0.1:2568`).
    pub http_addr: String,
    /// Delay every outbound frame by this many milliseconds. Development
    /// only; `None` disables it.
    pub simulate_latency_ms: Option<u64>,
    /// How long to wait, in milliseconds, for a client to acknowledge a
    /// server-side close before dropping the socket.
    pub close_timeout_ms: u64,
    /// How long, in milliseconds, a new socket gets to complete its
    /// WebSocket upgrade before it is dropped.
    pub handshake_timeout_ms: u64,
}

impl ServerConfig {
    /// The simulated latency, if enabled.
    pub fn simulate_latency(&self) -> Option<Duration> {
        self.simulate_latency_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// The close acknowledgement timeout.
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// The upgrade deadline for new sockets.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: "127.0.0.1:2567".into(),
            http_addr: "127.0.0.1:2568".into(),
            simulate_latency_ms: None,
            close_timeout_ms: 5_000,
            handshake_timeout_ms: 10_000,
        }
    }
}
