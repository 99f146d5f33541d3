#[cfg(feature = "websocket")]
use tokio_tungstenite::tungstenite;

/// Errors raised while moving bytes to and from a socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The peer never completed the WebSocket upgrade.
    #[cfg(feature = "websocket")]
    #[error("handshake failed: {0}")]
    Handshake(#[source] tungstenite::Error),

    /// The connection is closed or closing.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// The socket rejected a frame.
    #[cfg(feature = "websocket")]
    #[error("send failed: {0}")]
    Send(#[source] tungstenite::Error),

    /// Reading from the socket failed.
    #[cfg(feature = "websocket")]
    #[error("receive failed: {0}")]
    Receive(#[source] tungstenite::Error),
}
