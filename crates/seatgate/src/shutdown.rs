//! Shutdown signalling via `CancellationToken`.

use tokio_util::sync::CancellationToken;

/// Stops a running [`SeatgateServer`](crate::SeatgateServer).
///
/// Cheap to clone. Obtain one with
/// [`SeatgateServer::shutdown_handle`](crate::SeatgateServer::shutdown_handle)
/// before calling `run`.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Creates a handle that hasn't been triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initiates shutdown: stop accepting, close live connections.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been initiated.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
