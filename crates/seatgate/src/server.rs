//! `SeatgateServer` builder and server loop.
//!
//! This is the entry point for running a Seatgate server. It ties the
//! layers together: the WebSocket accept loop feeds the
//! [`ConnectionOnboarder`], and the matchmake router is served over HTTP
//! alongside it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use seatgate_matchmake::{MatchmakeController, MatchmakeDispatcher};
use seatgate_room::RoomDirectory;
use seatgate_transport::{
    Connection, ConnectionRegistry, Incoming, Latency, Outbox, Outgoing, PendingWebSocket,
    RawSend, Transport, Upgrade, WebSocketConnection, WebSocketTransport, close_code,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::{ConnectionOnboarder, SeatgateError, ServerConfig, ShutdownHandle};

/// Builder for configuring and starting a Seatgate server.
///
/// # Example
///
/// ```rust,ignore
/// use seatgate::prelude::*;
///
/// let server = SeatgateServer::builder()
///     .ws_addr("0.0.0.0:2567")
///     .http_addr("0.0.0.0:2568")
///     .rooms(rooms)
///     .matchmaker(controller)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct SeatgateServerBuilder {
    config: ServerConfig,
    rooms: Option<Arc<dyn RoomDirectory>>,
    matchmaker: Option<Arc<dyn MatchmakeController>>,
    shutdown: ShutdownHandle,
}

impl SeatgateServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            rooms: None,
            matchmaker: None,
            shutdown: ShutdownHandle::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address the WebSocket listener binds.
    pub fn ws_addr(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets the address the matchmake HTTP listener binds.
    pub fn http_addr(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self
    }

    /// Delays every outbound frame by `delay`. Development only.
    pub fn simulate_latency(mut self, delay: Duration) -> Self {
        self.config.simulate_latency_ms = Some(millis(delay));
        self
    }

    /// Sets how long to wait for clients to acknowledge a server close.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config.close_timeout_ms = millis(timeout);
        self
    }

    /// Sets how long a new socket gets to complete its WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout_ms = millis(timeout);
        self
    }

    /// Sets the directory rooms are looked up in. Required.
    pub fn rooms(mut self, rooms: Arc<dyn RoomDirectory>) -> Self {
        self.rooms = Some(rooms);
        self
    }

    /// Sets the matchmake controller. Without one, no HTTP listener is
    /// started.
    pub fn matchmaker(mut self, controller: Arc<dyn MatchmakeController>) -> Self {
        self.matchmaker = Some(controller);
        self
    }

    /// Uses an existing shutdown handle, e.g. one a matchmake controller
    /// already watches.
    pub fn shutdown_handle(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Binds the listeners and returns a server ready to [`run`](SeatgateServer::run).
    ///
    /// # Errors
    /// - [`SeatgateError::Config`] if no room directory was set
    /// - [`SeatgateError::Transport`] / [`SeatgateError::Io`] if a
    ///   listener can't bind
    pub async fn build(self) -> Result<SeatgateServer, SeatgateError> {
        let rooms = self
            .rooms
            .ok_or_else(|| SeatgateError::Config("no room directory set".into()))?;

        let transport = WebSocketTransport::bind(&self.config.ws_addr).await?;

        let http = match self.matchmaker {
            Some(controller) => {
                let listener = TcpListener::bind(&self.config.http_addr).await?;
                tracing::info!(addr = %self.config.http_addr, "matchmake HTTP listening");
                let dispatcher = Arc::new(MatchmakeDispatcher::new(controller));
                Some(HttpListener {
                    listener,
                    router: seatgate_matchmake::router(dispatcher),
                })
            }
            None => None,
        };

        Ok(SeatgateServer {
            config: self.config,
            transport,
            http,
            onboarder: ConnectionOnboarder::new(rooms, ConnectionRegistry::new()),
            shutdown: self.shutdown,
        })
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for SeatgateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct HttpListener {
    listener: TcpListener,
    router: Router,
}

/// A bound Seatgate server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SeatgateServer {
    config: ServerConfig,
    transport: WebSocketTransport,
    http: Option<HttpListener>,
    onboarder: ConnectionOnboarder,
    shutdown: ShutdownHandle,
}

impl SeatgateServer {
    /// Creates a new builder.
    pub fn builder() -> SeatgateServerBuilder {
        SeatgateServerBuilder::new()
    }

    /// The configuration the server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the address the WebSocket listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the address the matchmake HTTP listener is bound to, if
    /// one was started.
    pub fn http_local_addr(&self) -> Option<SocketAddr> {
        self.http
            .as_ref()
            .and_then(|http| http.listener.local_addr().ok())
    }

    /// The registry of live connections.
    pub fn registry(&self) -> &ConnectionRegistry {
        self.onboarder.registry()
    }

    /// A handle that stops the server once `run` is underway.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Runs the accept loop and the HTTP listener until shutdown.
    ///
    /// Every accepted connection is served on its own task. A failure on
    /// one connection never stops the loop.
    pub async fn run(self) -> Result<(), SeatgateError> {
        let Self {
            config,
            mut transport,
            http,
            onboarder,
            shutdown,
        } = self;

        let ctx = Arc::new(ConnectionContext {
            onboarder,
            latency: config.simulate_latency(),
            close_timeout: config.close_timeout(),
            handshake_timeout: config.handshake_timeout(),
            shutdown: shutdown.clone(),
        });

        let http_task = http.map(|HttpListener { listener, router }| {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move { shutdown.cancelled().await })
                    .await
            })
        });

        tracing::info!(ws_addr = %config.ws_addr, "Seatgate server running");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = transport.accept() => match accepted {
                    Ok(pending) => {
                        tokio::spawn(serve_connection(pending, Arc::clone(&ctx)));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        // Closes the listener; new sockets are refused from here on.
        drop(transport);
        if let Some(task) = http_task {
            match task.await {
                Ok(result) => result?,
                Err(e) => tracing::warn!(error = %e, "HTTP server task failed"),
            }
        }
        tracing::info!("Seatgate server stopped");
        Ok(())
    }
}

/// What every connection task shares.
struct ConnectionContext {
    onboarder: ConnectionOnboarder,
    latency: Option<Duration>,
    close_timeout: Duration,
    handshake_timeout: Duration,
    shutdown: ShutdownHandle,
}

/// Serves one connection from its upgrade to close.
async fn serve_connection(pending: PendingWebSocket, ctx: Arc<ConnectionContext>) {
    let addr = pending.remote_addr();
    let conn = match tokio::time::timeout(ctx.handshake_timeout, pending.upgrade()).await {
        Ok(Ok(conn)) => Arc::new(conn),
        Ok(Err(e)) => {
            tracing::debug!(%addr, error = %e, "WebSocket upgrade failed");
            return;
        }
        Err(_) => {
            tracing::debug!(%addr, "WebSocket upgrade timed out");
            return;
        }
    };
    let info = conn.info().clone();
    let conn_id = info.id;

    let (outbox, outgoing) = Outbox::channel(conn_id);
    let sink: Arc<dyn RawSend> = match ctx.latency {
        Some(delay) => Arc::new(Latency::new(Arc::new(outbox), delay)),
        None => Arc::new(outbox),
    };
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), outgoing));

    let code = match ctx.onboarder.on_connection(info, sink).await {
        Ok(_) => read_loop(&conn, &ctx).await,
        // The rejection close is already queued.
        Err(_) => drain_until_closed(&conn, ctx.close_timeout).await,
    };

    ctx.onboarder.on_close(conn_id, code);
    writer.abort();
}

/// Drains queued frames onto the socket until a close is sent.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) {
    while let Some(out) = outgoing.recv().await {
        let (result, done) = match out {
            Outgoing::Data(data) => (conn.send(&data).await, false),
            Outgoing::Close { code, reason } => (conn.close(code, &reason).await, true),
        };
        if let Err(e) = result {
            tracing::debug!(conn_id = %conn.id(), error = %e, "write failed");
            return;
        }
        if done {
            return;
        }
    }
}

/// Redelivers inbound frames until the connection closes. Returns the
/// close code.
async fn read_loop(conn: &WebSocketConnection, ctx: &ConnectionContext) -> u16 {
    let conn_id = conn.id();
    loop {
        let incoming = tokio::select! {
            incoming = conn.recv() => incoming,
            _ = ctx.shutdown.cancelled() => {
                if let Some(wrapper) = ctx.onboarder.registry().get(&conn_id) {
                    if let Err(e) = wrapper.close(close_code::NORMAL, "server shutting down") {
                        tracing::debug!(%conn_id, error = %e, "close on shutdown failed");
                    }
                }
                return drain_until_closed(conn, ctx.close_timeout).await;
            }
        };

        match incoming {
            Ok(Incoming::Data(data)) => ctx.onboarder.on_message(conn_id, data),
            Ok(Incoming::Closed(code)) => return code,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "receive failed");
                return close_code::ABNORMAL;
            }
        }
    }
}

/// Discards inbound frames until the peer closes or `timeout` elapses.
async fn drain_until_closed(conn: &WebSocketConnection, timeout: Duration) -> u16 {
    let drain = async {
        loop {
            match conn.recv().await {
                Ok(Incoming::Data(_)) => continue,
                Ok(Incoming::Closed(code)) => return code,
                Err(_) => return close_code::ABNORMAL,
            }
        }
    };
    tokio::time::timeout(timeout, drain)
        .await
        .unwrap_or(close_code::ABNORMAL)
}
