//! Method routing, CORS, and error mapping for matchmake requests.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use seatgate_protocol::{ErrorBody, ServerError};
use serde_json::Value;

use crate::{Invocation, MatchmakeController, cors, parse_list_filter};

/// An HTTP request reduced to what the dispatcher reads.
#[derive(Debug, Clone)]
pub struct MatchmakeRequest {
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl MatchmakeRequest {
    /// A request with no headers and an empty body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// The dispatcher's answer: status, headers, and an optional JSON body.
#[derive(Debug, Clone)]
pub struct MatchmakeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` for preflight responses.
    pub body: Option<Value>,
}

impl MatchmakeResponse {
    fn empty(headers: HeaderMap) -> Self {
        Self {
            status: StatusCode::OK,
            headers,
            body: None,
        }
    }

    fn ok(headers: HeaderMap, body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers,
            body: Some(body),
        }
    }

    fn error(headers: HeaderMap, err: &ServerError) -> Self {
        let status = StatusCode::from_u16(err.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_value(ErrorBody::from(err))
            .unwrap_or_else(|_| serde_json::json!({ "error": err.message() }));
        Self {
            status,
            headers,
            body: Some(body),
        }
    }
}

impl IntoResponse for MatchmakeResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, self.headers, Json(body)).into_response(),
            None => (self.status, self.headers).into_response(),
        }
    }
}

/// Routes matchmake requests by HTTP method to a [`MatchmakeController`].
///
/// `handle` never fails: every error becomes a JSON error response, and
/// every response carries CORS headers.
pub struct MatchmakeDispatcher {
    controller: Arc<dyn MatchmakeController>,
}

impl MatchmakeDispatcher {
    pub fn new(controller: Arc<dyn MatchmakeController>) -> Self {
        Self { controller }
    }

    /// The controller requests are dispatched to.
    pub fn controller(&self) -> &Arc<dyn MatchmakeController> {
        &self.controller
    }

    /// Handles one request.
    pub async fn handle(&self, request: MatchmakeRequest) -> MatchmakeResponse {
        let headers = cors::merge(
            self.controller.default_cors_headers(),
            self.controller.cors_headers(&request.headers),
        );

        let result = match request.method {
            Method::OPTIONS => return MatchmakeResponse::empty(headers),
            Method::GET => self.list_rooms(&request.path).await,
            Method::POST => self.invoke(&request).await,
            _ => Err(ServerError::InvalidMethod),
        };

        match result {
            Ok(body) => MatchmakeResponse::ok(headers, body),
            Err(err) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    status = err.status(),
                    error = %err,
                    "matchmake request failed"
                );
                MatchmakeResponse::error(headers, &err)
            }
        }
    }

    async fn list_rooms(&self, path: &str) -> Result<Value, ServerError> {
        let room_name = parse_list_filter(path, self.controller.allowed_room_name_chars());
        let rooms = self.controller.get_available_rooms(&room_name).await?;
        tracing::debug!(%room_name, count = rooms.len(), "listed rooms");
        serde_json::to_value(rooms)
            .map_err(|e| ServerError::with_status(500, None, e.to_string()))
    }

    async fn invoke(&self, request: &MatchmakeRequest) -> Result<Value, ServerError> {
        if self.controller.is_gracefully_shutting_down() {
            return Err(ServerError::ShuttingDown);
        }

        let payload: Value =
            serde_json::from_slice(&request.body).map_err(|_| ServerError::InvalidJson)?;

        let Invocation { method, room_name } = Invocation::parse(
            &request.path,
            self.controller.matchmake_route(),
            self.controller.allowed_room_name_chars(),
        )?;

        tracing::debug!(%method, %room_name, "invoking matchmake method");
        self.controller
            .invoke_method(&method, &room_name, payload)
            .await
    }
}
