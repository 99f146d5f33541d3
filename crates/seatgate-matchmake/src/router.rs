//! Mounts a [`MatchmakeDispatcher`] on axum.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::IntoResponse;
use axum::routing::any;

use crate::{MatchmakeDispatcher, MatchmakeRequest};

/// Builds a router serving every method under `/<matchmake_route>`.
///
/// Paths outside the matchmake route fall through to axum's 404.
pub fn router(dispatcher: Arc<MatchmakeDispatcher>) -> Router {
    let route = dispatcher.controller().matchmake_route().trim_matches('/').to_string();

    Router::new()
        .route(&format!("/{route}"), any(matchmake_handler))
        .route(&format!("/{route}/"), any(matchmake_handler))
        .route(&format!("/{route}/{{*rest}}"), any(matchmake_handler))
        .with_state(dispatcher)
}

async fn matchmake_handler(
    State(dispatcher): State<Arc<MatchmakeDispatcher>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let request = MatchmakeRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    };
    dispatcher.handle(request).await
}
