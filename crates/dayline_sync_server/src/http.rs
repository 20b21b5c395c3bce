//! HTTP binding for the sync server.
//!
//! Every request goes through one axum handler that converts it to an
//! [`HttpRequest`] and runs [`SyncServer::handle_request`] on the
//! blocking pool. Reads and status checks run under the configured
//! request timeout; pushes have no deadline.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::server::{HttpRequest, HttpResponse, SyncServer, OWNER_HEADER};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Builds the router for a server.
pub fn router(server: Arc<SyncServer>) -> Router {
    Router::new().fallback(dispatch).with_state(server)
}

/// Binds the configured address and serves until interrupted.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    let server = Arc::new(SyncServer::new(config)?);
    serve_listener(listener, server, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` completes.
pub async fn serve_listener<F>(
    listener: TcpListener,
    server: Arc<SyncServer>,
    shutdown: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Sync server listening");
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Sync server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // An unavailable signal handler leaves the server running.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn dispatch(
    State(server): State<Arc<SyncServer>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = HttpRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        authorization: header_value(&headers, header::AUTHORIZATION.as_str()),
        owner_id: header_value(&headers, OWNER_HEADER),
        body: body.to_vec(),
    };

    let deadline = request
        .has_deadline()
        .then_some(server.config().request_timeout);
    let task = tokio::task::spawn_blocking(move || server.handle_request(&request));
    let joined = match deadline {
        Some(timeout) => match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined,
            Err(_) => return respond(HttpResponse::error(&ServerError::Timeout)),
        },
        // Pushes run to completion.
        None => task.await,
    };

    respond(joined.unwrap_or_else(|join| HttpResponse::error(&ServerError::Internal(join.to_string()))))
}

fn respond(response: HttpResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], response.body).into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
