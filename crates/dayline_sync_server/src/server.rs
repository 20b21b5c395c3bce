//! Main sync server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use dayline_core::{OwnerId, SystemClock};
use dayline_store::Store;
use dayline_sync_engine::{Catalog, SyncEngine};
use dayline_sync_protocol::{decode, encode, DeltaRequest, ErrorResponse, PushRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

/// Path of the snapshot route.
pub const SNAPSHOT_PATH: &str = "/api/sync/all";
/// Path of the delta route.
pub const DELTA_PATH: &str = "/api/sync/changes";
/// Path of the push route.
pub const PUSH_PATH: &str = "/api/sync/push";
/// Path of the status route.
pub const STATUS_PATH: &str = "/api/sync/status";

/// Name of the development-mode owner header.
pub const OWNER_HEADER: &str = "x-owner-id";

const FALLBACK_ERROR_BODY: &[u8] = br#"{"status":"error","error":"internal error"}"#;

/// A transport-neutral request.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Request method, upper case.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// Value of the `Authorization` header.
    pub authorization: Option<String>,
    /// Value of the `X-Owner-Id` header.
    pub owner_id: Option<String>,
    /// Request body.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a request with no headers or body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns true if the request may be answered with a timeout.
    ///
    /// A push keeps committing after its caller stops waiting, so it is
    /// never cut short.
    pub fn has_deadline(&self) -> bool {
        self.path != PUSH_PATH
    }

    /// Sets the bearer token.
    pub fn with_bearer(mut self, token: impl AsRef<str>) -> Self {
        self.authorization = Some(format!("Bearer {}", token.as_ref()));
        self
    }

    /// Sets the development owner header.
    pub fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner_id = Some(owner.to_string());
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// A transport-neutral response carrying a JSON body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn json<T: Serialize>(value: &T) -> Self {
        match encode(value) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(&ServerError::Internal(e.to_string())),
        }
    }

    /// Builds the error envelope for a request-level failure.
    pub fn error(err: &ServerError) -> Self {
        let body = encode(&ErrorResponse::new(err.to_string()))
            .unwrap_or_else(|_| FALLBACK_ERROR_BODY.to_vec());
        Self {
            status: err.status_code(),
            body,
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The sync server.
///
/// Routes requests to the snapshot, delta, push and status handlers
/// after resolving the caller's owner. Transport bindings hand it
/// [`HttpRequest`]s; see [`crate::http`] for the axum binding.
///
/// # Example
///
/// ```
/// use dayline_sync_server::{HttpRequest, ServerConfig, SyncServer};
/// use dayline_core::OwnerId;
///
/// let server = SyncServer::new(ServerConfig::default()).unwrap();
/// let request = HttpRequest::new("GET", "/api/sync/status").with_owner(OwnerId::new());
///
/// let response = server.handle_request(&request);
/// assert_eq!(response.status, 200);
/// ```
pub struct SyncServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl SyncServer {
    /// Creates a sync server over the configured database.
    ///
    /// Without a database path the store lives in memory.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let clock = Arc::new(SystemClock::new());
        let store = match &config.database_path {
            Some(path) => Store::open(path, clock),
            None => Store::open_in_memory(clock),
        }
        .map_err(|e| ServerError::Database(e.to_string()))?;

        let engine = SyncEngine::with_catalog(
            Arc::new(store),
            Catalog::try_standard()?,
            config.engine_options(),
        );
        Self::with_engine(config, engine)
    }

    /// Creates a sync server around an existing engine.
    pub fn with_engine(config: ServerConfig, engine: SyncEngine) -> ServerResult<Self> {
        let context = Arc::new(HandlerContext::new(config, engine)?);
        let handler = RequestHandler::new(Arc::clone(&context));
        Ok(Self { handler, context })
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Returns the engine.
    pub fn engine(&self) -> &SyncEngine {
        &self.context.engine
    }

    /// Returns the handler context.
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Handles one request, mapping failures to the error envelope.
    pub fn handle_request(&self, request: &HttpRequest) -> HttpResponse {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(err) => {
                if err.is_server_error() {
                    error!(method = %request.method, path = %request.path, error = %err, "Request failed");
                } else {
                    warn!(method = %request.method, path = %request.path, error = %err, "Request rejected");
                }
                HttpResponse::error(&err)
            }
        }
    }

    fn dispatch(&self, request: &HttpRequest) -> ServerResult<HttpResponse> {
        let expected = match request.path.as_str() {
            SNAPSHOT_PATH | STATUS_PATH => "GET",
            DELTA_PATH | PUSH_PATH => "POST",
            other => return Err(ServerError::NotFound(other.to_string())),
        };
        if !request.method.eq_ignore_ascii_case(expected) {
            return Err(ServerError::MethodNotAllowed {
                method: request.method.clone(),
                path: request.path.clone(),
            });
        }

        let owner = self
            .context
            .authenticate(request.authorization.as_deref(), request.owner_id.as_deref())?;

        let response = match request.path.as_str() {
            SNAPSHOT_PATH => HttpResponse::json(&self.handler.handle_snapshot(owner)?),
            STATUS_PATH => HttpResponse::json(&self.handler.handle_status(owner)?),
            DELTA_PATH => {
                let delta = if request.body.iter().all(u8::is_ascii_whitespace) {
                    DeltaRequest::default()
                } else {
                    decode(&request.body)?
                };
                HttpResponse::json(&self.handler.handle_delta(owner, delta)?)
            }
            _ => {
                let push: PushRequest = decode(&request.body)?;
                HttpResponse::json(&self.handler.handle_push(owner, push)?)
            }
        };
        Ok(response)
    }
}

impl std::fmt::Debug for SyncServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncServer")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn body(response: &HttpResponse) -> Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn status_route() {
        let server = SyncServer::new(ServerConfig::default()).unwrap();
        let owner = OwnerId::new();

        let response = server.handle_request(&HttpRequest::new("GET", STATUS_PATH).with_owner(owner));
        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["userId"], owner.to_string());
        assert_eq!(body(&response)["status"], "success");
    }

    #[test]
    fn unknown_route() {
        let server = SyncServer::new(ServerConfig::default()).unwrap();
        let response = server.handle_request(&HttpRequest::new("GET", "/api/sync/nope"));
        assert_eq!(response.status, 404);
        assert_eq!(body(&response)["status"], "error");
    }

    #[test]
    fn wrong_method() {
        let server = SyncServer::new(ServerConfig::default()).unwrap();
        let request = HttpRequest::new("GET", PUSH_PATH).with_owner(OwnerId::new());
        assert_eq!(server.handle_request(&request).status, 405);
    }

    #[test]
    fn empty_delta_body_reads_from_epoch() {
        let server = SyncServer::new(ServerConfig::default()).unwrap();
        let request = HttpRequest::new("POST", DELTA_PATH).with_owner(OwnerId::new());

        let response = server.handle_request(&request);
        assert!(response.is_success());
        assert!(body(&response)["data"].as_object().unwrap().is_empty());
    }

    #[test]
    fn only_pushes_run_without_deadline() {
        assert!(!HttpRequest::new("POST", PUSH_PATH).has_deadline());
        assert!(HttpRequest::new("POST", DELTA_PATH).has_deadline());
        assert!(HttpRequest::new("GET", SNAPSHOT_PATH).has_deadline());
        assert!(HttpRequest::new("GET", STATUS_PATH).has_deadline());
    }

    #[test]
    fn malformed_body() {
        let server = SyncServer::new(ServerConfig::default()).unwrap();
        let request = HttpRequest::new("POST", PUSH_PATH)
            .with_owner(OwnerId::new())
            .with_body("{not json");

        let response = server.handle_request(&request);
        assert_eq!(response.status, 400);
        assert!(body(&response)["error"].as_str().unwrap().starts_with("invalid request"));
    }
}
