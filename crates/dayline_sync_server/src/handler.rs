//! Request handlers for sync endpoints.

use crate::auth::{AuthConfig, TokenValidator};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use dayline_core::OwnerId;
use dayline_sync_engine::SyncEngine;
use dayline_sync_protocol::{
    DeltaRequest, DeltaResponse, PushRequest, PushResponse, SnapshotResponse, StatusResponse,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Engine shared by every request.
    pub engine: SyncEngine,
    validator: Option<TokenValidator>,
}

impl HandlerContext {
    /// Creates a new handler context.
    ///
    /// Fails if authentication is required but no secret is configured.
    pub fn new(config: ServerConfig, engine: SyncEngine) -> ServerResult<Self> {
        let validator = match (&config.auth_secret, config.require_auth) {
            (Some(secret), _) => Some(TokenValidator::new(
                AuthConfig::new(secret.clone()).with_expiry(config.token_expiry),
            )),
            (None, true) => {
                return Err(ServerError::Internal(
                    "authentication required but no secret configured".into(),
                ))
            }
            (None, false) => None,
        };

        Ok(Self {
            config,
            engine,
            validator,
        })
    }

    /// Returns the token validator, if a secret is configured.
    pub fn validator(&self) -> Option<&TokenValidator> {
        self.validator.as_ref()
    }

    /// Resolves the owner a request acts for.
    ///
    /// A bearer token always wins when a secret is configured. Without
    /// required auth, the `X-Owner-Id` header names the owner directly.
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        owner_header: Option<&str>,
    ) -> ServerResult<OwnerId> {
        if let (Some(validator), Some(header)) = (&self.validator, authorization) {
            return validator.validate_bearer(header);
        }
        if self.config.require_auth {
            return Err(ServerError::AuthenticationFailed("missing bearer token".into()));
        }

        let header = owner_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ServerError::AuthenticationFailed("missing owner identity".into()))?;
        header
            .parse()
            .map_err(|_| ServerError::AuthenticationFailed(format!("invalid owner id {header:?}")))
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("require_auth", &self.config.require_auth)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Handler for sync requests.
///
/// Every method takes an already authenticated owner.
#[derive(Debug)]
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a full snapshot read.
    pub fn handle_snapshot(&self, owner: OwnerId) -> ServerResult<SnapshotResponse> {
        let response = self.context.engine.snapshot(owner)?;
        info!(
            %owner,
            buckets = response.data.len(),
            records = response.data.record_count(),
            "Served snapshot"
        );
        Ok(response)
    }

    /// Handles a delta read.
    pub fn handle_delta(&self, owner: OwnerId, request: DeltaRequest) -> ServerResult<DeltaResponse> {
        let since = request.since();
        let response = self.context.engine.delta(owner, since)?;
        info!(
            %owner,
            %since,
            buckets = response.data.len(),
            records = response.data.record_count(),
            "Served delta"
        );
        Ok(response)
    }

    /// Handles a push request.
    pub fn handle_push(&self, owner: OwnerId, request: PushRequest) -> ServerResult<PushResponse> {
        let response = self.context.engine.push(owner, &request)?;
        info!(
            %owner,
            items = response.results.len(),
            failed = response.failures(),
            "Applied push"
        );
        Ok(response)
    }

    /// Handles a status check.
    pub fn handle_status(&self, owner: OwnerId) -> ServerResult<StatusResponse> {
        debug!(%owner, "Status check");
        Ok(self.context.engine.status(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayline_store::Store;
    use dayline_core::SystemClock;

    fn engine() -> SyncEngine {
        let store = Store::open_in_memory(Arc::new(SystemClock::new())).unwrap();
        SyncEngine::new(Arc::new(store))
    }

    #[test]
    fn owner_header_without_auth() {
        let context = HandlerContext::new(ServerConfig::default(), engine()).unwrap();
        let owner = OwnerId::new();

        let resolved = context
            .authenticate(None, Some(&owner.to_string()))
            .unwrap();
        assert_eq!(resolved, owner);
    }

    #[test]
    fn missing_identity_rejected() {
        let context = HandlerContext::new(ServerConfig::default(), engine()).unwrap();

        let err = context.authenticate(None, None).unwrap_err();
        assert_eq!(err.status_code(), 401);
        let err = context.authenticate(None, Some("not-a-uuid")).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn required_auth_ignores_owner_header() {
        let config = ServerConfig::default().with_auth(b"secret".to_vec());
        let context = HandlerContext::new(config, engine()).unwrap();
        let owner = OwnerId::new();

        assert!(context
            .authenticate(None, Some(&owner.to_string()))
            .is_err());

        let token = context.validator().unwrap().issue(owner).unwrap();
        let header = format!("Bearer {token}");
        assert_eq!(context.authenticate(Some(&header), None).unwrap(), owner);
    }

    #[test]
    fn auth_without_secret_is_rejected() {
        let mut config = ServerConfig::default();
        config.require_auth = true;
        assert!(HandlerContext::new(config, engine()).is_err());
    }

    #[test]
    fn empty_push_is_a_request_error() {
        let context = Arc::new(HandlerContext::new(ServerConfig::default(), engine()).unwrap());
        let handler = RequestHandler::new(context);

        let err = handler
            .handle_push(OwnerId::new(), PushRequest::new(Vec::new()))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
