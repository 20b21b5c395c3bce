//! Authentication support for the sync server.
//!
//! This module provides bearer-token authentication using HMAC-SHA256.
//! A valid token names the owner every request acts for.
//!
//! ## Token Format
//!
//! Tokens are composed of:
//! - 16 bytes: owner id
//! - 8 bytes: issued-at timestamp (Unix millis, big-endian)
//! - 32 bytes: HMAC-SHA256 signature
//!
//! Total: 56 bytes, base64-encoded (URL-safe, no padding) for transport.

use crate::error::{ServerError, ServerResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dayline_core::OwnerId;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const OWNER_LEN: usize = 16;
const SIGNED_LEN: usize = OWNER_LEN + 8;
const TOKEN_LEN: usize = SIGNED_LEN + 32;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

/// Issues and validates owner tokens.
#[derive(Clone)]
pub struct TokenValidator {
    config: AuthConfig,
}

impl TokenValidator {
    /// Creates a new token validator.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Creates a raw token for an owner, issued now.
    pub fn create_token(&self, owner: OwnerId) -> ServerResult<Vec<u8>> {
        self.create_token_at(owner, now_millis())
    }

    /// Creates a raw token for an owner with an explicit issue time.
    pub fn create_token_at(&self, owner: OwnerId, issued_at_millis: u64) -> ServerResult<Vec<u8>> {
        let mut token = Vec::with_capacity(TOKEN_LEN);
        token.extend_from_slice(owner.as_bytes());
        token.extend_from_slice(&issued_at_millis.to_be_bytes());

        let signature = self.mac(&token)?.finalize().into_bytes();
        token.extend_from_slice(&signature);
        Ok(token)
    }

    /// Creates a transport-encoded token for an owner, issued now.
    pub fn issue(&self, owner: OwnerId) -> ServerResult<String> {
        Ok(encode_token(&self.create_token(owner)?))
    }

    /// Validates a raw token and returns the owner it names.
    pub fn validate_token(&self, token: &[u8]) -> ServerResult<OwnerId> {
        if token.len() != TOKEN_LEN {
            return Err(ServerError::AuthenticationFailed("invalid token length".into()));
        }

        let (signed, signature) = token.split_at(SIGNED_LEN);
        self.mac(signed)?
            .verify_slice(signature)
            .map_err(|_| ServerError::AuthenticationFailed("invalid signature".into()))?;

        let mut owner = [0u8; OWNER_LEN];
        owner.copy_from_slice(&signed[..OWNER_LEN]);
        let mut issued = [0u8; 8];
        issued.copy_from_slice(&signed[OWNER_LEN..]);

        let issued_at = u64::from_be_bytes(issued);
        let expiry_millis = u64::try_from(self.config.token_expiry.as_millis()).unwrap_or(u64::MAX);
        if now_millis() > issued_at.saturating_add(expiry_millis) {
            return Err(ServerError::AuthenticationFailed("token expired".into()));
        }

        Ok(OwnerId::from_bytes(owner))
    }

    /// Validates an `Authorization` header value of the form `Bearer <token>`.
    pub fn validate_bearer(&self, header: &str) -> ServerResult<OwnerId> {
        let encoded = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ServerError::AuthenticationFailed("expected a bearer token".into())
            })?;
        self.validate_token(&decode_token(encoded)?)
    }

    fn mac(&self, data: &[u8]) -> ServerResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| ServerError::Internal(format!("hmac key: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("token_expiry", &self.config.token_expiry)
            .finish_non_exhaustive()
    }
}

/// Encodes a raw token for transport.
pub fn encode_token(token: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(token)
}

/// Decodes a transport-encoded token.
pub fn decode_token(encoded: &str) -> ServerResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| ServerError::AuthenticationFailed("token is not valid base64".into()))
}

fn now_millis() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
