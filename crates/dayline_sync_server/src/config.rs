//! Server configuration.

use dayline_sync_engine::{EngineOptions, DEFAULT_MAX_PUSH_BATCH};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Database file. `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    /// Deadline for snapshot, delta and status requests. Pushes always
    /// run to completion.
    pub request_timeout: Duration,
    /// Maximum items per push request.
    pub max_push_batch: usize,
    /// Report unreadable buckets instead of failing reads.
    pub tolerate_bucket_failures: bool,
    /// Whether to require bearer tokens.
    pub require_auth: bool,
    /// Secret key for token signing and validation (if auth enabled).
    pub auth_secret: Option<Vec<u8>>,
    /// How long an issued token stays valid.
    pub token_expiry: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            database_path: None,
            request_timeout: Duration::from_secs(30),
            max_push_batch: DEFAULT_MAX_PUSH_BATCH,
            tolerate_bucket_failures: false,
            require_auth: false,
            auth_secret: None,
            token_expiry: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }

    /// Sets the database file.
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the read request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum push batch size.
    pub fn with_max_push_batch(mut self, size: usize) -> Self {
        self.max_push_batch = size;
        self
    }

    /// Enables partial-tolerant snapshot and delta reads.
    pub fn with_tolerate_bucket_failures(mut self, tolerate: bool) -> Self {
        self.tolerate_bucket_failures = tolerate;
        self
    }

    /// Enables authentication with the given secret.
    pub fn with_auth(mut self, secret: Vec<u8>) -> Self {
        self.require_auth = true;
        self.auth_secret = Some(secret);
        self
    }

    /// Sets the token lifetime.
    pub fn with_token_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }

    /// Engine options derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::new()
            .with_max_push_batch(self.max_push_batch)
            .with_tolerate_bucket_failures(self.tolerate_bucket_failures)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8080)))
    }
}
