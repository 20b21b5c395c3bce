//! # Dayline Sync Server
//!
//! HTTP sync server for dayline clients.
//!
//! This crate provides:
//! - Request routing for the snapshot, delta, push and status endpoints
//! - Authentication (HMAC-SHA256 bearer tokens naming the owner)
//! - Error mapping to HTTP statuses and the JSON error envelope
//! - An axum binding with per-request timeouts
//!
//! # Routes
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/api/sync/all` | Full snapshot |
//! | POST | `/api/sync/changes` | Delta since a cursor |
//! | POST | `/api/sync/push` | Batched push |
//! | GET | `/api/sync/status` | Server clock and caller identity |
//!
//! # Authentication
//!
//! With a secret configured, requests carry `Authorization: Bearer <token>`:
//!
//! ```rust,ignore
//! use dayline_sync_server::{AuthConfig, ServerConfig, TokenValidator};
//!
//! let secret = b"my-secure-secret-32-bytes-long!".to_vec();
//! let config = ServerConfig::default().with_auth(secret.clone());
//!
//! let validator = TokenValidator::new(AuthConfig::new(secret));
//! let token = validator.issue(owner)?;
//! ```
//!
//! Without required auth the owner may instead be named by an
//! `X-Owner-Id` header, for local development.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
pub mod http;
mod server;

pub use auth::{decode_token, encode_token, AuthConfig, TokenValidator};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::{
    HttpRequest, HttpResponse, SyncServer, DELTA_PATH, OWNER_HEADER, PUSH_PATH, SNAPSHOT_PATH,
    STATUS_PATH,
};
