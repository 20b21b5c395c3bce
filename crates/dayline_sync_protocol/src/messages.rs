//! Protocol messages for sync.

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{DateTime, Utc};
use dayline_core::Cursor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Encodes a message as JSON.
pub fn encode<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// Decodes a message from JSON.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Outcome marker carried by every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The request was handled.
    Success,
    /// The request failed as a whole.
    Error,
}

/// Record buckets keyed by bucket name (`habits`, `moodRatings`, …).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncData(BTreeMap<String, Vec<Value>>);

impl SyncData {
    /// Creates an empty set of buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a bucket.
    pub fn insert(&mut self, bucket: impl Into<String>, records: Vec<Value>) {
        self.0.insert(bucket.into(), records);
    }

    /// Returns a bucket, if present.
    pub fn get(&self, bucket: &str) -> Option<&[Value]> {
        self.0.get(bucket).map(Vec::as_slice)
    }

    /// Returns true if the bucket is present.
    pub fn contains(&self, bucket: &str) -> bool {
        self.0.contains_key(bucket)
    }

    /// Bucket names in sorted order.
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over buckets.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no buckets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of records across buckets.
    pub fn record_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Response to a snapshot or delta read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Always [`Status::Success`] for a completed read.
    pub status: Status,
    /// Record buckets.
    pub data: SyncData,
    /// Cursor to send as `since` on the next delta read.
    pub last_sync_timestamp: Cursor,
    /// Buckets that could not be read, when partial reads are enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_kinds: Vec<String>,
}

impl SyncResponse {
    /// Creates a successful response.
    pub fn success(data: SyncData, last_sync_timestamp: Cursor) -> Self {
        Self {
            status: Status::Success,
            data,
            last_sync_timestamp,
            failed_kinds: Vec::new(),
        }
    }

    /// Attaches the names of buckets that failed to read.
    pub fn with_failed_kinds(mut self, failed: Vec<String>) -> Self {
        self.failed_kinds = failed;
        self
    }
}

/// Response to a full snapshot. Every bucket is present.
pub type SnapshotResponse = SyncResponse;

/// Response to a delta read. Only changed buckets are present.
pub type DeltaResponse = SyncResponse;

/// Request for changes since a cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaRequest {
    /// Cursor from the previous read. Missing means "from the epoch".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<Cursor>,
}

impl DeltaRequest {
    /// Creates a request for changes after `since`.
    pub fn new(since: Cursor) -> Self {
        Self { since: Some(since) }
    }

    /// Returns the effective cursor.
    pub fn since(&self) -> Cursor {
        self.since.unwrap_or(Cursor::EPOCH)
    }
}

/// One client-originated change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushItem {
    /// Client-local identifier, echoed back verbatim.
    #[serde(alias = "local_id")]
    pub local_id: String,
    /// Server identifier, once the client knows it.
    #[serde(default, alias = "server_id", skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    /// Kind tag (`habit`, `mood`, …).
    #[serde(rename = "type")]
    pub kind: String,
    /// Deletion flag.
    #[serde(default, alias = "is_deleted")]
    pub is_deleted: bool,
    /// Client modification time. Informational; writes apply in arrival order.
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: Value,
}

impl PushItem {
    /// Creates a non-deleting item without a server id.
    pub fn new(local_id: impl Into<String>, kind: impl Into<String>, data: Value) -> Self {
        Self {
            local_id: local_id.into(),
            server_id: None,
            kind: kind.into(),
            is_deleted: false,
            updated_at: None,
            data,
        }
    }

    /// Creates a deletion item.
    pub fn deletion(
        local_id: impl Into<String>,
        kind: impl Into<String>,
        server_id: Option<String>,
    ) -> Self {
        Self {
            server_id,
            is_deleted: true,
            ..Self::new(local_id, kind, Value::Null)
        }
    }

    /// Sets the server id.
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    /// Sets the client modification time.
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Returns the server id, treating an empty string as absent.
    pub fn server_id(&self) -> Option<&str> {
        self.server_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// A batch of changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Changes in the order the client made them.
    #[serde(default)]
    pub items: Vec<PushItem>,
}

impl PushRequest {
    /// Creates a push request.
    pub fn new(items: Vec<PushItem>) -> Self {
        Self { items }
    }

    /// Checks batch-level rules.
    pub fn validate(&self, max_items: usize) -> ProtocolResult<()> {
        if self.items.is_empty() {
            return Err(ProtocolError::invalid("No items to sync"));
        }
        if self.items.len() > max_items {
            return Err(ProtocolError::invalid(format!(
                "Too many items: {} exceeds the limit of {max_items}",
                self.items.len()
            )));
        }
        Ok(())
    }
}

/// Outcome of one push item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResult {
    /// The item's client-local identifier.
    pub local_id: String,
    /// The record's server id. `None` for failures and never-synced deletions.
    pub server_id: Option<String>,
    /// Whether the item was applied.
    pub success: bool,
    /// Why the item failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushResult {
    /// Creates a success result.
    pub fn ok(local_id: impl Into<String>, server_id: Option<String>) -> Self {
        Self {
            local_id: local_id.into(),
            server_id,
            success: true,
            error: None,
        }
    }

    /// Creates a failure result.
    pub fn failed(local_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            server_id: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Response to a push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResponse {
    /// Always [`Status::Success`] once the batch was processed.
    pub status: Status,
    /// One result per pushed item.
    pub results: Vec<PushResult>,
}

impl PushResponse {
    /// Creates a successful response.
    pub fn success(results: Vec<PushResult>) -> Self {
        Self {
            status: Status::Success,
            results,
        }
    }

    /// Number of failed items.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Reachability and identity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Always [`Status::Success`].
    pub status: Status,
    /// Server clock at the time of the request.
    pub server_timestamp: DateTime<Utc>,
    /// The caller's owner id.
    pub user_id: String,
}

impl StatusResponse {
    /// Creates a status response.
    pub fn new(server_timestamp: DateTime<Utc>, user_id: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            server_timestamp,
            user_id: user_id.into(),
        }
    }
}

/// Envelope for request-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always [`Status::Error`].
    pub status: Status,
    /// Human-readable message.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error envelope.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error: error.into(),
        }
    }
}
