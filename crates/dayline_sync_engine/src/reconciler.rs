//! Push reconciliation.

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineResult};
use dayline_core::{OwnerId, ServerId};
use dayline_store::Store;
use dayline_sync_protocol::{PushItem, PushResult};
use tracing::{debug, info, warn};

/// Applies pushed items one at a time.
///
/// Each item runs in its own write transaction. A failing item is
/// reported in its result and rolled back; it never affects the others.
pub struct PushReconciler<'a> {
    store: &'a Store,
    catalog: &'a Catalog,
}

impl<'a> PushReconciler<'a> {
    /// Creates a reconciler.
    pub fn new(store: &'a Store, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }

    /// Applies every item in order and returns one result per item.
    pub fn push(&self, owner: OwnerId, items: &[PushItem]) -> Vec<PushResult> {
        let results: Vec<PushResult> = items.iter().map(|item| self.apply(owner, item)).collect();
        let failed = results.iter().filter(|r| !r.success).count();
        info!(%owner, items = items.len(), failed, "Push reconciled");
        results
    }

    /// Applies one item.
    pub fn apply(&self, owner: OwnerId, item: &PushItem) -> PushResult {
        match self.try_apply(owner, item) {
            Ok(server_id) => {
                debug!(
                    local_id = %item.local_id,
                    kind = %item.kind,
                    deleted = item.is_deleted,
                    server_id = ?server_id,
                    "Applied push item"
                );
                PushResult::ok(&item.local_id, server_id.map(|id| id.to_string()))
            }
            Err(err) => {
                warn!(
                    local_id = %item.local_id,
                    kind = %item.kind,
                    error = %err,
                    "Push item failed"
                );
                PushResult::failed(&item.local_id, err.to_string())
            }
        }
    }

    fn try_apply(&self, owner: OwnerId, item: &PushItem) -> EngineResult<Option<ServerId>> {
        let kind = self.catalog.require(&item.kind)?;
        let server_id = item
            .server_id()
            .map(|raw| {
                raw.parse::<ServerId>()
                    .map_err(|_| EngineError::InvalidServerId(raw.to_string()))
            })
            .transpose()?;

        if item.is_deleted {
            // Created and deleted offline: nothing exists server-side.
            let Some(id) = server_id else {
                return Ok(None);
            };
            self.store.write(|tx| kind.delete(tx, owner, id))?;
            return Ok(Some(id));
        }

        let row = kind.decode(&item.data)?;
        let id = self
            .store
            .write(|tx| kind.write(tx, owner, server_id, &row))?;
        Ok(Some(id))
    }
}
