//! Entity catalog: the registry of synchronizable kinds.

use crate::error::{EngineError, EngineResult};
use crate::strategy::EntityStrategy;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps type tags to the strategy serving them.
///
/// Kinds are kept in registration order, which is also the order buckets
/// are read in.
#[derive(Clone, Default)]
pub struct Catalog {
    kinds: Vec<Arc<dyn EntityStrategy>>,
    by_tag: HashMap<&'static str, usize>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind.
    ///
    /// Fails if the tag or the bucket name is already taken.
    pub fn register(&mut self, strategy: impl EntityStrategy + 'static) -> EngineResult<()> {
        if self.by_tag.contains_key(strategy.tag()) {
            return Err(EngineError::DuplicateKind(strategy.tag().to_string()));
        }
        if self.iter().any(|kind| kind.bucket() == strategy.bucket()) {
            return Err(EngineError::DuplicateKind(strategy.bucket().to_string()));
        }
        self.by_tag.insert(strategy.tag(), self.kinds.len());
        self.kinds.push(Arc::new(strategy));
        Ok(())
    }

    /// Looks up a kind by tag.
    pub fn get(&self, tag: &str) -> Option<&dyn EntityStrategy> {
        self.by_tag
            .get(tag)
            .and_then(|&index| self.kinds.get(index))
            .map(|kind| kind.as_ref())
    }

    /// Looks up a kind by tag, failing with [`EngineError::UnknownKind`].
    pub fn require(&self, tag: &str) -> EngineResult<&dyn EntityStrategy> {
        self.get(tag)
            .ok_or_else(|| EngineError::UnknownKind(tag.to_string()))
    }

    /// Iterates over kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn EntityStrategy> {
        self.kinds.iter().map(|kind| kind.as_ref())
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.iter().map(|kind| kind.tag()).collect()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("tags", &self.tags())
            .finish()
    }
}
