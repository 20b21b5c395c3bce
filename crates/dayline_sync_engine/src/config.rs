//! Configuration for the sync engine.

/// Default upper bound on items per push.
pub const DEFAULT_MAX_PUSH_BATCH: usize = 500;

/// Engine behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Report unreadable buckets under `failedKinds` instead of failing
    /// the whole snapshot or delta read.
    pub tolerate_bucket_failures: bool,
    /// Maximum number of items accepted in one push.
    pub max_push_batch: usize,
}

impl EngineOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self {
            tolerate_bucket_failures: false,
            max_push_batch: DEFAULT_MAX_PUSH_BATCH,
        }
    }

    /// Enables or disables partial-tolerant reads.
    pub fn with_tolerate_bucket_failures(mut self, tolerate: bool) -> Self {
        self.tolerate_bucket_failures = tolerate;
        self
    }

    /// Sets the push batch limit.
    pub fn with_max_push_batch(mut self, max: usize) -> Self {
        self.max_push_batch = max;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = EngineOptions::default();
        assert!(!options.tolerate_bucket_failures);
        assert_eq!(options.max_push_batch, DEFAULT_MAX_PUSH_BATCH);
    }

    #[test]
    fn builder() {
        let options = EngineOptions::new()
            .with_tolerate_bucket_failures(true)
            .with_max_push_batch(10);
        assert!(options.tolerate_bucket_failures);
        assert_eq!(options.max_push_batch, 10);
    }
}
