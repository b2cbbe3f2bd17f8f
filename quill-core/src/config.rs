use std::{num::NonZeroUsize, time::Duration};

/// Tuning knobs of the statement cache and the executor.
///
/// ```rust
/// use quill_core::Config;
/// use std::time::Duration;
/// let config = Config::default()
///     .with_statement_cache_capacity(512)
///     .with_query_timeout(Duration::from_secs(5));
/// assert_eq!(config.statement_cache_capacity.map(|v| v.get()), Some(512));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on cached statements, `None` keeps every statement until
    /// its connection closes.
    pub statement_cache_capacity: Option<NonZeroUsize>,
    /// Number of independently locked parts of the cache, never more than
    /// the capacity when one is set.
    pub cache_shards: NonZeroUsize,
    /// Deadline applied to every executor call.
    pub query_timeout: Option<Duration>,
}

impl Config {
    pub const DEFAULT_CACHE_SHARDS: NonZeroUsize = NonZeroUsize::new(16).unwrap();

    /// A capacity of 0 removes the bound.
    pub fn with_statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = NonZeroUsize::new(capacity);
        self
    }

    /// A value of 0 is treated as 1.
    pub fn with_cache_shards(mut self, shards: usize) -> Self {
        self.cache_shards = NonZeroUsize::new(shards).unwrap_or(NonZeroUsize::MIN);
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            statement_cache_capacity: None,
            cache_shards: Self::DEFAULT_CACHE_SHARDS,
            query_timeout: None,
        }
    }
}
