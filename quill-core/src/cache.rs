use crate::{Config, ConnectionId, DriverError, Prepared, truncate_long};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use lru::LruCache;
use std::{
    future::Future,
    hash::{BuildHasher, RandomState},
    num::NonZeroUsize,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

/// Statements are cached per connection and per final SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub connection: ConnectionId,
    pub sql: Arc<str>,
}

impl CacheKey {
    pub fn new(connection: ConnectionId, sql: &str) -> Self {
        Self {
            connection,
            sql: sql.into(),
        }
    }
}

type Preparation<P> = Shared<BoxFuture<'static, Result<Arc<P>, DriverError>>>;

enum Slot<P> {
    Ready(Arc<P>),
    Pending {
        generation: u64,
        preparation: Preparation<P>,
    },
}

type Shard<P> = Mutex<LruCache<CacheKey, Slot<P>>>;

/// Prepared statements keyed by `(connection, sql)`.
///
/// Concurrent requests for a key that is not cached yet share a single
/// preparation: the first caller installs it, the others await the same
/// shared future. The preparation keeps going as long as any of them is still
/// waiting, and an abandoned one is resumed by the next caller. A failed
/// preparation is handed to every waiter and then forgotten, so the next
/// request tries again.
///
/// Keys are spread over independently locked shards and locks are never held
/// while preparing, requests for different keys never wait for each other.
///
/// When a capacity is configured the least recently used statements are
/// evicted, skipping those currently executing and preparations somebody is
/// still waiting on.
pub struct StatementCache<P: Prepared> {
    shards: Box<[Shard<P>]>,
    shard_capacity: Option<NonZeroUsize>,
    hasher: RandomState,
    generation: AtomicU64,
}

impl<P: Prepared> StatementCache<P> {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// The capacity is split evenly between the shards, rounding down, so the
    /// total never exceeds it. There are never more shards than capacity.
    pub fn with_config(config: &Config) -> Self {
        let shards = match config.statement_cache_capacity {
            Some(capacity) => config.cache_shards.min(capacity),
            None => config.cache_shards,
        };
        Self {
            shards: (0..shards.get())
                .map(|_| Mutex::new(LruCache::unbounded()))
                .collect(),
            shard_capacity: config
                .statement_cache_capacity
                .map(|v| NonZeroUsize::new(v.get() / shards).unwrap_or(NonZeroUsize::MIN)),
            hasher: RandomState::new(),
            generation: AtomicU64::new(0),
        }
    }

    fn shard(&self, key: &CacheKey) -> MutexGuard<'_, LruCache<CacheKey, Slot<P>>> {
        let index = self.hasher.hash_one(key) as usize % self.shards.len();
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the statement for `sql` on `connection`, calling `prepare` only
    /// when nobody prepared it or is preparing it already.
    ///
    /// `prepare` is called with a lock held and must only build the future,
    /// the actual work happens when the future is polled.
    pub async fn get_or_prepare<F, Fut>(
        &self,
        connection: ConnectionId,
        sql: &str,
        prepare: F,
    ) -> Result<Arc<P>, DriverError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<P>> + Send + 'static,
    {
        let key = CacheKey::new(connection, sql);
        let (generation, preparation) = {
            let mut entries = self.shard(&key);
            match entries.get(&key) {
                Some(Slot::Ready(prepared)) => {
                    log::trace!("Statement cache hit on connection {}", connection);
                    return Ok(prepared.clone());
                }
                Some(Slot::Pending {
                    generation,
                    preparation,
                }) => (*generation, preparation.clone()),
                None => {
                    log::trace!(
                        "Statement cache miss on connection {}, preparing:\n{}",
                        connection,
                        truncate_long!(sql)
                    );
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let preparation = prepare(sql.to_owned())
                        .map(|v| v.map(Arc::new).map_err(DriverError::from))
                        .boxed()
                        .shared();
                    entries.put(
                        key.clone(),
                        Slot::Pending {
                            generation,
                            preparation: preparation.clone(),
                        },
                    );
                    self.evict(&mut entries);
                    (generation, preparation)
                }
            }
        };
        let result = preparation.await;
        self.settle(&key, generation, &result);
        result
    }

    /// Replaces the pending slot of `generation` with the outcome of its preparation.
    fn settle(&self, key: &CacheKey, generation: u64, result: &Result<Arc<P>, DriverError>) {
        let mut entries = self.shard(key);
        let Some(Slot::Pending {
            generation: current,
            ..
        }) = entries.peek(key)
        else {
            return;
        };
        if *current != generation {
            return;
        }
        match result {
            Ok(prepared) => {
                if let Some(slot) = entries.peek_mut(key) {
                    *slot = Slot::Ready(prepared.clone());
                }
            }
            Err(e) => {
                log::error!("{:#}", e);
                entries.pop(key);
            }
        }
    }

    fn evict(&self, entries: &mut LruCache<CacheKey, Slot<P>>) {
        let Some(capacity) = self.shard_capacity else {
            return;
        };
        while entries.len() > capacity.get() {
            // Oldest first, a handle cloned elsewhere is executing right now and
            // a preparation nobody else holds was abandoned by every waiter
            let candidate = entries.iter().rev().find_map(|(key, slot)| match slot {
                Slot::Ready(prepared) if Arc::strong_count(prepared) == 1 => Some(key.clone()),
                Slot::Pending { preparation, .. } if preparation.strong_count() == Some(1) => {
                    Some(key.clone())
                }
                _ => None,
            });
            let Some(candidate) = candidate else {
                break;
            };
            log::trace!(
                "Evicting statement of connection {}:\n{}",
                candidate.connection,
                truncate_long!(candidate.sql)
            );
            entries.pop(&candidate);
        }
    }

    /// Forgets every statement of `connection`.
    pub fn evict_connection(&self, connection: ConnectionId) -> usize {
        let mut evicted = 0;
        for shard in &self.shards {
            let mut entries = shard.lock().unwrap_or_else(PoisonError::into_inner);
            let keys = entries
                .iter()
                .filter(|(k, _)| k.connection == connection)
                .map(|(k, _)| k.clone())
                .collect::<Vec<_>>();
            for key in keys {
                entries.pop(&key);
                evicted += 1;
            }
        }
        log::debug!(
            "Evicted {} statements of connection {}",
            evicted,
            connection
        );
        evicted
    }

    /// True if a prepared statement (not a pending one) is cached.
    pub fn contains(&self, connection: ConnectionId, sql: &str) -> bool {
        let key = CacheKey::new(connection, sql);
        matches!(self.shard(&key).peek(&key), Some(Slot::Ready(..)))
    }

    /// Number of entries, pending preparations included.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|v| v.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: Prepared> Default for StatementCache<P> {
    fn default() -> Self {
        Self::new()
    }
}
