//! # Store (C3)
//!
//! Orchestrates the LRU map and the WAL under a single coarse async
//! mutex, and maintains statistics. This is the only type adapters
//! (`nskv-server`, `nskv-client`) talk to.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use nskv_common::{Action, Error, QualifiedKey, Result, StoreConfig, WalRecord};
use tokio::sync::Mutex;

use crate::lru::{GetOutcome, LruMap};
use crate::stats::{NamespaceSnapshot, Stats, StatsSnapshot};
use crate::wal::{self, LiveEntry, Wal};

struct StoreState {
    lru: LruMap,
    wal: Wal,
    stats: Stats,
}

/// The in-memory, namespace-partitioned, TTL-aware, crash-recoverable
/// key-value store.
pub struct Store {
    config: StoreConfig,
    state: Mutex<StoreState>,
}

impl Store {
    /// Opens the store, replaying the WAL at `config.log_file` if it
    /// exists (spec §4.2 Recovery).
    pub async fn open(config: StoreConfig) -> Result<Arc<Self>> {
        let records = wal::Wal::read_all(&config.log_file).await?;

        let mut lru = LruMap::new(config.capacity);
        let replay_instant = Instant::now();
        let replay_wall = SystemTime::now();
        let mut replayed = 0u64;
        let mut skipped_expired = 0u64;

        for record in &records {
            let qk = QualifiedKey::new(record.namespace_or_default(), record.key.clone());
            match record.action {
                Action::Set => {
                    let Some(value) = record.value.clone() else {
                        tracing::warn!(key = %qk, "SET record missing value during recovery, skipping");
                        continue;
                    };
                    let expires_at = match record.ttl {
                        None => None,
                        Some(ttl) => {
                            let record_wall = UNIX_EPOCH + Duration::from_secs_f64(record.timestamp.max(0.0));
                            let deadline_wall = record_wall + Duration::from_secs(ttl);
                            if deadline_wall <= replay_wall {
                                skipped_expired += 1;
                                continue;
                            }
                            let remaining = deadline_wall
                                .duration_since(replay_wall)
                                .unwrap_or(Duration::ZERO);
                            Some(replay_instant + remaining)
                        }
                    };
                    lru.put_no_evict(qk, value, expires_at);
                    replayed += 1;
                }
                Action::Delete => {
                    lru.delete(&qk);
                    replayed += 1;
                }
            }
        }

        let trimmed = lru.trim_to_capacity();

        tracing::info!(
            records = records.len(),
            replayed,
            skipped_expired,
            trimmed,
            "wal recovery complete"
        );

        let wal = wal::Wal::open(&config.log_file).await?;
        let mut stats = Stats::new();
        stats.log_size = records.len() as u64;

        Ok(Arc::new(Store {
            config,
            state: Mutex::new(StoreState { lru, wal, stats }),
        }))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// SET: validate, append, mutate, update stats (spec §4.3, §2 data flow).
    pub async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl_secs: Option<i64>,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Validation("key must not be empty".into()));
        }
        let ttl = match ttl_secs {
            None => None,
            Some(n) if n > 0 => Some(n as u64),
            Some(_) => {
                return Err(Error::Validation(
                    "ttl must be a positive integer number of seconds".into(),
                ))
            }
        };

        let mut state = self.state.lock().await;

        let record = WalRecord {
            timestamp: wal::unix_timestamp(),
            action: Action::Set,
            key: key.to_string(),
            namespace: non_default(namespace),
            value: Some(value.clone()),
            ttl,
        };
        state.wal.append(&record).await?;

        let expires_at = ttl.map(|secs| Instant::now() + Duration::from_secs(secs));
        let qk = QualifiedKey::new(namespace, key);
        let evicted = state.lru.put(qk, value, expires_at);
        if evicted.is_some() {
            state.stats.record_eviction();
        }
        state.stats.log_size += 1;
        Ok(())
    }

    /// GET: lazy-expiring lookup that updates hit/miss counters and
    /// recency (spec §4.1, §4.3).
    pub async fn get(&self, namespace: &str, key: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        let qk = QualifiedKey::new(namespace, key);
        match state.lru.get(&qk, Instant::now()) {
            GetOutcome::Live(value) => {
                state.stats.record_hit(namespace);
                Ok(value)
            }
            GetOutcome::Expired => {
                state.lru.delete(&qk);
                state.stats.record_miss(namespace);
                Err(Error::NotFound)
            }
            GetOutcome::Absent => {
                state.stats.record_miss(namespace);
                Err(Error::NotFound)
            }
        }
    }

    /// DELETE: WAL record is appended unconditionally, even for an
    /// absent key, before the in-memory removal (spec §4.3). `log_size`
    /// only advances when a live entry actually existed.
    pub async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let mut state = self.state.lock().await;

        let record = WalRecord {
            timestamp: wal::unix_timestamp(),
            action: Action::Delete,
            key: key.to_string(),
            namespace: non_default(namespace),
            value: None,
            ttl: None,
        };
        state.wal.append(&record).await?;

        let qk = QualifiedKey::new(namespace, key);
        let existed = state.lru.delete(&qk);
        if existed {
            state.stats.log_size += 1;
        }
        Ok(existed)
    }

    /// Every namespace with at least one live entry, default namespace included.
    pub async fn list_namespaces(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.lru.list_namespaces().into_iter().collect()
    }

    pub async fn namespace_size(&self, namespace: &str) -> usize {
        let state = self.state.lock().await;
        state.lru.namespace_size(namespace)
    }

    /// Appends one DELETE record per live entry in `namespace`, then
    /// removes it from the map. Returns the count removed.
    pub async fn clear_namespace(&self, namespace: &str) -> Result<usize> {
        let mut state = self.state.lock().await;
        let keys = state.lru.keys_in_namespace(namespace);

        for qk in &keys {
            let record = WalRecord {
                timestamp: wal::unix_timestamp(),
                action: Action::Delete,
                key: qk.key.clone(),
                namespace: non_default(&qk.namespace),
                value: None,
                ttl: None,
            };
            state.wal.append(&record).await?;
            state.lru.delete(qk);
        }
        state.stats.log_size += keys.len() as u64;
        Ok(keys.len())
    }

    /// Read-only snapshot of the statistics. `total_keys` is always
    /// computed from the live LRU map, never from a running counter.
    pub async fn stats(&self) -> StatsSnapshot {
        let state = self.state.lock().await;
        let total_keys = state.lru.len();
        let namespaces = state
            .lru
            .list_namespaces()
            .into_iter()
            .map(|ns| {
                let counters = state.stats.namespaces.get(&ns);
                let snapshot = NamespaceSnapshot {
                    cache_hits: counters.map(|c| c.cache_hits).unwrap_or(0),
                    cache_misses: counters.map(|c| c.cache_misses).unwrap_or(0),
                    total_keys: state.lru.namespace_size(&ns),
                };
                (ns, snapshot)
            })
            .collect();

        StatsSnapshot {
            total_keys,
            cache_hits: state.stats.cache_hits,
            cache_misses: state.stats.cache_misses,
            evictions: state.stats.evictions,
            log_size: state.stats.log_size,
            last_compaction: state.stats.last_compaction,
            uptime: state
                .stats
                .start_time
                .elapsed()
                .unwrap_or(Duration::ZERO),
            namespaces,
        }
    }

    /// Collects every expired key and deletes each one through
    /// [`Store::delete`] so the removal is itself logged to the WAL
    /// (spec §4.4). The iteration-then-delete split is deliberate: it
    /// bounds how long the sweep holds the mutex in one critical
    /// section.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let expired = {
            let state = self.state.lock().await;
            state.lru.iter_expired(now)
        };

        let mut removed = 0;
        for qk in expired {
            if self.delete(&qk.namespace, &qk.key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Runs compaction only when `log_size` exceeds `max_log_size`
    /// (spec §4.4).
    pub async fn maybe_compact(&self) -> Result<()> {
        let should_compact = {
            let state = self.state.lock().await;
            state.stats.log_size > self.config.max_log_size
        };
        if should_compact {
            self.compact_now().await?;
        }
        Ok(())
    }

    /// Unconditionally rewrites the WAL to hold exactly one SET per live
    /// entry (spec §4.2). Snapshots under the mutex, performs file I/O
    /// without it held, then re-acquires only to refresh the append
    /// handle and update `log_size`/`last_compaction` (spec §4.4).
    pub async fn compact_now(&self) -> Result<()> {
        let (path, live) = {
            let state = self.state.lock().await;
            let now = Instant::now();
            let live = state
                .lru
                .snapshot_live(now)
                .into_iter()
                .map(|(key, value, remaining)| LiveEntry {
                    key,
                    value,
                    remaining_ttl_secs: remaining.map(|d| d.as_secs().max(1)),
                })
                .collect::<Vec<_>>();
            (state.wal.path().to_path_buf(), live)
        };

        let written = Wal::compact(&path, &live).await?;

        let mut state = self.state.lock().await;
        state.wal.reopen().await?;
        state.stats.log_size = written;
        state.stats.last_compaction = Some(SystemTime::now());
        tracing::info!(records = written, "compaction complete");
        Ok(())
    }
}

fn non_default(namespace: &str) -> Option<String> {
    if namespace.is_empty() {
        None
    } else {
        Some(namespace.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_store(capacity: usize) -> (Arc<Store>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::default();
        config.capacity = capacity;
        config.log_file = dir.path().join("wal.log");
        let store = Store::open(config).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn basic_roundtrip() {
        let (store, _dir) = open_store(100).await;
        store.set("", "a", "1".into(), None).await.unwrap();
        assert_eq!(store.get("", "a").await.unwrap(), "1");
        assert!(store.delete("", "a").await.unwrap());
        assert!(matches!(store.get("", "a").await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn ttl_expiration_counts_as_miss() {
        let (store, _dir) = open_store(100).await;
        store.set("", "k", "v".into(), Some(1)).await.unwrap();
        assert_eq!(store.get("", "k").await.unwrap(), "v");

        // Simulate the deadline passing without sleeping a full second:
        // re-set with an already-past deadline via direct LRU access is
        // not exposed, so exercise the real sweeper codepath instead.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let removed = store.sweep_expired().await.unwrap();
        // Not yet expired at 10ms against a 1s TTL; sweep is a no-op.
        assert_eq!(removed, 0);
        assert_eq!(store.get("", "k").await.unwrap(), "v");
    }

    #[tokio::test]
    async fn eviction_under_capacity() {
        let (store, _dir) = open_store(2).await;
        store.set("d", "a", "1".into(), None).await.unwrap();
        store.set("d", "b", "2".into(), None).await.unwrap();
        store.get("d", "a").await.unwrap();
        store.set("d", "c", "3".into(), None).await.unwrap();

        assert!(matches!(store.get("d", "b").await, Err(Error::NotFound)));
        assert_eq!(store.get("d", "a").await.unwrap(), "1");
        assert_eq!(store.get("d", "c").await.unwrap(), "3");
        assert_eq!(store.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn namespace_isolation() {
        let (store, _dir) = open_store(100).await;
        store.set("t1", "k", "A".into(), None).await.unwrap();
        store.set("t2", "k", "B".into(), None).await.unwrap();
        assert_eq!(store.get("t1", "k").await.unwrap(), "A");
        assert_eq!(store.get("t2", "k").await.unwrap(), "B");
        assert_eq!(store.namespace_size("t1").await, 1);
        let namespaces = store.list_namespaces().await;
        assert!(namespaces.contains(&"t1".to_string()));
        assert!(namespaces.contains(&"t2".to_string()));
    }

    #[tokio::test]
    async fn stats_reports_namespaces_that_were_only_ever_written() {
        let (store, _dir) = open_store(100).await;
        store.set("t1", "k", "v".into(), None).await.unwrap();

        let snapshot = store.stats().await;
        let t1 = snapshot.namespaces.get("t1").expect("t1 present in stats");
        assert_eq!(t1.total_keys, 1);
        assert_eq!(t1.cache_hits, 0);
        assert_eq!(t1.cache_misses, 0);
    }

    #[tokio::test]
    async fn recovery_replays_set_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("wal.log");

        {
            let mut config = StoreConfig::default();
            config.log_file = log_file.clone();
            let store = Store::open(config).await.unwrap();
            store.set("", "x", "1".into(), None).await.unwrap();
            store.set("", "y", "2".into(), None).await.unwrap();
            store.delete("", "x").await.unwrap();
        }

        let mut config = StoreConfig::default();
        config.log_file = log_file;
        let store = Store::open(config).await.unwrap();
        assert!(matches!(store.get("", "x").await, Err(Error::NotFound)));
        assert_eq!(store.get("", "y").await.unwrap(), "2");
        assert_eq!(store.stats().await.total_keys, 1);
    }

    #[tokio::test]
    async fn recovery_ignores_eviction_until_replay_completes() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("wal.log");

        {
            let mut config = StoreConfig::default();
            config.capacity = 2;
            config.log_file = log_file.clone();
            let store = Store::open(config).await.unwrap();
            store.set("", "a", "1".into(), None).await.unwrap();
            store.set("", "b", "2".into(), None).await.unwrap();
            store.delete("", "b").await.unwrap();
        }

        // Capacity 1 at reopen: a naive replay that evicts as it goes
        // would lose "a" the moment "b" is inserted, then delete "b",
        // ending with an empty map. The spec-mandated trim-after-replay
        // must instead see {a, b} transiently, then {a} after the
        // delete, which already fits capacity 1.
        let mut config = StoreConfig::default();
        config.capacity = 1;
        config.log_file = log_file;
        let store = Store::open(config).await.unwrap();
        assert_eq!(store.get("", "a").await.unwrap(), "1");
        assert_eq!(store.stats().await.total_keys, 1);
    }

    #[tokio::test]
    async fn compaction_preserves_semantics_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("wal.log");

        let mut config = StoreConfig::default();
        config.log_file = log_file.clone();
        let store = Store::open(config).await.unwrap();
        store.set("", "x", "1".into(), None).await.unwrap();
        store.set("", "y", "2".into(), None).await.unwrap();
        store.delete("", "x").await.unwrap();

        store.compact_now().await.unwrap();
        let records_once = wal::Wal::read_all(&log_file).await.unwrap();
        assert_eq!(records_once.len(), 1);

        store.compact_now().await.unwrap();
        let records_twice = wal::Wal::read_all(&log_file).await.unwrap();
        assert_eq!(records_twice.len(), 1);

        assert_eq!(store.get("", "y").await.unwrap(), "2");
        assert!(matches!(store.get("", "x").await, Err(Error::NotFound)));

        // A live append after compaction must land in the renamed file,
        // not an orphaned handle to the old inode.
        store.set("", "z", "3".into(), None).await.unwrap();
        let records_after_append = wal::Wal::read_all(&log_file).await.unwrap();
        assert_eq!(records_after_append.len(), 2);
    }

    #[tokio::test]
    async fn delete_absent_key_still_appends_record_but_not_log_size() {
        let (store, _dir) = open_store(100).await;
        assert!(!store.delete("", "missing").await.unwrap());
        let snapshot = store.stats().await;
        assert_eq!(snapshot.log_size, 1);
        let path = store.state.lock().await.wal.path().to_path_buf();
        let records = wal::Wal::read_all(&path).await.unwrap();
        assert_eq!(records.len(), 1);
    }
}
