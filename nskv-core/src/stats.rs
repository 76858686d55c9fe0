//! # Statistics (part of C3)
//!
//! Global and per-namespace counters (spec §3). `total_keys` is always
//! derived from the LRU map's live size, never from a running counter,
//! so it can't drift from reality.

use std::collections::HashMap;
use std::time::SystemTime;

/// Per-namespace hit/miss counters. `total_keys` is computed on demand
/// from the LRU map, not stored here.
#[derive(Debug, Clone, Default)]
pub struct NamespaceCounters {
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Mutable counter block guarded by the same mutex as the LRU map and WAL.
#[derive(Debug, Clone)]
pub struct Stats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub log_size: u64,
    pub last_compaction: Option<SystemTime>,
    pub start_time: SystemTime,
    /// Created lazily on first reference; never removed while the
    /// process lives, even once a namespace's last key is gone (spec §3).
    pub namespaces: HashMap<String, NamespaceCounters>,
}

impl Stats {
    pub fn new() -> Self {
        Stats {
            cache_hits: 0,
            cache_misses: 0,
            evictions: 0,
            log_size: 0,
            last_compaction: None,
            start_time: SystemTime::now(),
            namespaces: HashMap::new(),
        }
    }

    pub fn record_hit(&mut self, namespace: &str) {
        self.cache_hits += 1;
        self.namespace_entry(namespace).cache_hits += 1;
    }

    pub fn record_miss(&mut self, namespace: &str) {
        self.cache_misses += 1;
        self.namespace_entry(namespace).cache_misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    fn namespace_entry(&mut self, namespace: &str) -> &mut NamespaceCounters {
        self.namespaces
            .entry(namespace.to_string())
            .or_insert_with(NamespaceCounters::default)
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats::new()
    }
}

/// A point-in-time, read-only copy of the statistics, with `total_keys`
/// filled in by the caller (who has access to the LRU map).
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub total_keys: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub log_size: u64,
    pub last_compaction: Option<SystemTime>,
    pub uptime: std::time::Duration,
    pub namespaces: HashMap<String, NamespaceSnapshot>,
}

#[derive(Debug, Clone)]
pub struct NamespaceSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_keys: usize,
}
