//! # Store Configuration
//!
//! The five startup-time constants from spec §6, all fixed for the
//! lifetime of the process.

use std::path::PathBuf;
use std::time::Duration;

/// Default LRU capacity (spec §6).
pub const DEFAULT_CAPACITY: usize = 100;
/// Default WAL path (spec §6).
pub const DEFAULT_LOG_FILE: &str = "data/wal.log";
/// Default compactor tick interval in seconds (spec §4.4).
pub const DEFAULT_COMPACTION_INTERVAL_SECS: u64 = 300;
/// Default compaction threshold in WAL records (spec §4.2).
pub const DEFAULT_MAX_LOG_SIZE: u64 = 1000;
/// Default sweeper tick interval in seconds (spec §4.4).
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of live entries the LRU map holds (C).
    pub capacity: usize,
    /// Path to the write-ahead log file.
    pub log_file: PathBuf,
    /// How often the compactor task wakes to check `log_size`.
    pub compaction_interval: Duration,
    /// `log_size` threshold that triggers a compaction.
    pub max_log_size: u64,
    /// How often the TTL sweeper wakes to collect expired keys.
    pub cleanup_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            capacity: DEFAULT_CAPACITY,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            compaction_interval: Duration::from_secs(DEFAULT_COMPACTION_INTERVAL_SECS),
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}
