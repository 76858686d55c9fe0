//! # nskv-core
//!
//! The storage engine for a namespaced, TTL-aware, LRU-bounded
//! key-value store with write-ahead-log persistence. `nskv-server` and
//! `nskv-client` sit on top of this crate; it has no knowledge of HTTP.

pub mod background;
pub mod lru;
pub mod stats;
pub mod store;
pub mod wal;

pub use background::BackgroundTasks;
pub use stats::{NamespaceSnapshot, StatsSnapshot};
pub use store::Store;
