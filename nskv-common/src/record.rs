//! # Write-Ahead Log Record
//!
//! One line of the WAL is one self-describing record (spec §4.2). Fields
//! are independently parsable; a malformed line is skipped during
//! recovery rather than aborting the whole replay.

use serde::{Deserialize, Serialize};

/// The mutating action a WAL record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Set,
    Delete,
}

/// A single append-only log line.
///
/// `namespace` is omitted on the wire when empty/default so the common
/// case stays compact; `value`/`ttl` only ever appear on `Set` records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalRecord {
    /// Seconds since the Unix epoch. Diagnostics only — recovery replays
    /// in file order, not by this timestamp.
    pub timestamp: f64,
    pub action: Action,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl WalRecord {
    /// Namespace as stored in the qualified key space (empty default).
    pub fn namespace_or_default(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }
}
