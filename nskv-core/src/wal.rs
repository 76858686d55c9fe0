//! # Write-Ahead Log (C2)
//!
//! A single newline-delimited JSON file at a configured path. Each line
//! is one self-describing record (spec §4.2). Record order is append
//! order; recovery replays in that order, not by the record's
//! `timestamp` field.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use nskv_common::{Action, Error, QualifiedKey, Result, WalRecord};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A live entry as captured for compaction: qualified key, value, and
/// remaining TTL in whole seconds (`None` means no expiration).
pub struct LiveEntry {
    pub key: QualifiedKey,
    pub value: String,
    pub remaining_ttl_secs: Option<u64>,
}

/// The append-only log file and its handle.
pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Opens (creating if necessary) the log at `path` in append mode.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Wal { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record and flushes it to the OS. Group fsync is not
    /// required (spec §4.2) — a crash may still lose the trailing
    /// partially-written record.
    pub async fn append(&mut self, record: &WalRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| Error::Internal(format!("wal record encode: {e}")))?;
        line.push('\n');
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        Ok(())
    }

    /// Reads every record currently on disk, in append order. Malformed
    /// lines are skipped and logged rather than aborting recovery.
    pub async fn read_all(path: &Path) -> Result<Vec<WalRecord>> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WalRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(line = lineno + 1, %err, "skipping malformed WAL record");
                }
            }
        }
        Ok(records)
    }

    /// Reopens the append handle at `self.path`. Must be called after
    /// [`Wal::compact`] replaces the file out from under an already-open
    /// handle — on a rename, a previously opened append handle keeps
    /// writing to the unlinked old inode instead of the file now at the
    /// path, silently dropping every record written after compaction.
    pub async fn reopen(&mut self) -> Result<()> {
        self.file = OpenOptions::new().append(true).open(&self.path).await?;
        Ok(())
    }

    /// Rewrites the log to contain exactly one SET per live entry and no
    /// DELETE records (spec §4.2). Writes to a temp file adjacent to the
    /// log, then atomically renames over it. Returns the number of
    /// records written.
    pub async fn compact(path: &Path, live: &[LiveEntry]) -> Result<u64> {
        let tmp_path = temp_path(path);
        let mut buf = String::new();
        let now = unix_timestamp();
        for entry in live {
            let record = WalRecord {
                timestamp: now,
                action: Action::Set,
                key: entry.key.key.clone(),
                namespace: non_default_namespace(&entry.key.namespace),
                value: Some(entry.value.clone()),
                ttl: entry.remaining_ttl_secs,
            };
            buf.push_str(
                &serde_json::to_string(&record)
                    .map_err(|e| Error::Internal(format!("wal record encode: {e}")))?,
            );
            buf.push('\n');
        }

        fs::write(&tmp_path, buf.as_bytes()).await?;
        fs::rename(&tmp_path, path).await?;
        Ok(live.len() as u64)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".compact.tmp");
    PathBuf::from(tmp)
}

fn non_default_namespace(namespace: &str) -> Option<String> {
    if namespace.is_empty() {
        None
    } else {
        Some(namespace.to_string())
    }
}

pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nskv_common::QualifiedKey;

    #[tokio::test]
    async fn append_then_read_all_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let mut wal = Wal::open(&path).await.unwrap();

        wal.append(&WalRecord {
            timestamp: unix_timestamp(),
            action: Action::Set,
            key: "a".into(),
            namespace: None,
            value: Some("1".into()),
            ttl: None,
        })
        .await
        .unwrap();
        wal.append(&WalRecord {
            timestamp: unix_timestamp(),
            action: Action::Delete,
            key: "a".into(),
            namespace: None,
            value: None,
            ttl: None,
        })
        .await
        .unwrap();

        let records = Wal::read_all(&path).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, Action::Set);
        assert_eq!(records[1].action, Action::Delete);
    }

    #[tokio::test]
    async fn read_all_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        fs::write(&path, b"not json\n{\"timestamp\":1.0,\"action\":\"SET\",\"key\":\"a\",\"value\":\"1\"}\n")
            .await
            .unwrap();

        let records = Wal::read_all(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "a");
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.log");
        let records = Wal::read_all(&path).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn compact_writes_one_set_per_live_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        Wal::open(&path).await.unwrap();

        let live = vec![LiveEntry {
            key: QualifiedKey::new("", "y"),
            value: "2".into(),
            remaining_ttl_secs: None,
        }];
        let written = Wal::compact(&path, &live).await.unwrap();
        assert_eq!(written, 1);

        let records = Wal::read_all(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, Action::Set);
        assert_eq!(records[0].key, "y");
    }
}
