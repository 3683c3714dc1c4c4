//! Snapshots replayed from JSON files on disk.
//!
//! A snapshot directory holds up to four files, one per feed, each containing
//! the raw response body exactly as the endpoint returned it:
//!
//! | File               | Feed                      |
//! |--------------------|---------------------------|
//! | `hyperliquid.json` | predicted fundings        |
//! | `drift.json`       | perp markets              |
//! | `rates.json`       | current lending rates     |
//! | `staking.json`     | current staking rates     |

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::SnapshotSource;
use crate::engine::Snapshot;
use crate::error::{ConfigError, Error, Result};
use crate::source::SourcePayload;

const FILES: [(&str, fn(Value) -> SourcePayload); 4] = [
    ("hyperliquid.json", SourcePayload::Hyperliquid),
    ("drift.json", SourcePayload::Drift),
    ("rates.json", SourcePayload::Lending),
    ("staking.json", SourcePayload::Staking),
];

/// Reads a snapshot directory.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotSource {
    dir: PathBuf,
}

impl DirectorySnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read(&self, file: &str) -> Result<Option<Value>> {
        let path = self.dir.join(file);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Snapshot file absent");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl SnapshotSource for DirectorySnapshotSource {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn fetch(&self) -> Result<Snapshot> {
        if !tokio::fs::metadata(&self.dir).await.is_ok_and(|meta| meta.is_dir()) {
            return Err(ConfigError::InvalidValue {
                field: "snapshot_dir",
                reason: format!("{} is not a directory", self.dir.display()),
            }
            .into());
        }

        let mut payloads = Vec::with_capacity(FILES.len());
        for (file, wrap) in FILES {
            match self.read(file).await {
                Ok(Some(value)) => payloads.push(wrap(value)),
                Ok(None) => {}
                Err(err) => warn!(file, error = %err, "Snapshot file unreadable, continuing without it"),
            }
        }

        if payloads.is_empty() {
            return Err(Error::NoData);
        }
        Ok(Snapshot::new(payloads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn reads_present_files_and_skips_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("drift.json"), r#"{"data": []}"#).unwrap();
        fs::write(dir.path().join("staking.json"), "not json").unwrap();

        let snapshot = DirectorySnapshotSource::new(dir.path()).fetch().await.unwrap();

        assert_eq!(snapshot.payloads().len(), 1);
        assert!(matches!(snapshot.payloads()[0], SourcePayload::Drift(_)));
        assert!(snapshot.fetched_at().is_none());
    }

    #[tokio::test]
    async fn empty_directory_has_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let result = DirectorySnapshotSource::new(dir.path()).fetch().await;
        assert!(matches!(result, Err(Error::NoData)));
    }

    #[tokio::test]
    async fn missing_directory_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DirectorySnapshotSource::new(dir.path().join("nope")).fetch().await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
