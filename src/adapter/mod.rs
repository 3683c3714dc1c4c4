//! Collaborators around the rate engine.
//!
//! [`SnapshotSource`] implementations gather raw payloads: [`http`] over the
//! network, [`directory`] from JSON files on disk.

pub mod directory;
pub mod http;

pub use directory::DirectorySnapshotSource;
pub use http::HttpSnapshotSource;

use async_trait::async_trait;

use crate::engine::Snapshot;
use crate::error::Result;

/// Something that can produce a fresh snapshot of every rate feed.
///
/// Sources that fail individually are left out of the snapshot; an error is
/// returned only when nothing at all could be gathered.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Gather one snapshot.
    async fn fetch(&self) -> Result<Snapshot>;
}
