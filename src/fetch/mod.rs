//! Remote file retrieval.
//!
//! The file host is an external HTTP API addressed by opaque file
//! identifiers; the service only ever needs a read-only, streamed download.

mod drive;

pub use drive::DriveFetcher;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for fetching remote files into the local filesystem.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Download the object named by `file_id` to `dest`.
    ///
    /// The stream must be fully drained before this returns; a mid-stream
    /// error is propagated rather than leaving a silently truncated file.
    /// Returns the number of bytes written.
    async fn fetch(&self, file_id: &str, dest: &Path) -> Result<u64>;
}
