//! Snapshot sources for the tailer

use std::path::{Path, PathBuf};
use tracing::trace;

/// Trait for the storage a live replay is read from
///
/// Each call to [`snapshot`](SnapshotSource::snapshot) re-reads the whole backing store.
/// The tailer keeps its own cursor into the logical stream and seeks the fresh snapshot to
/// it, so a source only has to guarantee that bytes already returned are never rewritten.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + 'static {
    /// Read everything written so far.
    async fn snapshot(&mut self) -> std::io::Result<Vec<u8>>;

    /// Location used in logs and error context.
    fn describe(&self) -> PathBuf;
}

/// Source backed by a file that another process is appending to
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for FileSource {
    async fn snapshot(&mut self) -> std::io::Result<Vec<u8>> {
        // The game creates the file some time after the session is started
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        trace!("Read {} bytes from {}", data.len(), self.path.display());
        Ok(data)
    }

    fn describe(&self) -> PathBuf {
        self.path.clone()
    }
}
