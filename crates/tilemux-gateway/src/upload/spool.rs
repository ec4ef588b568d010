//! Temporary on-disk copy of an inbound request body.
//!
//! A [`SpoolFile`] is owned by exactly one request.  The file is deleted
//! when the value is dropped, which covers every exit path of the pipeline:
//! success, validation failure, no node available, decode error, and the
//! handler future being dropped because the client went away.

use crate::error::{GatewayError, GatewayResult};
use axum::body::Body;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// File-name prefix of every spool file; used by the startup sweep.
pub const SPOOL_PREFIX: &str = "upload-";

/// A fully written spool file, removed on drop.
#[derive(Debug)]
pub struct SpoolFile {
    path: PathBuf,
    len: u64,
}

impl SpoolFile {
    /// Write the whole of `body` into a fresh file under `dir`.
    ///
    /// The file is created with `O_EXCL` semantics; if writing fails part
    /// way the partially written file is removed before the error returns.
    pub async fn write(dir: &Path, body: Body) -> GatewayResult<Self> {
        let (std_file, path) = tempfile::Builder::new()
            .prefix(SPOOL_PREFIX)
            .tempfile_in(dir)?
            .keep()
            .map_err(|e| GatewayError::Spool(e.error.to_string()))?;
        let mut spool = SpoolFile { path, len: 0 };
        let mut file = File::from_std(std_file);

        let mut stream = body.into_data_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| GatewayError::MalformedUpload(format!("upload interrupted: {e}")))?;
            file.write_all(&chunk).await?;
            spool.len += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(path = %spool.path.display(), bytes = spool.len, "upload spooled");
        Ok(spool)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the spooled body in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reopen the spool from the beginning as a byte stream.
    pub async fn reader(&self) -> GatewayResult<ReaderStream<File>> {
        Ok(ReaderStream::new(File::open(&self.path).await?))
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "spool file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove spool file"
            ),
        }
    }
}

/// Create `dir` if needed and delete spool files left behind by a previous
/// process.  Returns the number of files removed.
pub async fn sweep_stale(dir: &Path) -> std::io::Result<usize> {
    tokio::fs::create_dir_all(dir).await?;
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let is_spool = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(SPOOL_PREFIX));
        if !is_spool || !entry.file_type().await?.is_file() {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "failed to sweep spool file"),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn spool_holds_full_body_and_is_removed_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let spool = SpoolFile::write(dir.path(), Body::from("hello spool"))
            .await
            .unwrap();
        let path = spool.path().to_path_buf();
        assert_eq!(spool.len(), 11);
        assert!(path.exists());

        let bytes: Vec<u8> = spool
            .reader()
            .await
            .unwrap()
            .map_ok(|b| b.to_vec())
            .try_concat()
            .await
            .unwrap();
        assert_eq!(bytes, b"hello spool");

        drop(spool);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn body_error_removes_partial_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
            Ok("partial"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = Body::from_stream(futures::stream::iter(chunks));

        let err = SpoolFile::write(dir.path(), body).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedUpload(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn sweep_removes_only_spool_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("upload-stale1"), b"x").unwrap();
        std::fs::write(dir.path().join("upload-stale2"), b"x").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();

        assert_eq!(sweep_stale(dir.path()).await.unwrap(), 2);
        assert!(dir.path().join("keep.txt").exists());
    }

    #[tokio::test]
    async fn sweep_creates_missing_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("spool");
        assert_eq!(sweep_stale(&nested).await.unwrap(), 0);
        assert!(nested.is_dir());
    }
}
