//! Image directory backing the catalog.
//!
//! Every uploaded photo is stored as a flat file directly under the
//! configured directory, keyed by the generated filename. Deletes are
//! idempotent per file so concurrent cleanups of the same entry are benign.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub(crate) struct ImageStorage {
    base_dir: Arc<PathBuf>,
}

impl ImageStorage {
    pub(crate) fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Arc::new(base_dir.into()),
        }
    }

    /// Prepare the directory at startup: create it when missing, reject a
    /// path that points at a regular file, and resolve it to an absolute path.
    pub(crate) fn open(base_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let path = base_dir.into();

        if path.exists() {
            if !path.is_dir() {
                return Err(io::Error::other(format!(
                    "IMAGE_DIR is not a directory: {}",
                    path.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&path).map_err(|error| {
                io::Error::other(format!(
                    "failed to create IMAGE_DIR {}: {error}",
                    path.display()
                ))
            })?;
        }

        match path.canonicalize() {
            Ok(resolved) => Ok(Self::new(resolved)),
            Err(_) => Ok(Self::new(path)),
        }
    }

    pub(crate) fn base_dir(&self) -> &Path {
        self.base_dir.as_path()
    }

    pub(crate) fn path_for(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    pub(crate) async fn ensure_directory(&self) -> io::Result<()> {
        match tokio::fs::metadata(self.base_dir()).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(io::Error::other(format!(
                "image directory is not a directory: {}",
                self.base_dir.display()
            ))),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tokio::fs::create_dir_all(self.base_dir()).await
            }
            Err(error) => Err(error),
        }
    }

    /// Write `bytes` under a new `file_name`. An existing file is never
    /// touched: the call fails with `AlreadyExists` instead.
    pub(crate) async fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.ensure_directory().await?;
        let path = self.path_for(file_name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let written = match file.write_all(bytes).await {
            Ok(()) => file.flush().await,
            Err(error) => Err(error),
        };
        if let Err(error) = written {
            drop(file);
            // the file is ours, a partial one must not stay behind
            let _ = tokio::fs::remove_file(&path).await;
            return Err(error);
        }

        Ok(path)
    }

    pub(crate) async fn exists(&self, file_name: &str) -> io::Result<bool> {
        tokio::fs::try_exists(self.path_for(file_name)).await
    }

    /// Returns `true` when a file was removed and `false` when it was already gone.
    pub(crate) async fn delete_if_exists(&self, file_name: &str) -> io::Result<bool> {
        if !self.exists(file_name).await? {
            return Ok(false);
        }

        match tokio::fs::remove_file(self.path_for(file_name)).await {
            Ok(()) => Ok(true),
            // lost a race with another delete of the same entry
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error),
        }
    }
}
