//! Blob storage for uploaded sticker bytes.
//!
//! File contents live outside the relational store, in a hierarchical blob
//! store addressed by relative paths (`stickers/{category_id}/{file}`). The
//! [`BlobStore`] trait abstracts the backend; [`LocalBlobStore`] is the
//! filesystem implementation rooted at a configured directory.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Errors surfaced by blob store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Blob absent at the given path
    #[error("Blob not found")]
    NotFound,

    /// Path escapes the storage root or is otherwise malformed
    #[error("Invalid blob path: {path}")]
    InvalidPath { path: String },

    /// I/O failure while persisting a blob
    #[error("Failed to write blob")]
    WriteFailure(#[source] std::io::Error),

    /// Any other I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for blob storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Ensure a folder exists, creating it (and parents) if necessary.
    ///
    /// Idempotent: concurrent first-creation is tolerated, the loser of the
    /// race sees the existing folder and treats that as success.
    async fn ensure_folder(&self, folder: &str) -> Result<()>;

    /// Write blob content at the given path
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Retrieve blob content from the given path
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete the blob at the given path
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check whether a blob exists at the given path
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Local filesystem storage backend - stores blobs under a root directory
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a relative blob path against the root.
    ///
    /// Rejects absolute paths and any `..` component - stored paths are
    /// server-generated, so anything else indicates a corrupted record or a
    /// caller bug, not a legitimate blob.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StorageError::InvalidPath { path: path.to_string() });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn ensure_folder(&self, folder: &str) -> Result<()> {
        let full_path = self.resolve(folder)?;
        // create_dir_all succeeds if the directory already exists, which also
        // absorbs the race where two uploads create the folder concurrently
        fs::create_dir_all(&full_path).await?;
        Ok(())
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full_path = self.resolve(path)?;

        let mut file = fs::File::create(&full_path).await.map_err(StorageError::WriteFailure)?;
        file.write_all(bytes).await.map_err(StorageError::WriteFailure)?;
        file.sync_all().await.map_err(StorageError::WriteFailure)?;

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path)?;

        if !full_path.exists() {
            return Err(StorageError::NotFound);
        }

        let content = fs::read(&full_path).await?;
        Ok(content)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.resolve(path)?;

        if !full_path.exists() {
            return Err(StorageError::NotFound);
        }

        fs::remove_file(&full_path).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.resolve(path)?;
        Ok(full_path.exists())
    }
}

/// Create the blob store backend, ensuring the root directory exists
pub async fn create_blob_store(root: &Path) -> anyhow::Result<std::sync::Arc<dyn BlobStore>> {
    tracing::info!("Creating local blob store (root: {:?})", root);
    fs::create_dir_all(root)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create blob store root {:?}: {}", root, e))?;
    Ok(std::sync::Arc::new(LocalBlobStore::new(root.to_path_buf())))
}
