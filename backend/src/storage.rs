use async_trait::async_trait;
use axum::body::{Body, Bytes};
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::models::ImageMetadata;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The descriptor points at a file that no longer exists.
    #[error("blob not found at {0}")]
    Missing(String),

    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// 1. BlobStore Contract
/// BlobStore
///
/// Opaque storage for uploaded photo files. Handlers only ever see the returned
/// `ImageMetadata`, which is persisted on the photo row and handed back to `open`.
/// The real implementation writes to the local filesystem; tests swap in the in-memory
/// `MockStorageService`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` and returns the descriptor that locates them.
    async fn save(
        &self,
        original_name: &str,
        mime_type: &str,
        bytes: Bytes,
    ) -> StorageResult<ImageMetadata>;

    /// Streams the stored file back.
    async fn open(&self, metadata: &ImageMetadata) -> StorageResult<Body>;

    /// Removes a stored file. Removing one that is already gone is not an error.
    async fn delete(&self, metadata: &ImageMetadata) -> StorageResult<()>;
}

// 2. The Real Implementation (local disk)
/// LocalBlobStore
///
/// Writes every upload to `<root>/<uuid>`. The generated name never contains client
/// input, so an uploaded file name cannot steer the write outside `root`.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the upload directory if it does not exist yet. Safe to call at startup.
    pub async fn ensure_root_exists(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(
        &self,
        original_name: &str,
        mime_type: &str,
        bytes: Bytes,
    ) -> StorageResult<ImageMetadata> {
        self.ensure_root_exists().await?;

        let path = self.root.join(Uuid::new_v4().simple().to_string());
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!("stored {} bytes at {}", bytes.len(), path.display());

        Ok(ImageMetadata {
            path: path.to_string_lossy().into_owned(),
            original_name: sanitize_file_name(original_name),
            mime_type: mime_type.to_string(),
            size: bytes.len() as i64,
        })
    }

    /// open
    ///
    /// Streams the file in chunks through `ReaderStream` instead of buffering it whole.
    async fn open(&self, metadata: &ImageMetadata) -> StorageResult<Body> {
        let file = tokio::fs::File::open(&metadata.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::Missing(metadata.path.clone()),
                _ => StorageError::Io(e),
            })?;
        Ok(Body::from_stream(ReaderStream::new(file)))
    }

    async fn delete(&self, metadata: &ImageMetadata) -> StorageResult<()> {
        match tokio::fs::remove_file(&metadata.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(StorageError::Io(e)),
            _ => Ok(()),
        }
    }
}

/// sanitize_file_name
///
/// Reduces a client-supplied file name to its final path segment, dropping directory
/// navigation components (`..`, `.`) and both separator styles.
pub fn sanitize_file_name(name: &str) -> String {
    name.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .last()
        .unwrap_or("upload")
        .to_string()
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// Keeps blobs in memory, keyed by a synthetic `mock://` path. Lets handler tests
/// exercise upload and download without touching the disk.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    blobs: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MockStorageService {
    async fn save(
        &self,
        original_name: &str,
        mime_type: &str,
        bytes: Bytes,
    ) -> StorageResult<ImageMetadata> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }

        let original_name = sanitize_file_name(original_name);
        let path = format!("mock://{}/{}", Uuid::new_v4().simple(), original_name);
        let size = bytes.len() as i64;

        self.blobs
            .lock()
            .map_err(|_| StorageError::Unavailable("mock store poisoned".to_string()))?
            .insert(path.clone(), bytes);

        Ok(ImageMetadata {
            path,
            original_name,
            mime_type: mime_type.to_string(),
            size,
        })
    }

    async fn open(&self, metadata: &ImageMetadata) -> StorageResult<Body> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }

        let bytes = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Unavailable("mock store poisoned".to_string()))?
            .get(&metadata.path)
            .cloned()
            .ok_or_else(|| StorageError::Missing(metadata.path.clone()))?;
        Ok(Body::from(bytes))
    }

    async fn delete(&self, metadata: &ImageMetadata) -> StorageResult<()> {
        self.blobs
            .lock()
            .map_err(|_| StorageError::Unavailable("mock store poisoned".to_string()))?
            .remove(&metadata.path);
        Ok(())
    }
}

/// StorageState
///
/// The concrete type used to share the blob store across the application state.
pub type StorageState = Arc<dyn BlobStore>;
