//! Content-addressed binary asset storage.
//!
//! Assets are keyed by the SHA-256 of their bytes, so uploading the same
//! image twice yields the same [`AssetId`]. Projects only hold references.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CoreError, CoreResult};

/// Opaque identifier of a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Content address for a byte slice.
    #[must_use]
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can name a stored blob (lowercase hex digest).
    fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Metadata about a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Asset identifier.
    pub asset_id: AssetId,
    /// MIME type supplied at upload.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// Binary asset storage.
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Fetch an asset's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotFound`] for unknown ids and
    /// [`CoreError::Store`] on I/O failure.
    fn get(&self, id: &AssetId) -> CoreResult<Vec<u8>>;

    /// Store bytes and return their identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on I/O failure.
    fn put(&self, bytes: &[u8], content_type: &str) -> CoreResult<AssetId>;

    /// Remove an asset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotFound`] for unknown ids.
    fn delete(&self, id: &AssetId) -> CoreResult<()>;

    /// List stored assets.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on I/O failure.
    fn list(&self) -> CoreResult<Vec<AssetInfo>>;
}

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<AssetId, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, id: &AssetId) -> CoreResult<Vec<u8>> {
        let blobs = self
            .blobs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        blobs
            .get(id)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| CoreError::AssetNotFound(id.to_string()))
    }

    fn put(&self, bytes: &[u8], content_type: &str) -> CoreResult<AssetId> {
        let id = AssetId::for_bytes(bytes);
        let mut blobs = self
            .blobs
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        blobs
            .entry(id.clone())
            .or_insert_with(|| (bytes.to_vec(), content_type.to_string()));
        Ok(id)
    }

    fn delete(&self, id: &AssetId) -> CoreResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        blobs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::AssetNotFound(id.to_string()))
    }

    fn list(&self) -> CoreResult<Vec<AssetInfo>> {
        let blobs = self
            .blobs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut infos: Vec<_> = blobs
            .iter()
            .map(|(id, (bytes, content_type))| AssetInfo {
                asset_id: id.clone(),
                content_type: content_type.clone(),
                size: bytes.len() as u64,
            })
            .collect();
        infos.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        Ok(infos)
    }
}

/// Filesystem blob store: `<dir>/<id>` holds the bytes, `<dir>/<id>.json`
/// the [`AssetInfo`].
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn blob_path(&self, id: &AssetId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    fn info_path(&self, id: &AssetId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, id: &AssetId) -> CoreResult<Vec<u8>> {
        if !id.is_well_formed() {
            return Err(CoreError::AssetNotFound(id.to_string()));
        }
        match std::fs::read(self.blob_path(id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::AssetNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, bytes: &[u8], content_type: &str) -> CoreResult<AssetId> {
        let id = AssetId::for_bytes(bytes);
        let path = self.blob_path(&id);
        if !path.exists() {
            std::fs::write(&path, bytes)?;
            let info = AssetInfo {
                asset_id: id.clone(),
                content_type: content_type.to_string(),
                size: bytes.len() as u64,
            };
            std::fs::write(self.info_path(&id), serde_json::to_vec_pretty(&info)?)?;
            tracing::debug!("Stored asset {id} ({} bytes)", bytes.len());
        }
        Ok(id)
    }

    fn delete(&self, id: &AssetId) -> CoreResult<()> {
        if !id.is_well_formed() || !self.blob_path(id).exists() {
            return Err(CoreError::AssetNotFound(id.to_string()));
        }
        std::fs::remove_file(self.blob_path(id))?;
        if let Err(e) = std::fs::remove_file(self.info_path(id)) {
            tracing::warn!("Failed to remove asset info for {id}: {e}");
        }
        Ok(())
    }

    fn list(&self) -> CoreResult<Vec<AssetInfo>> {
        let mut infos = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let contents = std::fs::read(&path)?;
                infos.push(serde_json::from_slice::<AssetInfo>(&contents)?);
            }
        }
        infos.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        Ok(infos)
    }
}
