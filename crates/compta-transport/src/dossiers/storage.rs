use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::domain::BlobHandle;
use super::repository::{
    BlobError, BlobStore, PersistenceAdapter, PersistenceError, RegistrySnapshot,
};

/// Single JSON document holding both registries.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    // Move an unreadable snapshot aside so the next save does not overwrite it.
    fn quarantine(&self) {
        let aside = self.path.with_extension("json.corrupt");
        match fs::rename(&self.path, &aside) {
            Ok(()) => warn!(path = %aside.display(), "moved unreadable snapshot aside"),
            Err(err) => warn!(error = %err, "could not move unreadable snapshot aside"),
        }
    }
}

impl PersistenceAdapter for JsonFilePersistence {
    fn load(&self) -> Result<RegistrySnapshot, PersistenceError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot yet, starting empty");
                return Ok(RegistrySnapshot::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_slice(&raw).map_err(|source| {
            self.quarantine();
            PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let encoded = serde_json::to_vec_pretty(snapshot).map_err(PersistenceError::Encode)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))
    }
}

/// Snapshot kept in memory. Clones share the same storage, so a test can reopen a service
/// over what a previous one saved.
#[derive(Debug, Default, Clone)]
pub struct MemoryPersistence {
    snapshot: Arc<Mutex<RegistrySnapshot>>,
}

impl MemoryPersistence {
    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot
            .lock()
            .expect("snapshot mutex poisoned")
            .clone()
    }
}

impl PersistenceAdapter for MemoryPersistence {
    fn load(&self) -> Result<RegistrySnapshot, PersistenceError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| PersistenceError::Unavailable("snapshot mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), PersistenceError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| PersistenceError::Unavailable("snapshot mutex poisoned".to_string()))?;
        *guard = snapshot.clone();
        Ok(())
    }
}

fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn is_content_hash(raw: &str) -> bool {
    raw.len() == 64 && raw.bytes().all(|byte| byte.is_ascii_hexdigit())
}

/// Content-addressed blobs on disk: `<root>/<first two hex chars>/<sha256>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.root.join(&hash[..2]).join(hash)
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, bytes: &[u8]) -> Result<BlobHandle, BlobError> {
        let hash = content_hash(bytes);
        let path = self.blob_path(&hash);
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let staging = path.with_extension("tmp");
            fs::write(&staging, bytes)?;
            fs::rename(&staging, &path)?;
        }
        Ok(BlobHandle(hash))
    }

    fn fetch(&self, handle: &BlobHandle) -> Result<Vec<u8>, BlobError> {
        if !is_content_hash(&handle.0) {
            return Err(BlobError::NotFound(handle.clone()));
        }

        let bytes = match fs::read(self.blob_path(&handle.0)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(BlobError::NotFound(handle.clone()))
            }
            Err(err) => return Err(err.into()),
        };

        if content_hash(&bytes) != handle.0 {
            return Err(BlobError::Integrity(handle.clone()));
        }
        Ok(bytes)
    }

    fn remove(&self, handle: &BlobHandle) -> Result<bool, BlobError> {
        if !is_content_hash(&handle.0) {
            return Ok(false);
        }

        match fs::remove_file(self.blob_path(&handle.0)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Content-addressed blobs held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<BlobHandle, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("blob mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, bytes: &[u8]) -> Result<BlobHandle, BlobError> {
        let handle = BlobHandle(content_hash(bytes));
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Unavailable("blob mutex poisoned".to_string()))?;
        guard.entry(handle.clone()).or_insert_with(|| bytes.to_vec());
        Ok(handle)
    }

    fn fetch(&self, handle: &BlobHandle) -> Result<Vec<u8>, BlobError> {
        let guard = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Unavailable("blob mutex poisoned".to_string()))?;
        guard
            .get(handle)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(handle.clone()))
    }

    fn remove(&self, handle: &BlobHandle) -> Result<bool, BlobError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Unavailable("blob mutex poisoned".to_string()))?;
        Ok(guard.remove(handle).is_some())
    }
}
