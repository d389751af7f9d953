use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::domain::{BlobHandle, ClientRecord, YearStatus};

/// Everything that survives a restart: both registries, documents by handle only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub clients: Vec<ClientRecord>,
    #[serde(default)]
    pub year_statuses: Vec<YearStatus>,
}

/// Storage abstraction for the registries so the service can be exercised in isolation.
pub trait PersistenceAdapter: Send + Sync {
    fn load(&self) -> Result<RegistrySnapshot, PersistenceError>;
    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), PersistenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored dossiers at {path} are unreadable: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode dossiers: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

/// Content store for uploaded files, kept apart from the metadata snapshot.
pub trait BlobStore: Send + Sync {
    fn store(&self, bytes: &[u8]) -> Result<BlobHandle, BlobError>;
    fn fetch(&self, handle: &BlobHandle) -> Result<Vec<u8>, BlobError>;
    /// Drop the bytes behind `handle`. Returns `false` when nothing was stored under it.
    fn remove(&self, handle: &BlobHandle) -> Result<bool, BlobError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob {0} not found")]
    NotFound(BlobHandle),
    #[error("blob {0} does not match its content hash")]
    Integrity(BlobHandle),
    #[error("blob storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("blob storage unavailable: {0}")]
    Unavailable(String),
}
