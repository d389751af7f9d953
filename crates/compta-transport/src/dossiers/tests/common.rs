use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::dossiers::access::{AdminCapability, AdminGate};
use crate::dossiers::catalog::BusinessType;
use crate::dossiers::domain::{BlobHandle, Document, DocumentId};
use crate::dossiers::draft::SessionDraft;
use crate::dossiers::repository::{PersistenceAdapter, PersistenceError, RegistrySnapshot};
use crate::dossiers::service::DossierService;
use crate::dossiers::storage::{MemoryBlobStore, MemoryPersistence};

pub(super) type MemoryService = DossierService<MemoryPersistence, MemoryBlobStore>;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 18).expect("valid date")
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 18, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin() -> AdminCapability {
    AdminGate::new("admin2024")
        .authorize("admin2024")
        .expect("secret accepted")
}

pub(super) struct Harness {
    pub(super) service: MemoryService,
    pub(super) persistence: Arc<MemoryPersistence>,
    pub(super) blobs: Arc<MemoryBlobStore>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with_snapshot(RegistrySnapshot::default())
    }

    pub(super) fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        let persistence = Arc::new(MemoryPersistence::with_snapshot(snapshot));
        let blobs = Arc::new(MemoryBlobStore::default());
        let service = DossierService::open(persistence.clone(), blobs.clone());
        Self {
            service,
            persistence,
            blobs,
        }
    }

    /// A second service over the same storage, as after a restart.
    pub(super) fn reopen(&self) -> MemoryService {
        DossierService::open(self.persistence.clone(), self.blobs.clone())
    }

    pub(super) fn draft(
        &self,
        first_name: &str,
        last_name: &str,
        business_type: BusinessType,
    ) -> SessionDraft {
        let mut draft = self.service.new_draft(today());
        draft.set_names(first_name, last_name);
        draft.set_business_type(business_type);
        draft
    }
}

pub(super) fn document(type_key: &str, month: u8, year: i32) -> Document {
    Document {
        id: DocumentId::generate(),
        type_key: type_key.to_string(),
        display_name: format!("{type_key}-{year}-{month:02}.pdf"),
        content: BlobHandle(format!("blob-{type_key}-{year}-{month}")),
        upload_timestamp: now(),
        month,
        year,
    }
}

/// Persistence that can be told to fail loads and saves.
#[derive(Default)]
pub(super) struct FlakyPersistence {
    pub(super) inner: MemoryPersistence,
    pub(super) fail_load: AtomicBool,
    pub(super) fail_save: AtomicBool,
}

impl FlakyPersistence {
    pub(super) fn failing_saves() -> Self {
        let persistence = Self::default();
        persistence.fail_save.store(true, Ordering::SeqCst);
        persistence
    }

    pub(super) fn failing_loads() -> Self {
        let persistence = Self::default();
        persistence.fail_load.store(true, Ordering::SeqCst);
        persistence
    }
}

impl PersistenceAdapter for FlakyPersistence {
    fn load(&self) -> Result<RegistrySnapshot, PersistenceError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("load refused".to_string()));
        }
        self.inner.load()
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), PersistenceError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("disk full".to_string()));
        }
        self.inner.save(snapshot)
    }
}
