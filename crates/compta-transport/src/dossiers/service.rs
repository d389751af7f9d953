use std::collections::HashSet;
use std::io::Write;
use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use super::access::{AdminCapability, Confirmation};
use super::domain::{
    BlobHandle, ClientKey, ClientLookup, ClientRecord, Document, DocumentId, InvalidPeriod,
    YearStatus,
};
use super::draft::{DocumentError, SessionDraft};
use super::registry::{ClientRegistry, SubmitDisposition, ValidationError};
use super::report::{write_documents_csv, ClientReport};
use super::repository::{
    BlobError, BlobStore, PersistenceAdapter, PersistenceError, RegistrySnapshot,
};
use super::years::{YearOverviewEntry, YearStatusRegistry};

/// Single owner of both registries and of the write-through save that follows every
/// mutation. Mutating calls take `&mut self`, so there is exactly one writer at a time.
pub struct DossierService<P, B> {
    clients: ClientRegistry,
    years: YearStatusRegistry,
    persistence: Arc<P>,
    blobs: Arc<B>,
    load_warning: Option<PersistenceError>,
}

/// Result of a committed mutation. The in-memory change always stands; `warning` is set when
/// the follow-up save failed and the change is not durable yet.
#[derive(Debug)]
#[must_use]
pub struct Applied<T> {
    pub value: T,
    pub warning: Option<PersistenceError>,
}

impl<T> Applied<T> {
    pub fn is_durable(&self) -> bool {
        self.warning.is_none()
    }
}

/// A stored document read back for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub document_id: DocumentId,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl<P, B> DossierService<P, B>
where
    P: PersistenceAdapter + 'static,
    B: BlobStore + 'static,
{
    /// Load both registries. A failed load starts from empty registries instead of aborting;
    /// the error stays available through [`Self::load_warning`].
    pub fn open(persistence: Arc<P>, blobs: Arc<B>) -> Self {
        let (snapshot, load_warning) = match persistence.load() {
            Ok(snapshot) => (snapshot, None),
            Err(err) => {
                warn!(error = %err, "could not load dossiers, starting from empty registries");
                (RegistrySnapshot::default(), Some(err))
            }
        };

        let clients = ClientRegistry::from_records(snapshot.clients);
        let years = YearStatusRegistry::from_statuses(snapshot.year_statuses);
        info!(
            clients = clients.len(),
            year_statuses = years.statuses().len(),
            "dossier registries loaded"
        );

        Self {
            clients,
            years,
            persistence,
            blobs,
            load_warning,
        }
    }

    pub fn load_warning(&self) -> Option<&PersistenceError> {
        self.load_warning.as_ref()
    }

    pub fn is_year_closed(&self, year: i32) -> bool {
        self.years.is_closed(year)
    }

    pub fn new_draft(&self, today: NaiveDate) -> SessionDraft {
        SessionDraft::new(today)
    }

    pub fn lookup(&self, first_name: &str, last_name: &str) -> Option<ClientLookup> {
        self.clients.lookup(first_name, last_name)
    }

    /// Pre-fill `draft` from the dossier stored under its names, if any.
    pub fn resume(&self, draft: &mut SessionDraft) -> bool {
        let key = draft.key();
        if !key.is_complete() {
            return false;
        }
        match self.clients.lookup(key.first_name(), key.last_name()) {
            Some(lookup) => {
                info!(client = %key, documents = lookup.documents.len(), "resuming stored dossier");
                draft.resume(lookup);
                true
            }
            None => false,
        }
    }

    /// Store the file and attach it to the draft's selected period. The year and catalog
    /// checks run before anything reaches the blob store.
    pub fn add_document(
        &self,
        draft: &mut SessionDraft,
        type_key: &str,
        file_name: &str,
        bytes: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Document, DossierError> {
        draft.check_upload(&self.years, type_key)?;
        let content = self.blobs.store(bytes)?;
        let document = draft.add_document(&self.years, type_key, file_name, content, now)?;
        info!(
            document_id = %document.id,
            type_key = %document.type_key,
            period = %draft.period(),
            "document attached to draft"
        );
        Ok(document)
    }

    pub fn submit(
        &mut self,
        draft: &mut SessionDraft,
        today: NaiveDate,
    ) -> Result<Applied<SubmitDisposition>, DossierError> {
        let key = draft.key();
        let documents = draft.documents().len();
        let disposition = self.clients.submit(draft, today)?;
        info!(
            client = %key,
            documents,
            disposition = disposition.label(),
            "dossier submitted"
        );
        Ok(self.commit(disposition))
    }

    pub fn clients(&self, _admin: &AdminCapability) -> &[ClientRecord] {
        self.clients.records()
    }

    pub fn year_overview(
        &self,
        _admin: &AdminCapability,
        years: RangeInclusive<i32>,
    ) -> Vec<YearOverviewEntry> {
        self.years.overview(years)
    }

    pub fn close_year(
        &mut self,
        _admin: &AdminCapability,
        year: i32,
        now: DateTime<Utc>,
    ) -> Applied<YearStatus> {
        let status = self.years.close(year, now);
        info!(year, "fiscal year closed");
        self.commit(status)
    }

    /// Returns `false` in `value` when the year had no entry; nothing is saved then.
    pub fn reopen_year(&mut self, _admin: &AdminCapability, year: i32) -> Applied<bool> {
        if self.years.reopen(year) {
            info!(year, "fiscal year reopened");
            self.commit(true)
        } else {
            Applied {
                value: false,
                warning: None,
            }
        }
    }

    pub fn delete_client(
        &mut self,
        _admin: &AdminCapability,
        key: &ClientKey,
        confirmation: Confirmation,
    ) -> Result<Applied<ClientRecord>, DossierError> {
        if confirmation != Confirmation::Confirmed {
            return Err(DossierError::ConfirmationRequired {
                client: key.clone(),
            });
        }

        let removed = self
            .clients
            .delete(key)
            .ok_or_else(|| DossierError::ClientNotFound(key.clone()))?;
        info!(
            client = %key,
            documents = removed.documents.len(),
            "client dossier deleted"
        );
        let applied = self.commit(removed);
        self.release_blobs(&applied.value);
        Ok(applied)
    }

    pub fn client_report(
        &self,
        _admin: &AdminCapability,
        key: &ClientKey,
    ) -> Result<ClientReport, DossierError> {
        let record = self.record(key)?;
        Ok(ClientReport::build(record, &self.years))
    }

    /// Every document of the dossier with its bytes. File names are made unique within the
    /// export by suffixing repeats.
    pub fn export_all(
        &self,
        _admin: &AdminCapability,
        key: &ClientKey,
    ) -> Result<Vec<ExportedFile>, DossierError> {
        let record = self.record(key)?;
        let mut taken = HashSet::new();
        record
            .documents
            .iter()
            .map(|document| {
                let bytes = self.blobs.fetch(&document.content)?;
                Ok::<_, DossierError>(ExportedFile {
                    document_id: document.id.clone(),
                    file_name: unique_file_name(&mut taken, &document.display_name),
                    bytes,
                })
            })
            .collect()
    }

    pub fn write_documents_csv<W: Write>(
        &self,
        _admin: &AdminCapability,
        writer: W,
    ) -> Result<(), DossierError> {
        write_documents_csv(self.clients.records(), writer)?;
        Ok(())
    }

    fn record(&self, key: &ClientKey) -> Result<&ClientRecord, DossierError> {
        self.clients
            .get(key)
            .ok_or_else(|| DossierError::ClientNotFound(key.clone()))
    }

    /// Remove the bytes of `removed`'s documents unless another dossier still points at them.
    /// Failures are logged; the metadata deletion already stands.
    fn release_blobs(&self, removed: &ClientRecord) {
        let still_referenced: HashSet<&BlobHandle> = self
            .clients
            .records()
            .iter()
            .flat_map(|record| record.documents.iter().map(|document| &document.content))
            .collect();
        let orphaned: HashSet<&BlobHandle> = removed
            .documents
            .iter()
            .map(|document| &document.content)
            .filter(|handle| !still_referenced.contains(handle))
            .collect();

        for handle in orphaned {
            if let Err(err) = self.blobs.remove(handle) {
                warn!(blob = %handle, error = %err, "could not remove document content");
            }
        }
    }

    fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            clients: self.clients.records().to_vec(),
            year_statuses: self.years.statuses().to_vec(),
        }
    }

    fn commit<T>(&self, value: T) -> Applied<T> {
        let warning = match self.persistence.save(&self.snapshot()) {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "change kept in memory but could not be saved");
                Some(err)
            }
        };
        Applied { value, warning }
    }
}

fn unique_file_name(taken: &mut HashSet<String>, name: &str) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (name, None),
    };
    let mut counter = 2;
    loop {
        let candidate = match extension {
            Some(extension) => format!("{stem} ({counter}).{extension}"),
            None => format!("{stem} ({counter})"),
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Error raised by the dossier service.
#[derive(Debug, thiserror::Error)]
pub enum DossierError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Period(#[from] InvalidPeriod),
    #[error("deleting the dossier of {client} requires explicit confirmation")]
    ConfirmationRequired { client: ClientKey },
    #[error("no dossier found for {0}")]
    ClientNotFound(ClientKey),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("failed to write document report: {0}")]
    Report(#[from] csv::Error),
}
