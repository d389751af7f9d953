//! Monthly accounting dossiers for taxi and VTC drivers.
//!
//! Drivers fill a [`SessionDraft`] period by period and submit it; the accountant reviews the
//! stored dossiers and closes fiscal years against further uploads. [`DossierService`] owns
//! both registries and saves them after every change.

pub mod access;
pub mod catalog;
pub mod domain;
pub mod draft;
pub mod registry;
pub mod report;
pub mod repository;
pub mod service;
pub mod storage;
pub mod years;

#[cfg(test)]
mod tests;

pub use access::{AccessDenied, AdminCapability, AdminGate, Confirmation};
pub use catalog::{month_label, BusinessType, DocumentCatalog, DocumentType, UnknownBusinessType};
pub use domain::{
    BlobHandle, ClientKey, ClientLookup, ClientRecord, Document, DocumentId, InvalidPeriod,
    Period, YearStatus,
};
pub use draft::{DocumentError, SessionDraft};
pub use registry::{ClientRegistry, SubmitDisposition, ValidationError};
pub use report::{
    documents_for_period, group_by_year_then_month, write_documents_csv, ClientReport,
    DocumentLine, DocumentsByYear, MonthSection, YearSection,
};
pub use repository::{
    BlobError, BlobStore, PersistenceAdapter, PersistenceError, RegistrySnapshot,
};
pub use service::{Applied, DossierError, DossierService, ExportedFile};
pub use storage::{FsBlobStore, JsonFilePersistence, MemoryBlobStore, MemoryPersistence};
pub use years::{YearOverviewEntry, YearStatusRegistry};
