use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use super::catalog::{BusinessType, DocumentCatalog, DocumentType};
use super::domain::{
    BlobHandle, ClientKey, ClientLookup, Document, DocumentId, InvalidPeriod, Period,
};
use super::report::documents_for_period;
use super::years::YearStatusRegistry;

/// Client dossier being edited before submission. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    first_name: String,
    last_name: String,
    business_type: BusinessType,
    documents: Vec<Document>,
    period: Period,
}

impl SessionDraft {
    /// Empty draft for a taxi driver, positioned on the month containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            business_type: BusinessType::default(),
            documents: Vec::new(),
            period: Period::containing(today),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn business_type(&self) -> BusinessType {
        self.business_type
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn key(&self) -> ClientKey {
        ClientKey::new(&self.first_name, &self.last_name)
    }

    pub fn set_names(&mut self, first_name: impl Into<String>, last_name: impl Into<String>) {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
    }

    /// Documents already attached stay put; they were validated when they were added.
    pub fn set_business_type(&mut self, business_type: BusinessType) {
        self.business_type = business_type;
    }

    pub fn select_period(&mut self, month: u8, year: i32) -> Result<(), InvalidPeriod> {
        self.period = Period::new(month, year)?;
        Ok(())
    }

    /// Take over a stored dossier's business type and documents, leaving the names as typed.
    pub fn resume(&mut self, lookup: ClientLookup) {
        self.business_type = lookup.business_type;
        self.documents = lookup.documents;
    }

    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self::new(today);
    }

    /// Check that a document of `type_key` may be filed under the selected period right now.
    pub fn check_upload(
        &self,
        years: &YearStatusRegistry,
        type_key: &str,
    ) -> Result<DocumentType, DocumentError> {
        let year = self.period.year();
        if years.is_closed(year) {
            return Err(DocumentError::YearClosed { year });
        }

        DocumentCatalog::find(self.business_type, type_key).ok_or_else(|| {
            DocumentError::UnknownDocumentType {
                business_type: self.business_type,
                type_key: type_key.to_string(),
            }
        })
    }

    /// Attach a document to the selected period under a freshly generated id.
    pub fn add_document(
        &mut self,
        years: &YearStatusRegistry,
        type_key: &str,
        display_name: impl Into<String>,
        content: BlobHandle,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Document, DocumentError> {
        let document_type = self.check_upload(years, type_key)?;

        let document = Document {
            id: DocumentId::generate(),
            type_key: document_type.key.to_string(),
            display_name: display_name.into(),
            content,
            upload_timestamp: uploaded_at,
            month: self.period.month(),
            year: self.period.year(),
        };
        self.documents.push(document.clone());
        Ok(document)
    }

    pub fn documents_for_selected_period(&self) -> Vec<&Document> {
        documents_for_period(&self.documents, self.period.month(), self.period.year())
    }

    /// Type keys that already have at least one upload for the selected period.
    pub fn uploaded_types(&self) -> BTreeSet<&str> {
        self.documents_for_selected_period()
            .into_iter()
            .map(|document| document.type_key.as_str())
            .collect()
    }
}

/// Reasons a single document upload is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("year {year} is closed, no new documents can be added")]
    YearClosed { year: i32 },
    #[error("document type '{type_key}' is not available for {business_type} clients")]
    UnknownDocumentType {
        business_type: BusinessType,
        type_key: String,
    },
}
