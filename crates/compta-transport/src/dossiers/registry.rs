use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::warn;

use super::domain::{ClientKey, ClientLookup, ClientRecord};
use super::draft::SessionDraft;

/// Submitted client dossiers in submission order, unique per name pair.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    records: Vec<ClientRecord>,
}

impl ClientRegistry {
    /// Rebuild from persisted records. Names are stored trimmed; a repeated name pair keeps
    /// its first occurrence.
    pub fn from_records(records: Vec<ClientRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for mut record in records {
            let key = record.key();
            record.first_name = key.first_name().to_string();
            record.last_name = key.last_name().to_string();
            if seen.insert(key) {
                kept.push(record);
            } else {
                warn!(client = %record.key(), "dropping duplicate client record");
            }
        }
        Self { records: kept }
    }

    pub fn records(&self) -> &[ClientRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &ClientKey) -> Option<&ClientRecord> {
        self.records.iter().find(|record| record.matches(key))
    }

    pub fn lookup(&self, first_name: &str, last_name: &str) -> Option<ClientLookup> {
        let key = ClientKey::new(first_name, last_name);
        self.get(&key).map(|record| ClientLookup {
            business_type: record.business_type,
            documents: record.documents.clone(),
        })
    }

    /// Store the draft under its name pair, replacing any previous dossier wholesale, then
    /// reset the draft for the next client.
    pub fn submit(
        &mut self,
        draft: &mut SessionDraft,
        today: NaiveDate,
    ) -> Result<SubmitDisposition, ValidationError> {
        let key = draft.key();
        if key.first_name().is_empty() {
            return Err(ValidationError::EmptyFirstName);
        }
        if key.last_name().is_empty() {
            return Err(ValidationError::EmptyLastName);
        }

        let record = ClientRecord {
            first_name: key.first_name().to_string(),
            last_name: key.last_name().to_string(),
            business_type: draft.business_type(),
            documents: draft.documents().to_vec(),
        };
        let disposition = self.upsert(record);
        draft.reset(today);
        Ok(disposition)
    }

    fn upsert(&mut self, record: ClientRecord) -> SubmitDisposition {
        let key = record.key();
        match self.records.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => {
                *existing = record;
                SubmitDisposition::Replaced
            }
            None => {
                self.records.push(record);
                SubmitDisposition::Created
            }
        }
    }

    /// Remove a dossier together with its documents. Callers gate this behind a confirmation.
    pub fn delete(&mut self, key: &ClientKey) -> Option<ClientRecord> {
        let index = self.records.iter().position(|record| record.matches(key))?;
        Some(self.records.remove(index))
    }
}

/// Whether a submit created a new dossier or superseded an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitDisposition {
    Created,
    Replaced,
}

impl SubmitDisposition {
    pub const fn label(self) -> &'static str {
        match self {
            SubmitDisposition::Created => "created",
            SubmitDisposition::Replaced => "replaced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("first name is required")]
    EmptyFirstName,
    #[error("last name is required")]
    EmptyLastName,
}
