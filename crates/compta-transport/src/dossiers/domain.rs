use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::BusinessType;

/// Identifier wrapper for uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn generate() -> Self {
        DocumentId(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference into a [`BlobStore`](super::repository::BlobStore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(pub String);

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Month and year a document is filed under, independent of when it was uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u8,
}

impl Period {
    pub fn new(month: u8, year: i32) -> Result<Self, InvalidPeriod> {
        if (1..=12).contains(&month) {
            Ok(Self { year, month })
        } else {
            Err(InvalidPeriod { month })
        }
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    pub const fn month(self) -> u8 {
        self.month
    }

    pub const fn year(self) -> i32 {
        self.year
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("month {month} is outside 1..=12")]
pub struct InvalidPeriod {
    pub month: u8,
}

/// Uploaded accounting document. Never edited once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub type_key: String,
    pub display_name: String,
    pub content: BlobHandle,
    pub upload_timestamp: DateTime<Utc>,
    pub month: u8,
    pub year: i32,
}

impl Document {
    pub fn is_in(&self, month: u8, year: i32) -> bool {
        self.month == month && self.year == year
    }
}

/// Name pair identifying a client. Both parts are trimmed; comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientKey {
    first_name: String,
    last_name: String,
}

impl ClientKey {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty() && !self.last_name.is_empty()
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Submitted client dossier as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub first_name: String,
    pub last_name: String,
    pub business_type: BusinessType,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl ClientRecord {
    pub fn key(&self) -> ClientKey {
        ClientKey::new(&self.first_name, &self.last_name)
    }

    pub fn matches(&self, key: &ClientKey) -> bool {
        self.first_name.trim() == key.first_name() && self.last_name.trim() == key.last_name()
    }
}

/// What a returning client gets back when their name is recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientLookup {
    pub business_type: BusinessType,
    pub documents: Vec<Document>,
}

/// Closure state of a fiscal year. A year without an entry is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStatus {
    pub year: i32,
    pub is_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_rejects_months_outside_calendar() {
        assert!(Period::new(0, 2024).is_err());
        assert_eq!(Period::new(13, 2024), Err(InvalidPeriod { month: 13 }));
        let period = Period::new(3, 2024).expect("valid period");
        assert_eq!((period.month(), period.year()), (3, 2024));
        assert_eq!(period.to_string(), "03/2024");
    }

    #[test]
    fn period_containing_uses_calendar_month() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 30).expect("valid date");
        assert_eq!(
            Period::containing(date),
            Period::new(11, 2025).expect("valid")
        );
    }

    #[test]
    fn client_key_trims_but_keeps_case() {
        let key = ClientKey::new("  Jean ", "Dupont\t");
        assert_eq!(key.first_name(), "Jean");
        assert_eq!(key.last_name(), "Dupont");
        assert_ne!(key, ClientKey::new("jean", "Dupont"));
        assert!(key.is_complete());
        assert!(!ClientKey::new("   ", "Dupont").is_complete());
        assert_eq!(key.to_string(), "Jean Dupont");
    }

    #[test]
    fn generated_document_ids_do_not_collide() {
        let ids: std::collections::HashSet<_> = (0..256).map(|_| DocumentId::generate()).collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn year_status_serializes_with_camel_case_fields() {
        let status = YearStatus {
            year: 2024,
            is_closed: false,
            closed_date: None,
        };
        let value = serde_json::to_value(&status).expect("serializes");
        assert_eq!(value, serde_json::json!({ "year": 2024, "isClosed": false }));
    }
}
