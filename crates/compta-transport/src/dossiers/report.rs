use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::catalog::{month_label, BusinessType, DocumentCatalog};
use super::domain::{ClientKey, ClientRecord, Document, DocumentId};
use super::years::YearStatusRegistry;

/// Documents filed under exactly `month`/`year`, in upload order.
pub fn documents_for_period(documents: &[Document], month: u8, year: i32) -> Vec<&Document> {
    documents
        .iter()
        .filter(|document| document.is_in(month, year))
        .collect()
}

pub type DocumentsByYear<'a> = BTreeMap<i32, BTreeMap<u8, Vec<&'a Document>>>;

/// year -> month -> documents, each month keeping upload order.
pub fn group_by_year_then_month(documents: &[Document]) -> DocumentsByYear<'_> {
    let mut grouped = DocumentsByYear::new();
    for document in documents {
        grouped
            .entry(document.year)
            .or_default()
            .entry(document.month)
            .or_default()
            .push(document);
    }
    grouped
}

/// Admin view of one dossier, grouped for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientReport {
    pub client: ClientKey,
    pub business_type: BusinessType,
    pub total_documents: usize,
    pub years: Vec<YearSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSection {
    pub year: i32,
    pub is_closed: bool,
    pub months: Vec<MonthSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSection {
    pub month: u8,
    pub month_label: &'static str,
    pub documents: Vec<DocumentLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLine {
    pub id: DocumentId,
    pub type_key: String,
    pub type_label: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentLine {
    fn from_document(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            type_key: document.type_key.clone(),
            type_label: type_label(&document.type_key),
            file_name: document.display_name.clone(),
            uploaded_at: document.upload_timestamp,
        }
    }
}

impl ClientReport {
    pub fn build(record: &ClientRecord, years: &YearStatusRegistry) -> Self {
        let sections = group_by_year_then_month(&record.documents)
            .into_iter()
            .map(|(year, months)| YearSection {
                year,
                is_closed: years.is_closed(year),
                months: months
                    .into_iter()
                    .map(|(month, documents)| MonthSection {
                        month,
                        month_label: month_label(month).unwrap_or("?"),
                        documents: documents
                            .into_iter()
                            .map(DocumentLine::from_document)
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            client: record.key(),
            business_type: record.business_type,
            total_documents: record.documents.len(),
            years: sections,
        }
    }
}

// Keys are checked against the catalog on upload, but a hand-edited snapshot may still
// carry something unknown. Fall back to the raw key.
fn type_label(type_key: &str) -> String {
    DocumentCatalog::label(type_key)
        .map(str::to_string)
        .unwrap_or_else(|| type_key.to_string())
}

#[derive(Debug, Serialize)]
struct DocumentRow<'a> {
    last_name: &'a str,
    first_name: &'a str,
    business_type: &'static str,
    year: i32,
    month: u8,
    month_label: &'static str,
    type_key: &'a str,
    type_label: String,
    file_name: &'a str,
    uploaded_at: String,
    document_id: &'a str,
}

/// One CSV row per stored document, clients in submission order.
pub fn write_documents_csv<W: Write>(
    records: &[ClientRecord],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        for document in &record.documents {
            csv_writer.serialize(DocumentRow {
                last_name: &record.last_name,
                first_name: &record.first_name,
                business_type: record.business_type.label(),
                year: document.year,
                month: document.month,
                month_label: month_label(document.month).unwrap_or("?"),
                type_key: &document.type_key,
                type_label: type_label(&document.type_key),
                file_name: &document.display_name,
                uploaded_at: document.upload_timestamp.to_rfc3339(),
                document_id: &document.id.0,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}
