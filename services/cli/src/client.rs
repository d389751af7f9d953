use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Subcommand};
use compta_transport::dossiers::{
    documents_for_period, month_label, BlobStore, BusinessType, ClientLookup, DocumentCatalog,
    DossierError, DossierService, PersistenceAdapter, SessionDraft,
};
use compta_transport::error::AppError;

use crate::cli::NameArgs;
use crate::infra::{
    display_name, parse_document_arg, warn_if_not_durable, DocumentArg, Workspace,
};

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Only list types for this business type (taxi or vtc)
    #[arg(long)]
    pub(crate) business_type: Option<BusinessType>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ClientCommand {
    /// Show what is on file for a client
    Show(NameArgs),
    /// Upload documents for one period and submit the dossier
    Submit(SubmitArgs),
}

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    #[command(flatten)]
    pub(crate) name: NameArgs,
    /// taxi or vtc; defaults to the stored value, otherwise taxi
    #[arg(long)]
    pub(crate) business_type: Option<BusinessType>,
    /// Month the documents belong to (1-12). Defaults to the current month.
    #[arg(long)]
    pub(crate) month: Option<u8>,
    /// Fiscal year the documents belong to. Defaults to the current year.
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Discard the dossier on file and submit only the documents given here
    #[arg(long)]
    pub(crate) replace: bool,
    /// Document to upload, as TYPE=PATH (repeatable)
    #[arg(long = "document", value_parser = parse_document_arg)]
    pub(crate) documents: Vec<DocumentArg>,
}

pub(crate) fn run_catalog(args: CatalogArgs) {
    let business_types = match args.business_type {
        Some(business_type) => vec![business_type],
        None => BusinessType::ordered().to_vec(),
    };

    for business_type in business_types {
        println!("{}", business_type.label().to_uppercase());
        for document_type in DocumentCatalog::available_types(business_type) {
            println!("  {:<28} {}", document_type.key, document_type.label);
        }
    }
}

pub(crate) fn run_client(
    mut workspace: Workspace,
    command: ClientCommand,
) -> Result<(), AppError> {
    match command {
        ClientCommand::Show(name) => {
            match workspace.service.lookup(&name.first_name, &name.last_name) {
                Some(lookup) => render_lookup(&name, &lookup),
                None => println!(
                    "No dossier on file for {} {}",
                    name.first_name.trim(),
                    name.last_name.trim()
                ),
            }
            Ok(())
        }
        ClientCommand::Submit(args) => submit(&mut workspace, args),
    }
}

fn submit(workspace: &mut Workspace, args: SubmitArgs) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let service = &mut workspace.service;

    let mut draft = start_draft(&*service, today, &args.name, args.replace);
    if let Some(business_type) = args.business_type {
        draft.set_business_type(business_type);
    }

    let period = draft.period();
    draft.select_period(
        args.month.unwrap_or(period.month()),
        args.year.unwrap_or(period.year()),
    )
    .map_err(DossierError::from)?;
    if service.is_year_closed(draft.period().year()) {
        println!(
            "Year {} is closed: no new document can be added.",
            draft.period().year()
        );
    }

    let refused = upload_documents(&*service, &mut draft, &args.documents, Utc::now())?;
    for refusal in &refused {
        eprintln!("✗ {}: {}", refusal.path.display(), refusal.reason);
    }

    let uploaded = draft.uploaded_types();
    let missing: Vec<_> = DocumentCatalog::available_types(draft.business_type())
        .into_iter()
        .filter(|document_type| !uploaded.contains(document_type.key))
        .map(|document_type| document_type.label)
        .collect();

    let key = draft.key();
    let applied = service.submit(&mut draft, today)?;
    warn_if_not_durable(&applied);
    println!("Dossier of {key} submitted ({}).", applied.value.label());
    if !missing.is_empty() {
        println!("Still missing for this period: {}", missing.join(", "));
    }
    Ok(())
}

/// Draft for `name`, pre-filled from the dossier on file unless `replace` is set.
fn start_draft<P, B>(
    service: &DossierService<P, B>,
    today: NaiveDate,
    name: &NameArgs,
    replace: bool,
) -> SessionDraft
where
    P: PersistenceAdapter + 'static,
    B: BlobStore + 'static,
{
    let mut draft = service.new_draft(today);
    draft.set_names(name.first_name.as_str(), name.last_name.as_str());
    if replace {
        println!("Replacing any dossier on file with the documents given here");
    } else if service.resume(&mut draft) {
        println!(
            "Resuming dossier with {} document(s) on file",
            draft.documents().len()
        );
    }
    draft
}

/// A `--document` that was not attached to the draft.
#[derive(Debug)]
struct Refusal {
    path: PathBuf,
    reason: String,
}

/// Attach each document to the draft. A file that cannot be read, or that the draft refuses,
/// is skipped and reported; the remaining documents still go through.
fn upload_documents<P, B>(
    service: &DossierService<P, B>,
    draft: &mut SessionDraft,
    documents: &[DocumentArg],
    now: DateTime<Utc>,
) -> Result<Vec<Refusal>, AppError>
where
    P: PersistenceAdapter + 'static,
    B: BlobStore + 'static,
{
    let mut refused = Vec::new();
    for document in documents {
        let bytes = match fs::read(&document.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                refused.push(Refusal {
                    path: document.path.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let name = display_name(&document.path);
        match service.add_document(draft, &document.type_key, &name, &bytes, now) {
            Ok(stored) => println!(
                "✓ {} uploaded for {} {}",
                stored.display_name,
                month_label(stored.month).unwrap_or("?"),
                stored.year
            ),
            Err(DossierError::Document(err)) => refused.push(Refusal {
                path: document.path.clone(),
                reason: err.to_string(),
            }),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(refused)
}

fn render_lookup(name: &NameArgs, lookup: &ClientLookup) {
    println!(
        "{} {} ({})",
        name.first_name.trim(),
        name.last_name.trim(),
        lookup.business_type.label().to_uppercase()
    );

    let mut periods: Vec<(i32, u8)> = lookup
        .documents
        .iter()
        .map(|document| (document.year, document.month))
        .collect();
    periods.sort_unstable();
    periods.dedup();

    for (year, month) in periods {
        println!("  {} {}", month_label(month).unwrap_or("?"), year);
        for document in documents_for_period(&lookup.documents, month, year) {
            let label =
                DocumentCatalog::label(&document.type_key).unwrap_or(document.type_key.as_str());
            println!("    ✓ {:<28} {}", label, document.display_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use compta_transport::dossiers::{AdminGate, MemoryBlobStore, MemoryPersistence};

    use super::*;

    fn scan(dir: &std::path::Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).expect("scan written");
        path
    }

    #[test]
    fn refused_documents_do_not_abort_the_others() {
        let dir = std::env::temp_dir().join(format!("compta-cli-upload-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("dir created");
        let today = NaiveDate::from_ymd_opt(2024, 3, 18).expect("valid date");
        let now = Utc
            .with_ymd_and_hms(2024, 3, 18, 9, 0, 0)
            .single()
            .expect("valid timestamp");

        let blobs = Arc::new(MemoryBlobStore::default());
        let service = DossierService::open(Arc::new(MemoryPersistence::default()), blobs.clone());
        let mut draft = service.new_draft(today);
        draft.set_names("Jean", "Dupont");
        draft.set_business_type(BusinessType::Vtc);

        let documents = vec![
            DocumentArg {
                type_key: "peages".to_string(),
                path: scan(&dir, "peages.pdf", b"peages"),
            },
            DocumentArg {
                type_key: "abonnement_g7".to_string(),
                path: scan(&dir, "g7.pdf", b"g7"),
            },
            DocumentArg {
                type_key: "autres".to_string(),
                path: dir.join("absent.pdf"),
            },
            DocumentArg {
                type_key: "assurances".to_string(),
                path: scan(&dir, "assurance.pdf", b"assurance"),
            },
        ];

        let refused = upload_documents(&service, &mut draft, &documents, now).expect("uploaded");

        assert_eq!(refused.len(), 2);
        assert_eq!(refused[0].path, dir.join("g7.pdf"));
        assert_eq!(refused[1].path, dir.join("absent.pdf"));
        assert_eq!(draft.documents().len(), 2);
        assert_eq!(blobs.len(), 2);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn closed_year_refuses_each_document() {
        let dir = std::env::temp_dir().join(format!("compta-cli-closed-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("dir created");
        let today = NaiveDate::from_ymd_opt(2024, 3, 18).expect("valid date");
        let now = Utc
            .with_ymd_and_hms(2024, 3, 18, 9, 0, 0)
            .single()
            .expect("valid timestamp");

        let mut service = DossierService::open(
            Arc::new(MemoryPersistence::default()),
            Arc::new(MemoryBlobStore::default()),
        );
        let admin = AdminGate::new("secret").authorize("secret").expect("authorized");
        let _ = service.close_year(&admin, 2024, now);
        let mut draft = service.new_draft(today);
        draft.set_names("Jean", "Dupont");

        let documents = vec![DocumentArg {
            type_key: "peages".to_string(),
            path: scan(&dir, "peages.pdf", b"peages"),
        }];
        let refused = upload_documents(&service, &mut draft, &documents, now).expect("handled");

        assert_eq!(refused.len(), 1);
        assert!(refused[0].reason.contains("2024"));
        assert!(draft.documents().is_empty());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn returning_driver_keeps_earlier_months_unless_replacing() {
        let dir = std::env::temp_dir().join(format!("compta-cli-resume-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("dir created");
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).expect("valid date");
        let now = Utc
            .with_ymd_and_hms(2024, 4, 2, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        let name = NameArgs {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
        };
        let mut service = DossierService::open(
            Arc::new(MemoryPersistence::default()),
            Arc::new(MemoryBlobStore::default()),
        );

        let mut march = start_draft(&service, today, &name, false);
        march.select_period(3, 2024).expect("valid period");
        let documents = vec![DocumentArg {
            type_key: "peages".to_string(),
            path: scan(&dir, "mars.pdf", b"mars"),
        }];
        upload_documents(&service, &mut march, &documents, now).expect("uploaded");
        let _ = service.submit(&mut march, today).expect("submitted");

        let mut april = start_draft(&service, today, &name, false);
        assert_eq!(april.documents().len(), 1);
        let documents = vec![DocumentArg {
            type_key: "peages".to_string(),
            path: scan(&dir, "avril.pdf", b"avril"),
        }];
        upload_documents(&service, &mut april, &documents, now).expect("uploaded");
        let _ = service.submit(&mut april, today).expect("submitted");
        let stored = service.lookup("Jean", "Dupont").expect("on file");
        assert_eq!(stored.documents.len(), 2);

        let fresh = start_draft(&service, today, &name, true);
        assert!(fresh.documents().is_empty());
        fs::remove_dir_all(dir).ok();
    }
}
