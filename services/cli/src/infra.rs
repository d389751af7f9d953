use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compta_transport::config::{AppConfig, CalendarConfig};
use compta_transport::dossiers::{
    AdminGate, Applied, DossierService, FsBlobStore, JsonFilePersistence,
};
use tracing::info;

pub(crate) type DiskService = DossierService<JsonFilePersistence, FsBlobStore>;

/// Dossier service over the configured data directory plus the boundary settings.
pub(crate) struct Workspace {
    pub(crate) service: DiskService,
    pub(crate) gate: AdminGate,
    pub(crate) calendar: CalendarConfig,
}

impl Workspace {
    pub(crate) fn open(config: AppConfig) -> Self {
        let persistence = Arc::new(JsonFilePersistence::new(config.storage.snapshot_path()));
        let blobs = Arc::new(FsBlobStore::new(config.storage.blob_dir()));
        info!(
            environment = ?config.environment,
            data_dir = %config.storage.data_dir.display(),
            "opening dossier workspace"
        );

        let service = DossierService::open(persistence, blobs);
        if let Some(err) = service.load_warning() {
            eprintln!("warning: stored dossiers could not be loaded ({err}); starting empty");
        }

        Self {
            service,
            gate: AdminGate::new(config.admin.secret),
            calendar: config.calendar,
        }
    }
}

/// Tell the user when a change went through in memory but did not reach the disk.
pub(crate) fn warn_if_not_durable<T>(applied: &Applied<T>) {
    if let Some(err) = &applied.warning {
        eprintln!("warning: change applied but not saved: {err}");
    }
}

pub(crate) fn prompt(question: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{question}")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

pub(crate) fn confirm(question: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{question} [o/N] "))?;
    Ok(matches!(
        answer.to_ascii_lowercase().as_str(),
        "o" | "oui" | "y" | "yes"
    ))
}

/// `TYPE=PATH` as given to `client submit --document`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocumentArg {
    pub(crate) type_key: String,
    pub(crate) path: PathBuf,
}

pub(crate) fn parse_document_arg(raw: &str) -> Result<DocumentArg, String> {
    let (type_key, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=PATH, got '{raw}'"))?;
    let type_key = type_key.trim();
    if type_key.is_empty() || path.trim().is_empty() {
        return Err(format!("expected TYPE=PATH, got '{raw}'"));
    }
    Ok(DocumentArg {
        type_key: type_key.to_string(),
        path: PathBuf::from(path.trim()),
    })
}

/// Name under which an uploaded file is recorded: its final path component.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}
