use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Subcommand};
use compta_transport::dossiers::{
    AdminCapability, ClientKey, ClientReport, Confirmation, ExportedFile,
};
use compta_transport::error::AppError;
use tracing::info;

use crate::cli::NameArgs;
use crate::infra::{confirm, display_name, prompt, warn_if_not_durable, Workspace};

#[derive(Args, Debug)]
pub(crate) struct AdminArgs {
    /// Admin secret; prompted for when omitted
    #[arg(long, global = true)]
    pub(crate) secret: Option<String>,
    #[command(subcommand)]
    pub(crate) command: AdminCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AdminCommand {
    /// Fiscal year status and closure
    Years {
        #[command(subcommand)]
        command: YearsCommand,
    },
    /// Review, export, and delete client dossiers
    Clients {
        #[command(subcommand)]
        command: ClientsCommand,
    },
    /// Write every stored document as CSV to stdout
    Report,
}

#[derive(Subcommand, Debug)]
pub(crate) enum YearsCommand {
    /// List open and closed years
    List {
        /// First year shown (defaults to APP_FIRST_YEAR)
        #[arg(long)]
        from: Option<i32>,
        /// Last year shown (defaults to APP_LAST_YEAR)
        #[arg(long)]
        to: Option<i32>,
    },
    /// Close a year against new uploads
    Close { year: i32 },
    /// Reopen a closed year
    Reopen { year: i32 },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ClientsCommand {
    /// List submitted dossiers
    List,
    /// Show one dossier grouped by year and month
    Show {
        #[command(flatten)]
        name: NameArgs,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a dossier and all of its documents
    Delete {
        #[command(flatten)]
        name: NameArgs,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Copy every document of a dossier into a directory
    Export {
        #[command(flatten)]
        name: NameArgs,
        /// Destination directory, created if needed
        #[arg(long)]
        out: PathBuf,
    },
}

pub(crate) fn run_admin(mut workspace: Workspace, args: AdminArgs) -> Result<(), AppError> {
    let secret = match args.secret {
        Some(secret) => secret,
        None => prompt("Admin secret: ")?,
    };
    let admin = workspace.gate.authorize(&secret)?;

    match args.command {
        AdminCommand::Years { command } => run_years(&mut workspace, &admin, command),
        AdminCommand::Clients { command } => run_clients(&mut workspace, &admin, command),
        AdminCommand::Report => {
            let stdout = io::stdout();
            workspace
                .service
                .write_documents_csv(&admin, stdout.lock())?;
            Ok(())
        }
    }
}

fn run_years(
    workspace: &mut Workspace,
    admin: &AdminCapability,
    command: YearsCommand,
) -> Result<(), AppError> {
    match command {
        YearsCommand::List { from, to } => {
            let from = from.unwrap_or(workspace.calendar.first_year);
            let to = to.unwrap_or(workspace.calendar.last_year);
            for entry in workspace.service.year_overview(admin, from..=to) {
                match entry.closed_date {
                    Some(closed) => println!(
                        "{}  {}  le {}",
                        entry.year,
                        entry.state_label(),
                        closed.format("%d/%m/%Y")
                    ),
                    None => println!("{}  {}", entry.year, entry.state_label()),
                }
            }
        }
        YearsCommand::Close { year } => {
            let applied = workspace.service.close_year(admin, year, Utc::now());
            warn_if_not_durable(&applied);
            println!("Year {year} closed.");
        }
        YearsCommand::Reopen { year } => {
            let applied = workspace.service.reopen_year(admin, year);
            warn_if_not_durable(&applied);
            if applied.value {
                println!("Year {year} reopened.");
            } else {
                println!("Year {year} was never closed; nothing to do.");
            }
        }
    }
    Ok(())
}

fn run_clients(
    workspace: &mut Workspace,
    admin: &AdminCapability,
    command: ClientsCommand,
) -> Result<(), AppError> {
    match command {
        ClientsCommand::List => {
            let records = workspace.service.clients(admin);
            if records.is_empty() {
                println!("No dossier submitted yet.");
            }
            for record in records {
                println!(
                    "{:<30} {:<5} {} document(s)",
                    record.key().to_string(),
                    record.business_type.label().to_uppercase(),
                    record.documents.len()
                );
            }
        }
        ClientsCommand::Show { name, json } => {
            let key = ClientKey::new(&name.first_name, &name.last_name);
            let report = workspace.service.client_report(admin, &key)?;
            if json {
                serde_json::to_writer_pretty(io::stdout().lock(), &report)
                    .map_err(io::Error::from)?;
                println!();
            } else {
                render_report(&report);
            }
        }
        ClientsCommand::Delete { name, yes } => {
            let key = ClientKey::new(&name.first_name, &name.last_name);
            let confirmed = yes
                || confirm(&format!(
                    "Delete the dossier of {key} and all of its documents?"
                ))?;
            let applied = workspace.service.delete_client(
                admin,
                &key,
                Confirmation::from_flag(confirmed),
            )?;
            warn_if_not_durable(&applied);
            println!(
                "Deleted {key} and {} document(s).",
                applied.value.documents.len()
            );
        }
        ClientsCommand::Export { name, out } => {
            let key = ClientKey::new(&name.first_name, &name.last_name);
            let files = workspace.service.export_all(admin, &key)?;
            write_export(&out, &files)?;
            info!(client = %key, files = files.len(), out = %out.display(), "dossier exported");
            println!("Exported {} file(s) to {}", files.len(), out.display());
        }
    }
    Ok(())
}

/// Write the exported files into `out`. Nothing is written when any target already exists.
fn write_export(out: &Path, files: &[ExportedFile]) -> io::Result<()> {
    fs::create_dir_all(out)?;
    let targets: Vec<PathBuf> = files
        .iter()
        .map(|file| out.join(display_name(Path::new(&file.file_name))))
        .collect();
    if let Some(existing) = targets.iter().find(|target| target.exists()) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists, export into an empty directory", existing.display()),
        ));
    }

    for (target, file) in targets.iter().zip(files) {
        let mut handle = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)?;
        handle.write_all(&file.bytes)?;
    }
    Ok(())
}

fn render_report(report: &ClientReport) {
    println!(
        "{} ({}) - {} document(s)",
        report.client,
        report.business_type.label().to_uppercase(),
        report.total_documents
    );
    for year in &report.years {
        let state = if year.is_closed { " (clôturée)" } else { "" };
        println!("  {}{}", year.year, state);
        for month in &year.months {
            println!("    {}", month.month_label);
            for line in &month.documents {
                println!(
                    "      {:<28} {}  {}",
                    line.type_label,
                    line.file_name,
                    line.uploaded_at.format("%d/%m/%Y")
                );
            }
        }
    }
}
