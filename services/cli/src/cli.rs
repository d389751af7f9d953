use crate::admin::{run_admin, AdminArgs};
use crate::client::{run_catalog, run_client, CatalogArgs, ClientCommand};
use crate::demo::run_demo;
use crate::infra::Workspace;
use clap::{Args, Parser, Subcommand};
use compta_transport::config::AppConfig;
use compta_transport::error::AppError;
use compta_transport::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "compta-transport",
    about = "Collect monthly accounting documents from taxi and VTC drivers and close fiscal years",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the document types a driver can upload
    Catalog(CatalogArgs),
    /// Driver commands: look up and submit a dossier
    Client {
        #[command(subcommand)]
        command: ClientCommand,
    },
    /// Accountant commands, guarded by the admin secret
    Admin(AdminArgs),
    /// Walk through the driver and accountant workflows on throwaway in-memory storage
    Demo,
}

/// Identifies a client by the name pair they submitted under.
#[derive(Args, Debug, Clone)]
pub(crate) struct NameArgs {
    /// First name, matched exactly after trimming
    #[arg(long)]
    pub(crate) first_name: String,
    /// Last name, matched exactly after trimming
    #[arg(long)]
    pub(crate) last_name: String,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Catalog(args) => {
            run_catalog(args);
            Ok(())
        }
        Command::Client { command } => run_client(Workspace::open(config), command),
        Command::Admin(args) => run_admin(Workspace::open(config), args),
        Command::Demo => run_demo(&config),
    }
}
