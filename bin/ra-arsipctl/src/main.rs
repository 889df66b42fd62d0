//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "binary"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Control CLI for administrators interacting with Ruwang Arsip."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ra_common::logging;

mod access;
mod archive;
mod context;
mod session;

use context::{Context, OutputFormat};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ruwang Arsip administrative control utility", long_about = None)]
struct Cli {
    /// Path to the configuration file (falls back to RA_CONFIG and configs/).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and remember the user in local storage.
    Login(session::LoginCommand),
    /// Show the signed-in user.
    Whoami,
    /// Forget the signed-in user.
    Logout,
    /// Ask the authorizer whether a role may open a dashboard path.
    Authorize(access::AuthorizeCommand),
    /// List user accounts (master user only).
    Users,
    /// List documents visible to the signed-in user.
    Documents(archive::DocumentsCommand),
    /// Export documents or debtors as CSV.
    Export(archive::ExportCommand),
    /// Inspect, validate, or reset persisted master data.
    #[command(subcommand, name = "master-data")]
    MasterData(archive::MasterDataCommand),
}

fn main() -> Result<()> {
    logging::init_cli();
    let cli = Cli::parse();
    let ctx = Context::load(cli.config.as_deref(), cli.output)?;
    match cli.command {
        Commands::Login(cmd) => session::login(&ctx, cmd),
        Commands::Whoami => session::whoami(&ctx),
        Commands::Logout => session::logout(&ctx),
        Commands::Authorize(cmd) => access::authorize(&ctx, cmd),
        Commands::Users => access::users(&ctx),
        Commands::Documents(cmd) => archive::documents(&ctx, cmd),
        Commands::Export(cmd) => archive::export(&ctx, cmd),
        Commands::MasterData(cmd) => archive::master_data(&ctx, cmd),
    }
}
