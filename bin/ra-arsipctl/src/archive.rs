//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "binary"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Control CLI for administrators interacting with Ruwang Arsip."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use clap::{Args, Subcommand, ValueEnum};
use ra_archive::{export, Actor, ArchiveState, DebiturSort, DocumentSort, ListQuery, MasterData};
use ra_security::Capability;

use crate::context::Context;

#[derive(Debug, Args)]
pub struct DocumentsCommand {
    /// Free-text search over code, name, and type.
    #[arg(long, short)]
    q: Option<String>,
}

pub fn documents(ctx: &Context, cmd: DocumentsCommand) -> Result<()> {
    let actor = ctx.require_actor()?;
    require(&actor, Capability::AccessDigitalArchive)?;
    let archive = ArchiveState::seeded();
    let mut query = ListQuery::<DocumentSort>::default();
    if let Some(q) = cmd.q {
        query = query.search(q);
    }
    let rows = query.filter_sorted(archive.documents(actor.role));
    ctx.render(&rows, || {
        rows.iter()
            .map(|d| {
                format!(
                    "{:<12} {:<6} {:<9} {:<13} {}",
                    d.kode, d.jenis, d.status_pinjam, d.level_akses, d.nama
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportData {
    Dokumen,
    Debitur,
}

#[derive(Debug, Args)]
pub struct ExportCommand {
    #[arg(value_enum)]
    data: ExportData,

    /// Write to a file instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    out: Option<PathBuf>,

    #[arg(long, short)]
    q: Option<String>,
}

pub fn export(ctx: &Context, cmd: ExportCommand) -> Result<()> {
    let actor = ctx.require_actor()?;
    let archive = ArchiveState::seeded();
    let csv = match cmd.data {
        ExportData::Dokumen => {
            require(&actor, Capability::AccessDigitalArchive)?;
            let mut query = ListQuery::<DocumentSort>::default();
            if let Some(q) = cmd.q {
                query = query.search(q);
            }
            let rows = query.filter_sorted(archive.documents(actor.role));
            export::documents_csv(&rows, &ctx.master_data().load())?
        }
        ExportData::Debitur => {
            let mut query = ListQuery::<DebiturSort>::default();
            if let Some(q) = cmd.q {
                query = query.search(q);
            }
            export::debtors_csv(&query.filter_sorted(archive.debtors(actor.role)))?
        }
    };
    match cmd.out {
        Some(path) => {
            fs::write(&path, csv)
                .with_context(|| format!("unable to write {}", path.display()))?;
            eprintln!("exported to {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

#[derive(Debug, Subcommand)]
pub enum MasterDataCommand {
    /// Print the effective master data (stored value or defaults).
    Show,
    /// Check a JSON master data file without saving it.
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Validate a JSON file and store it.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Drop the stored value so defaults apply again.
    Reset,
}

pub fn master_data(ctx: &Context, cmd: MasterDataCommand) -> Result<()> {
    let store = ctx.master_data();
    match cmd {
        MasterDataCommand::Show => {
            let data = store.load();
            ctx.render(&data, || summarize(&data))
        }
        MasterDataCommand::Validate { file } => {
            let data = read_master_data(&file)?;
            data.validate()?;
            println!("{} valid: {}", file.display(), summarize(&data));
            Ok(())
        }
        MasterDataCommand::Import { file } => {
            let actor = ctx.require_actor()?;
            require(&actor, Capability::AccessDigitalArchiveAdmin)?;
            let data = read_master_data(&file)?;
            store.save(&data)?;
            println!("master data saved: {}", summarize(&data));
            Ok(())
        }
        MasterDataCommand::Reset => {
            let actor = ctx.require_actor()?;
            require(&actor, Capability::AccessDigitalArchiveAdmin)?;
            store.reset()?;
            println!("master data reset to defaults");
            Ok(())
        }
    }
}

fn read_master_data(file: &Path) -> Result<MasterData> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("unable to read {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", file.display()))
}

fn summarize(data: &MasterData) -> String {
    let lokasi = data
        .lokasi_penyimpanan
        .iter()
        .map(|l| l.kode.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let jenis = data
        .jenis_dokumen
        .iter()
        .map(|j| j.kode.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("lokasi [{lokasi}] jenis [{jenis}]")
}

fn require(actor: &Actor, capability: Capability) -> Result<()> {
    if capability.allows(actor.role) {
        Ok(())
    } else {
        Err(anyhow!(capability
            .denial_reason()
            .message_for(Some(actor.role))))
    }
}
