//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "binary"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Control CLI for administrators interacting with Ruwang Arsip."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Shared command context: configuration, local stores, and output rendering.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use ra_archive::{seed, Actor, MasterDataStore};
use ra_common::config::AppConfig;
use ra_common::storage::FileStore;
use ra_security::{IdentityProvider, SessionStore, StorageSessionStore, User};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

pub struct Context {
    pub config: AppConfig,
    pub identity: IdentityProvider,
    pub output: OutputFormat,
}

impl Context {
    pub fn load(config: Option<&Path>, output: OutputFormat) -> Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = config {
            candidates.push(path.to_path_buf());
        }
        candidates.push(PathBuf::from("configs/example.prod.toml"));
        candidates.push(PathBuf::from("configs/example.dev.toml"));
        let loaded = AppConfig::load_or_default(&candidates)?;
        Ok(Self {
            config: loaded.config,
            identity: IdentityProvider::with_users(seed::users()),
            output,
        })
    }

    pub fn sessions(&self) -> StorageSessionStore<FileStore> {
        StorageSessionStore::new(
            FileStore::new(self.config.storage.session_file()),
            FileStore::new(self.config.storage.local_file()),
        )
    }

    pub fn master_data(&self) -> MasterDataStore<FileStore> {
        MasterDataStore::new(FileStore::new(self.config.storage.local_file()))
    }

    /// Active account recorded by `login`, if any.
    pub fn current_user(&self) -> Option<User> {
        let id = self.sessions().read()?;
        self.identity.user(id).filter(User::is_active)
    }

    pub fn require_actor(&self) -> Result<Actor> {
        self.current_user()
            .map(|user| Actor::from(&user))
            .ok_or_else(|| anyhow!("not signed in; run `ra-arsipctl login` first"))
    }

    /// Print `value` as JSON/YAML, or fall back to `text` for the text format.
    pub fn render<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        match self.output {
            OutputFormat::Text => println!("{}", text()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        }
        Ok(())
    }
}
