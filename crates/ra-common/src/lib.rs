//! ---
//! ra_section: "01-core-functionality"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Shared primitives and utilities for the archive runtime."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Core shared primitives for the Ruwang Arsip workspace.
//! This crate exposes configuration loading, tracing setup, the key/value
//! storage abstraction used for persisted client state, and user-facing
//! notices consumed across the workspace.

pub mod config;
pub mod logging;
pub mod notice;
pub mod storage;

pub use config::{
    ApiConfig, AppConfig, AuditConfig, LoadedAppConfig, LoggingConfig, SessionConfig,
    StorageConfig,
};
pub use logging::{init_cli, init_tracing, LogFormat};
pub use notice::{Notice, NoticeLevel};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
