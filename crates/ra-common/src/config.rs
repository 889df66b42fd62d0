//! ---
//! ra_section: "01-core-functionality"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Shared primitives and utilities for the archive runtime."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/ruang-arsip/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_storage_directory() -> PathBuf {
    PathBuf::from("target/ruang-arsip/storage")
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(8 * 60 * 60)
}

fn default_remember_timeout() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("target/ruang-arsip/audit.log")
}

/// Primary configuration object for the archive dashboard back end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// An [`AppConfig`] together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and defaults are in effect.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "RA_CONFIG";

    /// Load the first configuration found, `RA_CONFIG` taking precedence
    /// over `candidates`.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Self::load_with_source(candidates).map(|loaded| loaded.config)
    }

    /// Like [`AppConfig::load`], keeping the path that was read.
    /// Errors when nothing is found.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        Self::locate(candidates)?.ok_or_else(|| {
            let inspected: Vec<String> = candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect();
            anyhow!("no configuration file among [{}]", inspected.join(", "))
        })
    }

    /// Defaults when nothing is found. A file that exists but fails to
    /// parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        let loaded = Self::locate(candidates)?.unwrap_or_else(|| {
            debug!("no configuration file found; using defaults");
            LoadedAppConfig {
                config: AppConfig::default(),
                source: None,
            }
        });
        Ok(loaded)
    }

    fn locate<P: AsRef<Path>>(candidates: &[P]) -> Result<Option<LoadedAppConfig>> {
        let from_env = std::env::var_os(Self::ENV_CONFIG_PATH)
            .filter(|value| !value.to_string_lossy().trim().is_empty())
            .map(PathBuf::from);
        let chosen = from_env.or_else(|| {
            candidates
                .iter()
                .map(|c| c.as_ref())
                .find(|c| c.exists())
                .map(Path::to_path_buf)
        });
        chosen
            .map(|path| {
                Self::from_path(&path).map(|config| LoadedAppConfig {
                    config,
                    source: Some(path),
                })
            })
            .transpose()
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "reading configuration");
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        raw.parse()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.storage.directory.as_os_str().is_empty() {
            return Err(anyhow!("storage.directory must not be empty"));
        }
        self.session.validate()?;
        if self.audit.enabled && self.audit.path.as_os_str().is_empty() {
            return Err(anyhow!("audit.path must be set when auditing is enabled"));
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("malformed TOML")?;
        config.validate().map(|()| config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_listen")]
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            listen: default_api_listen(),
        }
    }
}

/// Location of the file-backed key/value stores (session ids, master data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_directory")]
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
        }
    }
}

impl StorageConfig {
    /// File mirroring browser session storage (cleared on sign-out).
    pub fn session_file(&self) -> PathBuf {
        self.directory.join("session.json")
    }

    /// File mirroring browser local storage (remember-me, master data).
    pub fn local_file(&self) -> PathBuf {
        self.directory.join("local.json")
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub idle_timeout: Duration,
    #[serde(default = "default_remember_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub remember_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: default_idle_timeout(),
            remember_timeout: default_remember_timeout(),
        }
    }
}

impl SessionConfig {
    /// Upper bound for either timeout.
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(366 * 24 * 60 * 60);

    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout.is_zero() {
            return Err(anyhow!("session.idle_timeout must be greater than zero"));
        }
        if self.remember_timeout > Self::MAX_TIMEOUT {
            return Err(anyhow!(
                "session.remember_timeout ({}s) exceeds the maximum of {}s",
                self.remember_timeout.as_secs(),
                Self::MAX_TIMEOUT.as_secs()
            ));
        }
        if self.remember_timeout < self.idle_timeout {
            return Err(anyhow!(
                "session.remember_timeout ({}s) must not be shorter than idle_timeout ({}s)",
                self.remember_timeout.as_secs(),
                self.idle_timeout.as_secs()
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: default_audit_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_str("").unwrap();
        assert!(config.api.enabled);
        assert_eq!(config.api.listen, default_api_listen());
        assert_eq!(config.session.idle_timeout, Duration::from_secs(28_800));
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
    }

    #[test]
    fn parses_sections_and_durations() {
        let config = AppConfig::from_str(
            r#"
            [api]
            listen = "0.0.0.0:9000"

            [storage]
            directory = "/var/lib/ruang-arsip"

            [session]
            idle_timeout = 600
            remember_timeout = 3600

            [logging]
            format = "pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.listen.port(), 9000);
        assert_eq!(config.session.idle_timeout, Duration::from_secs(600));
        assert_eq!(
            config.storage.session_file(),
            PathBuf::from("/var/lib/ruang-arsip/session.json")
        );
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_remember_shorter_than_idle() {
        let err = AppConfig::from_str(
            r#"
            [session]
            idle_timeout = 600
            remember_timeout = 60
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("remember_timeout"));
    }

    #[test]
    fn rejects_unbounded_remember_timeout() {
        let err = AppConfig::from_str("[session]\nremember_timeout = 100000000\n")
            .unwrap_err();
        assert!(err.to_string().contains("maximum"), "{err}");
    }

    #[test]
    fn load_or_default_without_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let loaded = AppConfig::load_or_default(&[missing]).unwrap();
        assert!(loaded.source.is_none());
    }

    #[test]
    fn load_with_source_reads_first_existing_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arsip.toml");
        fs::write(&path, "[api]\nenabled = false\n").unwrap();
        let loaded = AppConfig::load_with_source(&[dir.path().join("nope.toml"), path.clone()])
            .unwrap();
        assert_eq!(loaded.source, Some(path));
        assert!(!loaded.config.api.enabled);
    }
}
