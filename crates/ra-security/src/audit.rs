//! ---
//! ra_section: "02-security-access-control"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Roles, authorization decisions, identity, and session handling."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::authorizer::ReasonCode;

const GENESIS_HASH_LEN: usize = 64;

/// Security-relevant events written to the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEvent {
    /// Successful sign-in.
    SignIn {
        /// Remember-me sign-in.
        persistent: bool,
    },
    /// Rejected sign-in attempt.
    SignInFailed {
        /// Reason text from the identity store.
        reason: String,
    },
    /// Sign-out.
    SignOut,
    /// Authorizer denied a route or action.
    AccessDenied {
        /// Path or action name.
        target: String,
        /// Reason reported by the authorizer.
        reason: ReasonCode,
    },
    /// Workflow record moved between states.
    Transition {
        /// Entity kind, e.g. `disposisi`.
        entity: String,
        /// Record identifier.
        id: u32,
        /// Previous state.
        from: String,
        /// New state.
        to: String,
    },
    /// Master data replaced or reset.
    MasterDataChanged {
        /// Short description of the change.
        change: String,
    },
}

impl AuditEvent {
    /// Dotted action name stored in the entry.
    pub fn action(&self) -> String {
        match self {
            AuditEvent::SignIn { .. } => "auth.sign_in".into(),
            AuditEvent::SignInFailed { .. } => "auth.sign_in_failed".into(),
            AuditEvent::SignOut => "auth.sign_out".into(),
            AuditEvent::AccessDenied { .. } => "access.denied".into(),
            AuditEvent::Transition { entity, .. } => format!("{entity}.transition"),
            AuditEvent::MasterDataChanged { .. } => "master_data.changed".into(),
        }
    }

    fn metadata(&self) -> serde_json::Value {
        match self {
            AuditEvent::SignIn { persistent } => json!({ "persistent": persistent }),
            AuditEvent::SignInFailed { reason } => json!({ "reason": reason }),
            AuditEvent::SignOut => json!({}),
            AuditEvent::AccessDenied { target, reason } => {
                json!({ "target": target, "reason": reason })
            }
            AuditEvent::Transition { id, from, to, .. } => {
                json!({ "id": id, "from": from, "to": to })
            }
            AuditEvent::MasterDataChanged { change } => json!({ "change": change }),
        }
    }
}

/// One line of the audit file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Timestamp when the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Username responsible for the event, or `anonymous`.
    pub actor: String,
    /// Dotted event name, e.g. `auth.sign_in` or `disposisi.transition`.
    pub action: String,
    /// Event details.
    pub metadata: serde_json::Value,
    /// Hex SHA-256 over the fields above and `previous_hash`.
    pub hash: String,
    /// Hash of the preceding entry; all zeros for the first one.
    pub previous_hash: String,
}

impl AuditEntry {
    fn chained(
        previous_hash: &str,
        actor: &str,
        action: &str,
        metadata: serde_json::Value,
    ) -> Self {
        let mut entry = Self {
            timestamp: Utc::now(),
            actor: actor.to_owned(),
            action: action.to_owned(),
            metadata,
            hash: String::new(),
            previous_hash: previous_hash.to_owned(),
        };
        entry.hash = entry.digest();
        entry
    }

    fn digest(&self) -> String {
        let nanos = self.timestamp.timestamp_nanos_opt().unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(nanos.to_be_bytes());
        for part in [&self.actor, &self.action] {
            hasher.update(part.as_bytes());
        }
        hasher.update(self.metadata.to_string().as_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn genesis() -> String {
    "0".repeat(GENESIS_HASH_LEN)
}

/// Append-only audit trail stored as newline-delimited JSON. Each entry
/// commits to its predecessor, so edits anywhere in the file break the chain.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    head: String,
}

impl AuditLog {
    /// Open the log at `path`, creating parent directories. The newest
    /// entry on disk becomes the chain head.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
                .with_context(|| format!("unable to create audit directory {}", dir.display()))?,
            _ => {}
        }
        let head = load_entries(&path)?
            .pop()
            .map_or_else(genesis, |entry| entry.hash);
        Ok(Self { path, head })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event on behalf of `actor`.
    pub fn record(&mut self, actor: &str, event: &AuditEvent) -> Result<AuditEntry> {
        self.append(actor, &event.action(), event.metadata())
    }

    /// Append an entry with a free-form action name.
    pub fn append(
        &mut self,
        actor: &str,
        action: &str,
        metadata: serde_json::Value,
    ) -> Result<AuditEntry> {
        let entry = AuditEntry::chained(&self.head, actor, action, metadata);
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| {
                file.write_all(line.as_bytes())?;
                file.flush()
            })
            .with_context(|| format!("unable to append to audit log {}", self.path.display()))?;
        self.head.clone_from(&entry.hash);
        Ok(entry)
    }

    /// All entries currently on disk, oldest first.
    pub fn entries(&self) -> Result<Vec<AuditEntry>> {
        load_entries(&self.path)
    }

    /// Index of the first entry whose hash or back-link does not match.
    pub fn first_broken(&self) -> Result<Option<usize>> {
        let mut expected_previous = genesis();
        for (index, entry) in load_entries(&self.path)?.into_iter().enumerate() {
            if entry.previous_hash != expected_previous || entry.digest() != entry.hash {
                return Ok(Some(index));
            }
            expected_previous = entry.hash;
        }
        Ok(None)
    }

    /// True when the whole chain is intact.
    pub fn verify(&self) -> Result<bool> {
        Ok(self.first_broken()?.is_none())
    }
}

fn load_entries(path: &Path) -> Result<Vec<AuditEntry>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("unable to open audit log {}", path.display()))
        }
    };
    let mut entries = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).with_context(|| {
            format!("malformed audit entry at {}:{}", path.display(), number + 1)
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};
    use tempfile::tempdir;

    #[test]
    fn events_are_chained_and_named() {
        let dir = tempdir().unwrap();
        let mut log = AuditLog::open(dir.path().join("audit").join("audit.log")).unwrap();
        let first = log
            .record("legal", &AuditEvent::SignIn { persistent: false })
            .unwrap();
        let second = log
            .record(
                "legal",
                &AuditEvent::Transition {
                    entity: "disposisi".into(),
                    id: 2,
                    from: "Pending".into(),
                    to: "Approved".into(),
                },
            )
            .unwrap();
        assert_eq!(first.action, "auth.sign_in");
        assert_eq!(second.action, "disposisi.transition");
        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(second.metadata["to"], "Approved");
        assert!(log.verify().unwrap());

        let reopened = AuditLog::open(log.path()).unwrap();
        assert_eq!(reopened.entries().unwrap().len(), 2);
    }

    #[test]
    fn audit_log_detects_tampering() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let mut log = AuditLog::open(&path).unwrap();
        log.record(
            "restrict",
            &AuditEvent::AccessDenied {
                target: "/dashboard/users".into(),
                reason: ReasonCode::UserManagementOnly,
            },
        )
        .unwrap();
        log.record("admin", &AuditEvent::SignOut).unwrap();
        assert!(log.verify().unwrap());

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        let mut entries: Vec<serde_json::Value> = contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        entries[0]["metadata"]["reason"] = serde_json::json!("LEGAL_ONLY");
        file.set_len(0).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        for value in entries {
            file.write_all(value.to_string().as_bytes()).unwrap();
            file.write_all(b"\n").unwrap();
        }
        let reopened = AuditLog::open(&path).unwrap();
        assert!(!reopened.verify().unwrap());
        assert_eq!(reopened.first_broken().unwrap(), Some(0));
    }
}
