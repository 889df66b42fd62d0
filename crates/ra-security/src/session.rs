//! ---
//! ra_section: "02-security-access-control"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Roles, authorization decisions, identity, and session handling."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Signed-in user persistence.
//!
//! The stored value is only the numeric user id; role and profile are looked
//! up again from the identity store on every read.

use parking_lot::RwLock;
use ra_common::storage::{KeyValueStore, StorageError};
use tracing::{debug, warn};

use crate::identity::UserId;

/// Session-scoped key (cleared with the browsing session).
pub const SESSION_KEY: &str = "ruang-arsip.session.userId";
/// Persistent key written for "remember me" sign-ins.
pub const REMEMBER_KEY: &str = "ruang-arsip.remember.userId";
/// Pre-split key still found in older local stores.
pub const LEGACY_KEY: &str = "ruang-arsip.userId";

/// Capability to read, write, and clear the signed-in user id.
pub trait SessionStore: Send + Sync {
    /// Currently signed-in user, if any. Storage failures read as signed out.
    fn read(&self) -> Option<UserId>;

    /// Record a sign-in. `persistent` selects "remember me" storage.
    fn write(&self, id: UserId, persistent: bool) -> Result<(), StorageError>;

    /// Forget the signed-in user.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Session store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<(UserId, bool)>>,
}

impl MemorySessionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current sign-in was persistent.
    pub fn is_persistent(&self) -> bool {
        matches!(*self.current.read(), Some((_, true)))
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Option<UserId> {
        self.current.read().map(|(id, _)| id)
    }

    fn write(&self, id: UserId, persistent: bool) -> Result<(), StorageError> {
        *self.current.write() = Some((id, persistent));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.current.write() = None;
        Ok(())
    }
}

/// Session store over a session-scoped and a persistent key/value store,
/// mirroring browser `sessionStorage` / `localStorage`.
#[derive(Debug)]
pub struct StorageSessionStore<S> {
    session: S,
    local: S,
}

impl<S: KeyValueStore> StorageSessionStore<S> {
    /// Wrap the two underlying stores.
    pub fn new(session: S, local: S) -> Self {
        Self { session, local }
    }

    fn migrate_legacy(&self) -> Result<(), StorageError> {
        let Some(legacy) = self.local.get(LEGACY_KEY)? else {
            return Ok(());
        };
        if self.local.get(REMEMBER_KEY)?.is_none() && parse_user_id(&legacy).is_some() {
            self.local.set(REMEMBER_KEY, legacy.trim())?;
            debug!("legacy session key migrated to remember key");
        }
        self.local.remove(LEGACY_KEY)
    }

    fn read_key(store: &S, key: &str) -> Result<Option<UserId>, StorageError> {
        let Some(raw) = store.get(key)? else {
            return Ok(None);
        };
        match parse_user_id(&raw) {
            Some(id) => Ok(Some(id)),
            None => {
                warn!(key, "discarding non-numeric session value");
                store.remove(key)?;
                Ok(None)
            }
        }
    }

    fn try_read(&self) -> Result<Option<UserId>, StorageError> {
        self.migrate_legacy()?;
        if let Some(id) = Self::read_key(&self.session, SESSION_KEY)? {
            return Ok(Some(id));
        }
        Self::read_key(&self.local, REMEMBER_KEY)
    }
}

impl<S: KeyValueStore> SessionStore for StorageSessionStore<S> {
    fn read(&self) -> Option<UserId> {
        match self.try_read() {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "session storage unreadable; treating as signed out");
                None
            }
        }
    }

    fn write(&self, id: UserId, persistent: bool) -> Result<(), StorageError> {
        let value = id.to_string();
        if persistent {
            self.local.set(REMEMBER_KEY, &value)?;
            self.session.remove(SESSION_KEY)?;
        } else {
            self.session.set(SESSION_KEY, &value)?;
            self.local.remove(REMEMBER_KEY)?;
        }
        self.local.remove(LEGACY_KEY)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.session.remove(SESSION_KEY)?;
        self.local.remove(REMEMBER_KEY)?;
        self.local.remove(LEGACY_KEY)
    }
}

fn parse_user_id(raw: &str) -> Option<UserId> {
    raw.trim().parse::<UserId>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra_common::storage::{FileStore, MemoryStore};
    use std::sync::Arc;

    fn stores() -> (Arc<MemoryStore>, Arc<MemoryStore>, StorageSessionStore<Arc<MemoryStore>>) {
        let session = Arc::new(MemoryStore::new());
        let local = Arc::new(MemoryStore::new());
        let store = StorageSessionStore::new(session.clone(), local.clone());
        (session, local, store)
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.read(), None);
        store.write(4, true).unwrap();
        assert_eq!(store.read(), Some(4));
        assert!(store.is_persistent());
        store.clear().unwrap();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn non_persistent_write_uses_session_key_only() {
        let (session, local, store) = stores();
        local.set(REMEMBER_KEY, "9").unwrap();
        store.write(2, false).unwrap();
        assert_eq!(session.get(SESSION_KEY).unwrap().as_deref(), Some("2"));
        assert!(local.get(REMEMBER_KEY).unwrap().is_none());
        assert_eq!(store.read(), Some(2));
    }

    #[test]
    fn persistent_write_uses_remember_key_only() {
        let (session, local, store) = stores();
        session.set(SESSION_KEY, "9").unwrap();
        store.write(3, true).unwrap();
        assert!(session.get(SESSION_KEY).unwrap().is_none());
        assert_eq!(local.get(REMEMBER_KEY).unwrap().as_deref(), Some("3"));
        assert_eq!(store.read(), Some(3));
    }

    #[test]
    fn legacy_key_is_migrated_and_removed() {
        let (_session, local, store) = stores();
        local.set(LEGACY_KEY, " 5 ").unwrap();
        assert_eq!(store.read(), Some(5));
        assert!(local.get(LEGACY_KEY).unwrap().is_none());
        assert_eq!(local.get(REMEMBER_KEY).unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn legacy_key_does_not_override_current_value() {
        let (_session, local, store) = stores();
        local.set(REMEMBER_KEY, "1").unwrap();
        local.set(LEGACY_KEY, "7").unwrap();
        assert_eq!(store.read(), Some(1));
        assert!(local.get(LEGACY_KEY).unwrap().is_none());
    }

    #[test]
    fn garbage_values_are_discarded() {
        let (session, _local, store) = stores();
        session.set(SESSION_KEY, "bukan-angka").unwrap();
        assert_eq!(store.read(), None);
        assert!(session.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn clear_removes_every_key() {
        let (session, local, store) = stores();
        store.write(1, false).unwrap();
        local.set(REMEMBER_KEY, "1").unwrap();
        store.clear().unwrap();
        assert!(session.is_empty());
        assert!(local.is_empty());
        assert_eq!(store.read(), None);
    }

    #[test]
    fn corrupt_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let session_path = dir.path().join("session.json");
        std::fs::write(&session_path, "][").unwrap();
        let store = StorageSessionStore::new(
            FileStore::new(session_path),
            FileStore::new(dir.path().join("local.json")),
        );
        assert_eq!(store.read(), None);
    }
}
