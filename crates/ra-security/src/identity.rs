//! ---
//! ra_section: "02-security-access-control"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Roles, authorization decisions, identity, and session handling."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::rbac::Role;

/// Numeric identifier of a user account.
pub type UserId = u32;

/// Whether an account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Account is active.
    Aktif,
    /// Account is disabled; sign-in is refused.
    NonAktif,
}

/// Representation of a user within the identity store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Stable numeric identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// SHA-256 hex digest of the password.
    pub password_hash: String,
    /// Display name.
    pub nama_lengkap: String,
    /// Division the user belongs to.
    pub divisi: String,
    /// Dashboard role.
    pub role: Role,
    /// Account status.
    pub status: UserStatus,
}

impl User {
    /// Construct an active account from a plaintext password.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        password: &str,
        nama_lengkap: impl Into<String>,
        divisi: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: hash_password(password),
            nama_lengkap: nama_lengkap.into(),
            divisi: divisi.into(),
            role,
            status: UserStatus::Aktif,
        }
    }

    /// Same account with a different status.
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the account may sign in.
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Aktif
    }

    /// Projection without the password digest.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            nama_lengkap: self.nama_lengkap.clone(),
            divisi: self.divisi.clone(),
            role: self.role,
            status: self.status,
        }
    }

    fn password_matches(&self, password: &str) -> bool {
        self.password_hash == hash_password(password)
    }
}

/// Public view of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable numeric identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Display name.
    pub nama_lengkap: String,
    /// Division the user belongs to.
    pub divisi: String,
    /// Dashboard role.
    pub role: Role,
    /// Account status.
    pub status: UserStatus,
}

/// Errors returned by [`IdentityProvider::sign_in`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignInError {
    /// Unknown username or wrong password.
    #[error("Username atau password salah.")]
    InvalidCredentials,
    /// Account exists but is disabled.
    #[error("Akun Anda tidak aktif. Hubungi administrator.")]
    Inactive,
}

/// In-memory identity store.
#[derive(Debug, Default, Clone)]
pub struct IdentityProvider {
    users: Arc<RwLock<BTreeMap<UserId, User>>>,
}

impl IdentityProvider {
    /// Create an empty identity provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider pre-populated with the given accounts.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let provider = Self::new();
        for user in users {
            provider.upsert_user(user);
        }
        provider
    }

    /// Create or replace a user account.
    pub fn upsert_user(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    /// Retrieve a user by id.
    pub fn user(&self, id: UserId) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    /// Role of an account, if it exists and is active.
    pub fn active_role(&self, id: UserId) -> Option<Role> {
        self.users
            .read()
            .get(&id)
            .filter(|user| user.is_active())
            .map(|user| user.role)
    }

    /// All accounts ordered by id, without password digests.
    pub fn users(&self) -> Vec<UserProfile> {
        self.users.read().values().map(User::profile).collect()
    }

    /// Case-insensitive lookup by username.
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let needle = username.trim();
        self.users
            .read()
            .values()
            .find(|user| user.username.eq_ignore_ascii_case(needle))
            .cloned()
    }

    /// Check credentials and account status.
    pub fn sign_in(&self, username: &str, password: &str) -> Result<User, SignInError> {
        let Some(user) = self.find_by_username(username) else {
            debug!(username = %username.trim(), "sign-in for unknown username");
            return Err(SignInError::InvalidCredentials);
        };
        if !user.password_matches(password) {
            debug!(user_id = user.id, "sign-in with wrong password");
            return Err(SignInError::InvalidCredentials);
        }
        if !user.is_active() {
            warn!(user_id = user.id, "sign-in refused for inactive account");
            return Err(SignInError::Inactive);
        }
        Ok(user)
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> IdentityProvider {
        IdentityProvider::with_users([
            User::new(1, "admin", "admin123", "Administrator", "IT", Role::MasterUser),
            User::new(2, "legal", "legal123", "Siti", "Legal", Role::FungsiLegal),
            User::new(3, "lama", "lama123", "Dewi", "Operasional", Role::FullAkses)
                .with_status(UserStatus::NonAktif),
        ])
    }

    #[test]
    fn sign_in_accepts_valid_credentials() {
        let user = provider().sign_in(" Admin ", "admin123").unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.role, Role::MasterUser);
    }

    #[test]
    fn sign_in_rejects_wrong_password_and_unknown_user() {
        let provider = provider();
        assert_eq!(
            provider.sign_in("admin", "salah").unwrap_err(),
            SignInError::InvalidCredentials
        );
        assert_eq!(
            provider.sign_in("tidak-ada", "x").unwrap_err(),
            SignInError::InvalidCredentials
        );
    }

    #[test]
    fn inactive_accounts_cannot_sign_in() {
        let provider = provider();
        assert_eq!(
            provider.sign_in("lama", "lama123").unwrap_err(),
            SignInError::Inactive
        );
        assert_eq!(provider.active_role(3), None);
        assert_eq!(provider.active_role(2), Some(Role::FungsiLegal));
    }

    #[test]
    fn profiles_hide_password_digest() {
        let value = serde_json::to_value(provider().users()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert!(value[0].get("password_hash").is_none());
        assert_eq!(value[0]["role"], "MASTER_USER");
        assert_eq!(value[2]["status"], "NON_AKTIF");
    }
}
