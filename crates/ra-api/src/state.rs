//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Dashboard REST API and its authorizer guard."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::http::{header, HeaderMap};
use parking_lot::{Mutex, RwLock};
use prometheus::Registry;
use ra_archive::{ArchiveState, MasterDataStore};
use ra_common::config::{AppConfig, SessionConfig};
use ra_common::storage::{FileStore, KeyValueStore};
use ra_security::{
    AuditEvent, AuditLog, Authorize, IdentityProvider, RouteAuthorizer, SecurityMetrics, User,
    UserId,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Server-side bearer session.
#[derive(Debug, Clone, Copy)]
struct BearerSession {
    user_id: UserId,
    ttl: Duration,
    expires_at: Instant,
}

/// Shared API state exposed to handlers.
pub struct ApiState {
    identity: IdentityProvider,
    archive: ArchiveState,
    master_data: MasterDataStore<Arc<dyn KeyValueStore>>,
    authorizer: Arc<dyn Authorize>,
    sessions: RwLock<HashMap<Uuid, BearerSession>>,
    idle_timeout: Duration,
    remember_timeout: Duration,
    audit: Option<Mutex<AuditLog>>,
    metrics: SecurityMetrics,
}

impl ApiState {
    pub fn new(
        identity: IdentityProvider,
        archive: ArchiveState,
        master_store: Arc<dyn KeyValueStore>,
        metrics: SecurityMetrics,
    ) -> Self {
        let defaults = SessionConfig::default();
        Self {
            identity,
            archive,
            master_data: MasterDataStore::new(master_store),
            authorizer: Arc::new(RouteAuthorizer),
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: defaults.idle_timeout,
            remember_timeout: defaults.remember_timeout,
            audit: None,
            metrics,
        }
    }

    /// Seeded state wired from configuration: file-backed master data under
    /// the storage directory, audit log when enabled, session timeouts.
    pub fn from_config(config: &AppConfig, identity: IdentityProvider) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics =
            SecurityMetrics::new(registry).context("failed to register security metrics")?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage.local_file()));
        let mut state = Self::new(identity, ArchiveState::seeded(), store, metrics)
            .with_session_timeouts(config.session.idle_timeout, config.session.remember_timeout);
        if config.audit.enabled {
            let log = AuditLog::open(&config.audit.path).with_context(|| {
                format!("unable to open audit log {}", config.audit.path.display())
            })?;
            state = state.with_audit(log);
        }
        Ok(state)
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorize>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_audit(mut self, log: AuditLog) -> Self {
        self.audit = Some(Mutex::new(log));
        self
    }

    /// Both timeouts are capped at [`SessionConfig::MAX_TIMEOUT`].
    pub fn with_session_timeouts(mut self, idle: Duration, remember: Duration) -> Self {
        self.idle_timeout = idle.min(SessionConfig::MAX_TIMEOUT);
        self.remember_timeout = remember.min(SessionConfig::MAX_TIMEOUT);
        self
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    pub fn archive(&self) -> &ArchiveState {
        &self.archive
    }

    pub fn master_data(&self) -> &MasterDataStore<Arc<dyn KeyValueStore>> {
        &self.master_data
    }

    pub fn authorizer(&self) -> &dyn Authorize {
        self.authorizer.as_ref()
    }

    pub fn metrics(&self) -> &SecurityMetrics {
        &self.metrics
    }

    /// Open a bearer session; remembered sessions get the longer timeout.
    pub fn open_session(&self, user_id: UserId, remember: bool) -> (Uuid, Duration) {
        let ttl = if remember {
            self.remember_timeout
        } else {
            self.idle_timeout
        };
        let token = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        let pruned = before - sessions.len();
        sessions.insert(
            token,
            BearerSession {
                user_id,
                ttl,
                expires_at: now + ttl,
            },
        );
        debug!(user_id, remember, pruned, "bearer session opened");
        (token, ttl)
    }

    /// Sessions currently held, expired ones included until the next login
    /// prunes them.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn close_session(&self, token: Uuid) -> Option<UserId> {
        self.sessions.write().remove(&token).map(|s| s.user_id)
    }

    /// Resolve a token to an active user, sliding its expiry forward.
    /// Expired tokens and tokens of disabled accounts are dropped.
    pub fn resolve_session(&self, token: Uuid) -> Option<User> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&token)?;
        let now = Instant::now();
        if now >= session.expires_at {
            sessions.remove(&token);
            debug!("bearer session expired");
            return None;
        }
        match self.identity.user(session.user_id).filter(User::is_active) {
            Some(user) => {
                session.expires_at = now + session.ttl;
                Some(user)
            }
            None => {
                sessions.remove(&token);
                None
            }
        }
    }

    /// Signed-in user for the request, from `Authorization: Bearer <token>`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<User> {
        bearer_token(headers).and_then(|token| self.resolve_session(token))
    }

    /// Append to the audit log when one is configured. Failures are logged
    /// and never fail the request.
    pub fn audit(&self, actor: &str, event: AuditEvent) {
        let Some(log) = &self.audit else {
            return;
        };
        if let Err(err) = log.lock().record(actor, &event) {
            warn!(error = %err, action = %event.action(), "failed to append audit entry");
        }
    }
}

impl fmt::Debug for ApiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiState")
            .field("sessions", &self.session_count())
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?;
    Uuid::parse_str(token.trim()).ok()
}

#[cfg(test)]
mod tests {
    use ra_archive::seed;
    use ra_common::storage::MemoryStore;

    use super::*;

    fn state(idle: Duration, remember: Duration) -> ApiState {
        let metrics = SecurityMetrics::new(Arc::new(Registry::new())).unwrap();
        ApiState::new(
            IdentityProvider::with_users(seed::users()),
            ArchiveState::new(),
            Arc::new(MemoryStore::new()),
            metrics,
        )
        .with_session_timeouts(idle, remember)
    }

    #[test]
    fn next_login_prunes_abandoned_sessions() {
        let state = state(Duration::ZERO, Duration::from_secs(60));
        let (abandoned, _) = state.open_session(2, false);
        state.open_session(3, true);
        assert_eq!(state.session_count(), 1);
        assert!(state.resolve_session(abandoned).is_none());
    }

    #[test]
    fn live_sessions_survive_pruning() {
        let state = state(Duration::from_secs(60), Duration::from_secs(120));
        let (first, _) = state.open_session(2, false);
        state.open_session(3, false);
        assert_eq!(state.session_count(), 2);
        assert_eq!(state.resolve_session(first).map(|u| u.id), Some(2));
    }

    #[test]
    fn oversized_timeouts_are_capped() {
        let state = state(Duration::MAX, Duration::MAX);
        let (token, ttl) = state.open_session(1, true);
        assert_eq!(ttl, SessionConfig::MAX_TIMEOUT);
        assert!(state.resolve_session(token).is_some());
    }
}
