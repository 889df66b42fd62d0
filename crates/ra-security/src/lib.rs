//! ---
//! ra_section: "02-security-access-control"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Roles, authorization decisions, identity, and session handling."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
#![warn(missing_docs)]

pub mod audit;
pub mod authorizer;
pub mod identity;
pub mod metrics;
pub mod rbac;
pub mod session;

pub use audit::{AuditEntry, AuditEvent, AuditLog};
pub use authorizer::{
    authorize_action, authorize_with, decide, normalize_path, Authorize, Decision, ReasonCode,
    RouteAuthorizer,
};
pub use identity::{IdentityProvider, SignInError, User, UserId, UserProfile, UserStatus};
pub use metrics::SecurityMetrics;
pub use rbac::{can_view_data_by_level, Capability, LevelAkses, Role};
pub use session::{MemorySessionStore, SessionStore, StorageSessionStore};
