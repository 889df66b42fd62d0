//! ---
//! ra_section: "02-security-access-control"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Roles, authorization decisions, identity, and session handling."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Route and action authorizer.
//!
//! [`decide`] maps a role and a dashboard path to an allow/deny decision by
//! walking [`ROUTE_RULES`] in order; the first matching rule wins, so more
//! specific sub-paths are listed before their parents. Everything here is a
//! pure function of its inputs.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::rbac::{Capability, Role};

const DASHBOARD_ROOT: &str = "/dashboard";

/// Why an authorization request was denied.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Caller is not signed in.
    AuthRequired,
    /// Route needs the restricted-data capability.
    RestrictDataOnly,
    /// Route needs the non-restricted-data capability.
    NonRestrictDataOnly,
    /// Route needs digital archive access.
    DigitalArchiveOnly,
    /// Route needs digital archive administration.
    DigitalArchiveAdminOnly,
    /// Route or action needs the legal capability.
    LegalOnly,
    /// Route needs user management.
    UserManagementOnly,
    /// Path under the dashboard that no rule recognises.
    UnknownRouteDenied,
}

impl ReasonCode {
    /// Toast text shown to the user when access is denied.
    pub fn message(self) -> &'static str {
        match self {
            ReasonCode::AuthRequired => "Silakan login terlebih dahulu untuk mengakses halaman ini.",
            ReasonCode::RestrictDataOnly => {
                "Halaman ini hanya dapat diakses oleh pengguna dengan akses data restrict."
            }
            ReasonCode::NonRestrictDataOnly => {
                "Halaman ini hanya dapat diakses oleh pengguna dengan akses data non-restrict."
            }
            ReasonCode::DigitalArchiveOnly => "Anda tidak memiliki akses ke modul Arsip Digital.",
            ReasonCode::DigitalArchiveAdminOnly => {
                "Hanya admin Arsip Digital yang dapat membuka halaman ini."
            }
            ReasonCode::LegalOnly => "Fitur ini hanya tersedia untuk Fungsi Legal.",
            ReasonCode::UserManagementOnly => "Hanya Master User yang dapat mengelola pengguna.",
            ReasonCode::UnknownRouteDenied => {
                "Halaman tidak dikenal atau Anda tidak memiliki akses."
            }
        }
    }

    /// Message that names the caller's role, used for signed-in denials.
    pub fn message_for(self, role: Option<Role>) -> String {
        match role {
            Some(role) if self != ReasonCode::AuthRequired => {
                format!("{} (peran Anda: {})", self.message(), role.label())
            }
            _ => self.message().to_owned(),
        }
    }

    /// Callers should send the user to the login page rather than show a toast only.
    pub fn requires_login(self) -> bool {
        self == ReasonCode::AuthRequired
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "DecisionBody", from = "DecisionBody")]
pub enum Decision {
    /// Access granted.
    Allowed,
    /// Access denied with a reason.
    Denied(ReasonCode),
}

impl Decision {
    /// True for [`Decision::Allowed`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(reason) => Some(*reason),
        }
    }

    fn require(role: Role, capability: Capability) -> Self {
        if capability.allows(role) {
            Decision::Allowed
        } else {
            Decision::Denied(capability.denial_reason())
        }
    }
}

/// Wire shape `{allowed: true}` / `{allowed: false, reason: "..."}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DecisionBody {
    allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<ReasonCode>,
}

impl From<Decision> for DecisionBody {
    fn from(decision: Decision) -> Self {
        Self {
            allowed: decision.is_allowed(),
            reason: decision.reason(),
        }
    }
}

impl From<DecisionBody> for Decision {
    fn from(body: DecisionBody) -> Self {
        if body.allowed {
            Decision::Allowed
        } else {
            Decision::Denied(body.reason.unwrap_or(ReasonCode::UnknownRouteDenied))
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PathMatch {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathMatch {
    fn matches(self, path: &str) -> bool {
        match self {
            PathMatch::Exact(target) => path == target,
            PathMatch::Prefix(prefix) => {
                path == prefix
                    || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RuleOutcome {
    Allow,
    Require(Capability),
    Deny(ReasonCode),
}

#[derive(Debug, Clone, Copy)]
struct RouteRule {
    path: PathMatch,
    outcome: RuleOutcome,
}

const fn rule(path: PathMatch, outcome: RuleOutcome) -> RouteRule {
    RouteRule { path, outcome }
}

/// Dashboard rules in priority order. Only consulted for signed-in callers on
/// paths under `/dashboard`.
const ROUTE_RULES: &[RouteRule] = {
    use Capability::*;
    use PathMatch::*;
    use RuleOutcome::*;
    &[
        rule(Exact("/dashboard"), Allow),
        rule(Prefix("/dashboard/profil"), Allow),
        rule(Prefix("/dashboard/users"), Require(ManageUsers)),
        rule(Prefix("/dashboard/legal"), Require(AccessLegalModule)),
        rule(Prefix("/dashboard/surat"), Allow),
        rule(
            Prefix("/dashboard/informasi-debitur/admin/upload-restrik"),
            Require(AccessRestrictData),
        ),
        rule(
            Prefix("/dashboard/informasi-debitur/admin/upload"),
            Require(AccessNonRestrictData),
        ),
        rule(Prefix("/dashboard/informasi-debitur"), Allow),
        rule(
            Prefix("/dashboard/arsip-digital/peminjaman/accept"),
            Require(ApproveLegal),
        ),
        rule(Exact("/dashboard/arsip-digital"), Require(AccessDigitalArchive)),
        rule(
            Prefix("/dashboard/arsip-digital/dokumen"),
            Require(AccessDigitalArchive),
        ),
        rule(
            Prefix("/dashboard/arsip-digital/peminjaman"),
            Require(AccessDigitalArchive),
        ),
        rule(
            Prefix("/dashboard/arsip-digital/disposisi"),
            Require(AccessDigitalArchive),
        ),
        rule(
            Prefix("/dashboard/arsip-digital/pencarian"),
            Require(AccessDigitalArchive),
        ),
        rule(
            Prefix("/dashboard/arsip-digital"),
            Require(AccessDigitalArchiveAdmin),
        ),
        rule(Prefix("/dashboard"), Deny(ReasonCode::UnknownRouteDenied)),
    ]
};

/// Canonical form of a request path: query and fragment dropped, empty and
/// trailing segments collapsed. Always starts with `/`.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let segments: Vec<&str> = path[..end].split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_owned();
    }
    let mut normalized = String::with_capacity(end + 1);
    for segment in segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    normalized
}

/// Decide whether `role` may open `path`.
pub fn decide(role: Option<Role>, path: &str) -> Decision {
    let path = normalize_path(path);
    if !PathMatch::Prefix(DASHBOARD_ROOT).matches(&path) {
        return Decision::Allowed;
    }
    let Some(role) = role else {
        return Decision::Denied(ReasonCode::AuthRequired);
    };
    let outcome = ROUTE_RULES
        .iter()
        .find(|rule| rule.path.matches(&path))
        .map(|rule| rule.outcome)
        .unwrap_or(RuleOutcome::Deny(ReasonCode::UnknownRouteDenied));
    match outcome {
        RuleOutcome::Allow => Decision::Allowed,
        RuleOutcome::Require(capability) => Decision::require(role, capability),
        RuleOutcome::Deny(reason) => Decision::Denied(reason),
    }
}

/// Action-level check against a named capability.
pub fn authorize_action(role: Option<Role>, capability: Capability) -> Decision {
    match role {
        None => Decision::Denied(ReasonCode::AuthRequired),
        Some(role) => Decision::require(role, capability),
    }
}

/// Action-level check against an arbitrary predicate, reporting `reason` on denial.
pub fn authorize_with<F>(role: Option<Role>, predicate: F, reason: ReasonCode) -> Decision
where
    F: Fn(Role) -> bool,
{
    match role {
        None => Decision::Denied(ReasonCode::AuthRequired),
        Some(role) if predicate(role) => Decision::Allowed,
        Some(_) => Decision::Denied(reason),
    }
}

/// Injectable authorization seam for boundary components (API guard, CLI).
pub trait Authorize: Send + Sync {
    /// Route-level decision.
    fn decide(&self, role: Option<Role>, path: &str) -> Decision;

    /// Action-level decision.
    fn authorize_action(&self, role: Option<Role>, capability: Capability) -> Decision;
}

/// The built-in rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteAuthorizer;

impl Authorize for RouteAuthorizer {
    fn decide(&self, role: Option<Role>, path: &str) -> Decision {
        decide(role, path)
    }

    fn authorize_action(&self, role: Option<Role>, capability: Capability) -> Decision {
        authorize_action(role, capability)
    }
}
