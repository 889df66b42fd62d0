//! ---
//! ra_section: "02-security-access-control"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Roles, authorization decisions, identity, and session handling."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Roles and the capability predicates derived from them.
//!
//! There is no role hierarchy. Each capability lists the roles that hold it,
//! so `MASTER_USER` shows up in almost every list.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::authorizer::ReasonCode;

/// Dashboard role assigned to every user account.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Sees restricted and non-restricted data, approves legal workflows.
    FullAkses,
    /// Legal function: non-restricted data plus legal approvals.
    FungsiLegal,
    /// Restricted-data analyst without archive administration rights.
    AksesRestrict,
    /// Administrator; the only role allowed to manage users.
    MasterUser,
}

impl Role {
    /// Human readable label used in UI messages.
    pub fn label(self) -> &'static str {
        match self {
            Role::FullAkses => "Full Akses",
            Role::FungsiLegal => "Fungsi Legal",
            Role::AksesRestrict => "Akses Restrict",
            Role::MasterUser => "Master User",
        }
    }
}

/// Data-access classification carried by documents, debtors, and letters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelAkses {
    /// Sensitive data restricted to restrict-capable roles.
    Restrict,
    /// Regular data.
    NonRestrict,
}

/// Named capability checked by routes and actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// View and upload `RESTRICT` data.
    AccessRestrictData,
    /// View and upload `NON_RESTRICT` data.
    AccessNonRestrictData,
    /// Self-service digital archive pages.
    AccessDigitalArchive,
    /// Digital archive parameters and administration.
    AccessDigitalArchiveAdmin,
    /// Legal module pages.
    AccessLegalModule,
    /// Approve or reject dispositions and loans.
    ApproveLegal,
    /// User management pages.
    ManageUsers,
}

impl Capability {
    /// Roles holding the capability.
    pub fn roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Capability::AccessRestrictData => &[FullAkses, AksesRestrict, MasterUser],
            Capability::AccessNonRestrictData => &[FullAkses, FungsiLegal, MasterUser],
            Capability::AccessDigitalArchive => {
                &[FullAkses, FungsiLegal, AksesRestrict, MasterUser]
            }
            Capability::AccessDigitalArchiveAdmin => &[FullAkses, FungsiLegal, MasterUser],
            Capability::AccessLegalModule => &[FullAkses, FungsiLegal, MasterUser],
            Capability::ApproveLegal => &[FullAkses, FungsiLegal, MasterUser],
            Capability::ManageUsers => &[MasterUser],
        }
    }

    /// Whether `role` holds the capability.
    pub fn allows(self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// Reason reported when the capability is missing.
    pub fn denial_reason(self) -> ReasonCode {
        match self {
            Capability::AccessRestrictData => ReasonCode::RestrictDataOnly,
            Capability::AccessNonRestrictData => ReasonCode::NonRestrictDataOnly,
            Capability::AccessDigitalArchive => ReasonCode::DigitalArchiveOnly,
            Capability::AccessDigitalArchiveAdmin => ReasonCode::DigitalArchiveAdminOnly,
            Capability::AccessLegalModule | Capability::ApproveLegal => ReasonCode::LegalOnly,
            Capability::ManageUsers => ReasonCode::UserManagementOnly,
        }
    }
}

/// Role may see `RESTRICT` data.
pub fn can_access_restrict_data(role: Role) -> bool {
    Capability::AccessRestrictData.allows(role)
}

/// Role may see `NON_RESTRICT` data.
pub fn can_access_non_restrict_data(role: Role) -> bool {
    Capability::AccessNonRestrictData.allows(role)
}

/// Role may use the self-service digital archive pages.
pub fn can_access_digital_archive(role: Role) -> bool {
    Capability::AccessDigitalArchive.allows(role)
}

/// Role may administer the digital archive.
pub fn can_access_digital_archive_admin(role: Role) -> bool {
    Capability::AccessDigitalArchiveAdmin.allows(role)
}

/// Role may open the legal module.
pub fn can_access_legal_module(role: Role) -> bool {
    Capability::AccessLegalModule.allows(role)
}

/// Role may decide legal approvals (loan accept, disposition approve/reject).
pub fn can_approve_legal(role: Role) -> bool {
    Capability::ApproveLegal.allows(role)
}

/// Role may manage user accounts.
pub fn can_manage_users(role: Role) -> bool {
    Capability::ManageUsers.allows(role)
}

/// Visibility rule for classified records.
pub fn can_view_data_by_level(role: Role, level: LevelAkses) -> bool {
    match level {
        LevelAkses::Restrict => can_access_restrict_data(role),
        LevelAkses::NonRestrict => can_access_non_restrict_data(role),
    }
}
