//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "binary"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Control CLI for administrators interacting with Ruwang Arsip."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use anyhow::{anyhow, Result};
use clap::Args;
use ra_security::{decide, normalize_path, Capability, Role};
use serde::Serialize;

use crate::context::Context;

#[derive(Debug, Args)]
pub struct AuthorizeCommand {
    /// Path to check, e.g. /dashboard/legal.
    path: String,

    /// Role to evaluate instead of the signed-in user (e.g. FUNGSI_LEGAL).
    #[arg(long)]
    role: Option<Role>,

    /// Evaluate as an anonymous visitor.
    #[arg(long, conflicts_with = "role")]
    anonymous: bool,
}

#[derive(Debug, Serialize)]
struct AuthorizeReport {
    path: String,
    role: Option<Role>,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<ra_security::ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub fn authorize(ctx: &Context, cmd: AuthorizeCommand) -> Result<()> {
    let role = match (cmd.anonymous, cmd.role) {
        (true, _) => None,
        (false, Some(role)) => Some(role),
        (false, None) => ctx.current_user().map(|u| u.role),
    };
    let decision = decide(role, &cmd.path);
    let report = AuthorizeReport {
        path: normalize_path(&cmd.path),
        role,
        allowed: decision.is_allowed(),
        reason: decision.reason(),
        message: decision.reason().map(|r| r.message_for(role)),
    };
    ctx.render(&report, || match (&report.reason, &report.message) {
        (Some(reason), Some(message)) => format!("DENIED {} [{reason}] {message}", report.path),
        _ => format!("ALLOWED {}", report.path),
    })
}

pub fn users(ctx: &Context) -> Result<()> {
    let actor = ctx.require_actor()?;
    if !Capability::ManageUsers.allows(actor.role) {
        let reason = Capability::ManageUsers.denial_reason();
        return Err(anyhow!(reason.message_for(Some(actor.role))));
    }
    let users = ctx.identity.users();
    ctx.render(&users, || {
        users
            .iter()
            .map(|u| {
                format!(
                    "{:>3}  {:<10} {:<16} {:<10?} {}",
                    u.id,
                    u.username,
                    u.role.label(),
                    u.status,
                    u.nama_lengkap
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}
