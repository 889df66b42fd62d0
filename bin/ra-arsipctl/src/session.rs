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
use ra_security::SessionStore;

use crate::context::Context;

#[derive(Debug, Args)]
pub struct LoginCommand {
    #[arg(long, short)]
    username: String,

    #[arg(long, short, env = "RA_PASSWORD", hide_env_values = true)]
    password: String,

    /// Keep the sign-in across sessions.
    #[arg(long)]
    remember: bool,
}

pub fn login(ctx: &Context, cmd: LoginCommand) -> Result<()> {
    let user = ctx
        .identity
        .sign_in(&cmd.username, &cmd.password)
        .map_err(|err| anyhow!(err))?;
    ctx.sessions().write(user.id, cmd.remember)?;
    let profile = user.profile();
    ctx.render(&profile, || {
        format!(
            "Selamat datang, {} ({})",
            profile.nama_lengkap,
            profile.role.label()
        )
    })
}

pub fn whoami(ctx: &Context) -> Result<()> {
    match ctx.current_user() {
        Some(user) => {
            let profile = user.profile();
            ctx.render(&profile, || {
                format!(
                    "{} <{}> {} / {}",
                    profile.nama_lengkap,
                    profile.username,
                    profile.role.label(),
                    profile.divisi
                )
            })
        }
        None => Err(anyhow!("not signed in")),
    }
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.sessions().clear()?;
    println!("Anda telah keluar.");
    Ok(())
}
