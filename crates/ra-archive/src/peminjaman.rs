//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Physical document loans.
//!
//! ```text
//! Pending --accept--> Dipinjam --return--> Dikembalikan
//!    \----reject--> Ditolak
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use ra_security::identity::UserId;
use ra_security::rbac::Capability;
use serde::{Deserialize, Serialize};
use strum::Display;
use validator::Validate;

use crate::query::{Searchable, Sortable};
use crate::repository::{Record, RecordId};
use crate::workflow::{Transition, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum PeminjamanStatus {
    Pending,
    Dipinjam,
    Dikembalikan,
    Ditolak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PeminjamanAction {
    Accept,
    Reject,
    Return,
}

impl PeminjamanAction {
    /// Capability needed regardless of who borrowed the document.
    pub fn required_capability(self) -> Capability {
        Capability::ApproveLegal
    }

    /// Whether the borrower may perform the action without the capability.
    pub fn borrower_may_perform(self) -> bool {
        self == PeminjamanAction::Return
    }
}

impl PeminjamanStatus {
    pub fn apply(self, action: PeminjamanAction) -> Option<PeminjamanStatus> {
        use PeminjamanAction::*;
        use PeminjamanStatus::*;
        match (self, action) {
            (Pending, Accept) => Some(Dipinjam),
            (Pending, Reject) => Some(Ditolak),
            (Dipinjam, Return) => Some(Dikembalikan),
            _ => None,
        }
    }

    /// Whether the document is physically out while in this state.
    pub fn holds_document(self) -> bool {
        self == PeminjamanStatus::Dipinjam
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peminjaman {
    pub id: RecordId,
    pub dokumen_id: RecordId,
    pub peminjam_id: UserId,
    pub keperluan: String,
    pub status: PeminjamanStatus,
    pub tanggal_pengajuan: DateTime<Utc>,
    #[serde(default)]
    pub tanggal_pinjam: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tanggal_kembali: Option<DateTime<Utc>>,
    #[serde(default)]
    pub diproses_oleh: Option<UserId>,
}

impl Peminjaman {
    pub fn transition(
        &mut self,
        action: PeminjamanAction,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        let next = self
            .status
            .apply(action)
            .ok_or_else(|| WorkflowError::InvalidTransition {
                entity: Self::ENTITY,
                id: self.id,
                from: self.status.to_string(),
                action: action.to_string(),
            })?;
        let transition = Transition {
            entity: Self::ENTITY.to_owned(),
            id: self.id,
            from: self.status.to_string(),
            to: next.to_string(),
        };
        match action {
            PeminjamanAction::Accept => self.tanggal_pinjam = Some(at),
            PeminjamanAction::Return => self.tanggal_kembali = Some(at),
            PeminjamanAction::Reject => {}
        }
        self.status = next;
        self.diproses_oleh = Some(actor);
        Ok(transition)
    }
}

impl Record for Peminjaman {
    const ENTITY: &'static str = "peminjaman";

    fn id(&self) -> RecordId {
        self.id
    }

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }
}

impl Searchable for Peminjaman {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.keperluan.as_str()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeminjamanSort {
    TanggalPengajuan,
    Status,
}

impl Sortable for Peminjaman {
    type Key = PeminjamanSort;

    fn compare_by(&self, other: &Self, key: PeminjamanSort) -> Ordering {
        match key {
            PeminjamanSort::TanggalPengajuan => {
                self.tanggal_pengajuan.cmp(&other.tanggal_pengajuan)
            }
            PeminjamanSort::Status => self.status.to_string().cmp(&other.status.to_string()),
        }
        .then_with(|| self.id.cmp(&other.id))
    }
}

/// Input of the loan request form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewPeminjaman {
    #[validate(range(min = 1, message = "Dokumen wajib dipilih"))]
    pub dokumen_id: RecordId,
    #[validate(length(min = 5, max = 500, message = "Keperluan minimal 5 karakter"))]
    pub keperluan: String,
}
