//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Disposition requests: `Pending -> Approved | Rejected`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use ra_security::identity::UserId;
use serde::{Deserialize, Serialize};
use strum::Display;
use validator::Validate;

use crate::query::{Searchable, Sortable};
use crate::repository::{Record, RecordId};
use crate::workflow::{Transition, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DisposisiStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DisposisiAction {
    Approve,
    Reject,
}

impl DisposisiStatus {
    pub fn apply(self, action: DisposisiAction) -> Option<DisposisiStatus> {
        match (self, action) {
            (DisposisiStatus::Pending, DisposisiAction::Approve) => Some(DisposisiStatus::Approved),
            (DisposisiStatus::Pending, DisposisiAction::Reject) => Some(DisposisiStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_final(self) -> bool {
        self != DisposisiStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disposisi {
    pub id: RecordId,
    pub dokumen_id: RecordId,
    pub pemohon_id: UserId,
    pub alasan: String,
    pub status: DisposisiStatus,
    #[serde(default)]
    pub catatan: Option<String>,
    #[serde(default)]
    pub diputuskan_oleh: Option<UserId>,
    pub tanggal_pengajuan: DateTime<Utc>,
    #[serde(default)]
    pub tanggal_keputusan: Option<DateTime<Utc>>,
}

impl Disposisi {
    /// Apply `action`, stamping the decider and time.
    pub fn decide(
        &mut self,
        action: DisposisiAction,
        decider: UserId,
        catatan: Option<String>,
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
        self.status = next;
        self.diputuskan_oleh = Some(decider);
        self.tanggal_keputusan = Some(at);
        self.catatan = catatan.filter(|c| !c.trim().is_empty());
        Ok(transition)
    }
}

impl Record for Disposisi {
    const ENTITY: &'static str = "disposisi";

    fn id(&self) -> RecordId {
        self.id
    }

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }
}

impl Searchable for Disposisi {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.alasan.as_str()];
        if let Some(catatan) = &self.catatan {
            fields.push(catatan);
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposisiSort {
    TanggalPengajuan,
    Status,
}

impl Sortable for Disposisi {
    type Key = DisposisiSort;

    fn compare_by(&self, other: &Self, key: DisposisiSort) -> Ordering {
        match key {
            DisposisiSort::TanggalPengajuan => self.tanggal_pengajuan.cmp(&other.tanggal_pengajuan),
            DisposisiSort::Status => self.status.to_string().cmp(&other.status.to_string()),
        }
        .then_with(|| self.id.cmp(&other.id))
    }
}

/// Input of the disposition request form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDisposisi {
    #[validate(range(min = 1, message = "Dokumen wajib dipilih"))]
    pub dokumen_id: RecordId,
    #[validate(length(min = 5, max = 500, message = "Alasan minimal 5 karakter"))]
    pub alasan: String,
}

/// Body of approve/reject requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keputusan {
    #[serde(default)]
    pub catatan: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Disposisi {
        Disposisi {
            id: 1,
            dokumen_id: 2,
            pemohon_id: 4,
            alasan: "Verifikasi agunan".into(),
            status: DisposisiStatus::Pending,
            catatan: None,
            diputuskan_oleh: None,
            tanggal_pengajuan: Utc::now(),
            tanggal_keputusan: None,
        }
    }

    #[test]
    fn approve_from_pending() {
        let mut item = pending();
        let transition = item
            .decide(DisposisiAction::Approve, 3, Some("ok".into()), Utc::now())
            .unwrap();
        assert_eq!(transition.from, "Pending");
        assert_eq!(transition.to, "Approved");
        assert_eq!(item.diputuskan_oleh, Some(3));
        assert!(item.status.is_final());
    }

    #[test]
    fn decided_items_cannot_change() {
        let mut item = pending();
        item.decide(DisposisiAction::Reject, 3, None, Utc::now())
            .unwrap();
        let err = item
            .decide(DisposisiAction::Approve, 3, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { ref from, .. } if from == "Rejected"));
        assert_eq!(item.status, DisposisiStatus::Rejected);
    }

    #[test]
    fn transition_table_is_closed() {
        for status in [DisposisiStatus::Approved, DisposisiStatus::Rejected] {
            for action in [DisposisiAction::Approve, DisposisiAction::Reject] {
                assert_eq!(status.apply(action), None);
            }
        }
    }
}
