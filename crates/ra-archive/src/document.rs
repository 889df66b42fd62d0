//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::cmp::Ordering;

use chrono::NaiveDate;
use ra_security::rbac::{can_view_data_by_level, LevelAkses, Role};
use serde::{Deserialize, Serialize};
use strum::Display;
use validator::Validate;

use crate::query::{Searchable, Sortable};
use crate::repository::{Record, RecordId};

/// Records carrying a data-access level.
pub trait Classified {
    fn level_akses(&self) -> LevelAkses;

    fn visible_to(&self, role: Role) -> bool {
        can_view_data_by_level(role, self.level_akses())
    }
}

/// Keep the records `role` may see.
pub fn filter_visible<T: Classified>(role: Role, records: Vec<T>) -> Vec<T> {
    records.into_iter().filter(|r| r.visible_to(role)).collect()
}

/// Keep the digital documents `role` may see.
pub fn filter_digital_documents(role: Role, documents: Vec<Dokumen>) -> Vec<Dokumen> {
    filter_visible(role, documents)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum StatusPinjam {
    Tersedia,
    Dipinjam,
}

/// Archived document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dokumen {
    pub id: RecordId,
    pub kode: String,
    /// Code of a [`crate::master_data::JenisDokumen`].
    pub jenis: String,
    pub nama: String,
    pub lokasi_id: RecordId,
    pub status_pinjam: StatusPinjam,
    pub level_akses: LevelAkses,
    pub tanggal: NaiveDate,
    #[serde(default)]
    pub debitur_id: Option<RecordId>,
    #[serde(default)]
    pub keterangan: Option<String>,
}

impl Dokumen {
    pub fn is_available(&self) -> bool {
        self.status_pinjam == StatusPinjam::Tersedia
    }
}

impl Record for Dokumen {
    const ENTITY: &'static str = "dokumen";

    fn id(&self) -> RecordId {
        self.id
    }

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }
}

impl Classified for Dokumen {
    fn level_akses(&self) -> LevelAkses {
        self.level_akses
    }
}

impl Searchable for Dokumen {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.kode.as_str(), self.nama.as_str(), self.jenis.as_str()];
        if let Some(keterangan) = &self.keterangan {
            fields.push(keterangan);
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSort {
    Kode,
    Nama,
    Jenis,
    Tanggal,
}

impl Sortable for Dokumen {
    type Key = DocumentSort;

    fn compare_by(&self, other: &Self, key: DocumentSort) -> Ordering {
        match key {
            DocumentSort::Kode => self.kode.cmp(&other.kode),
            DocumentSort::Nama => self.nama.to_lowercase().cmp(&other.nama.to_lowercase()),
            DocumentSort::Jenis => self.jenis.cmp(&other.jenis),
            DocumentSort::Tanggal => self.tanggal.cmp(&other.tanggal),
        }
        .then_with(|| self.id.cmp(&other.id))
    }
}

/// Column filters of the document table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFilter {
    #[serde(default)]
    pub jenis: Option<String>,
    #[serde(default)]
    pub status: Option<StatusPinjam>,
    #[serde(default)]
    pub level: Option<LevelAkses>,
    #[serde(default)]
    pub lokasi_id: Option<RecordId>,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &Dokumen) -> bool {
        self.jenis.as_deref().map_or(true, |j| doc.jenis == j)
            && self.status.map_or(true, |s| doc.status_pinjam == s)
            && self.level.map_or(true, |l| doc.level_akses == l)
            && self.lokasi_id.map_or(true, |l| doc.lokasi_id == l)
    }

    pub fn apply(&self, documents: Vec<Dokumen>) -> Vec<Dokumen> {
        documents.into_iter().filter(|d| self.matches(d)).collect()
    }
}

/// Input of the "tambah dokumen" form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDokumen {
    #[validate(length(min = 1, max = 64, message = "Kode dokumen wajib diisi"))]
    pub kode: String,
    #[validate(length(min = 1, message = "Jenis dokumen wajib dipilih"))]
    pub jenis: String,
    #[validate(length(min = 1, max = 200, message = "Nama dokumen wajib diisi"))]
    pub nama: String,
    #[validate(range(min = 1, message = "Lokasi penyimpanan wajib dipilih"))]
    pub lokasi_id: RecordId,
    pub level_akses: LevelAkses,
    pub tanggal: NaiveDate,
    #[serde(default)]
    pub debitur_id: Option<RecordId>,
    #[serde(default)]
    #[validate(length(max = 500, message = "Keterangan maksimal 500 karakter"))]
    pub keterangan: Option<String>,
}

impl NewDokumen {
    /// Trim text inputs so blank entries fail the length checks.
    pub fn normalized(mut self) -> Self {
        self.kode = self.kode.trim().to_owned();
        self.jenis = self.jenis.trim().to_owned();
        self.nama = self.nama.trim().to_owned();
        self.keterangan = self
            .keterangan
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty());
        self
    }

    pub fn into_dokumen(self) -> Dokumen {
        Dokumen {
            id: 0,
            kode: self.kode,
            jenis: self.jenis,
            nama: self.nama,
            lokasi_id: self.lokasi_id,
            status_pinjam: StatusPinjam::Tersedia,
            level_akses: self.level_akses,
            tanggal: self.tanggal,
            debitur_id: self.debitur_id,
            keterangan: self.keterangan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use strum::IntoEnumIterator;

    #[test]
    fn visibility_matches_level_rule_for_every_pair() {
        for role in Role::iter() {
            for doc in seed::documents() {
                let visible = filter_digital_documents(role, vec![doc.clone()]);
                assert_eq!(
                    visible.len() == 1,
                    can_view_data_by_level(role, doc.level_akses),
                    "{role} / {}",
                    doc.kode
                );
            }
        }
    }

    #[test]
    fn legal_does_not_see_restricted_documents() {
        let visible = filter_digital_documents(Role::FungsiLegal, seed::documents());
        assert!(!visible.is_empty());
        assert!(visible.iter().all(|d| d.level_akses == LevelAkses::NonRestrict));
    }

    #[test]
    fn filter_combines_columns() {
        let filter = DocumentFilter {
            status: Some(StatusPinjam::Dipinjam),
            ..Default::default()
        };
        let docs = filter.apply(seed::documents());
        assert!(!docs.is_empty());
        assert!(docs.iter().all(|d| !d.is_available()));
    }

    #[test]
    fn blank_form_fields_fail_validation() {
        let form = NewDokumen {
            kode: "   ".into(),
            jenis: "AKTA".into(),
            nama: "".into(),
            lokasi_id: 0,
            level_akses: LevelAkses::NonRestrict,
            tanggal: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            debitur_id: None,
            keterangan: Some("  ".into()),
        }
        .normalized();
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("kode"));
        assert!(fields.contains_key("nama"));
        assert!(fields.contains_key("lokasi_id"));
        assert!(form.keterangan.is_none());
    }
}
