//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Incoming and outgoing correspondence.

use std::cmp::Ordering;

use chrono::NaiveDate;
use ra_security::rbac::LevelAkses;
use serde::{Deserialize, Serialize};
use strum::Display;
use validator::Validate;

use crate::document::Classified;
use crate::query::{Searchable, Sortable};
use crate::repository::{Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ArahSurat {
    Masuk,
    Keluar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surat {
    pub id: RecordId,
    pub nomor: String,
    pub perihal: String,
    pub arah: ArahSurat,
    /// Sender for incoming letters, recipient for outgoing ones.
    pub pihak: String,
    pub tanggal: NaiveDate,
    pub level_akses: LevelAkses,
}

impl Record for Surat {
    const ENTITY: &'static str = "surat";

    fn id(&self) -> RecordId {
        self.id
    }

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }
}

impl Classified for Surat {
    fn level_akses(&self) -> LevelAkses {
        self.level_akses
    }
}

impl Searchable for Surat {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.nomor.as_str(), self.perihal.as_str(), self.pihak.as_str()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuratSort {
    Nomor,
    Tanggal,
}

impl Sortable for Surat {
    type Key = SuratSort;

    fn compare_by(&self, other: &Self, key: SuratSort) -> Ordering {
        match key {
            SuratSort::Nomor => self.nomor.cmp(&other.nomor),
            SuratSort::Tanggal => self.tanggal.cmp(&other.tanggal),
        }
        .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuratFilter {
    #[serde(default)]
    pub arah: Option<ArahSurat>,
    #[serde(default)]
    pub dari: Option<NaiveDate>,
    #[serde(default)]
    pub sampai: Option<NaiveDate>,
}

impl SuratFilter {
    /// Date bounds are inclusive.
    pub fn matches(&self, surat: &Surat) -> bool {
        self.arah.map_or(true, |a| surat.arah == a)
            && self.dari.map_or(true, |d| surat.tanggal >= d)
            && self.sampai.map_or(true, |s| surat.tanggal <= s)
    }

    pub fn apply(&self, letters: Vec<Surat>) -> Vec<Surat> {
        letters.into_iter().filter(|s| self.matches(s)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewSurat {
    #[validate(length(min = 1, max = 64, message = "Nomor surat wajib diisi"))]
    pub nomor: String,
    #[validate(length(min = 1, max = 300, message = "Perihal wajib diisi"))]
    pub perihal: String,
    pub arah: ArahSurat,
    #[validate(length(min = 1, message = "Pihak wajib diisi"))]
    pub pihak: String,
    pub tanggal: NaiveDate,
    pub level_akses: LevelAkses,
}

impl NewSurat {
    pub fn normalized(mut self) -> Self {
        self.nomor = self.nomor.trim().to_owned();
        self.perihal = self.perihal.trim().to_owned();
        self.pihak = self.pihak.trim().to_owned();
        self
    }

    pub fn into_surat(self) -> Surat {
        Surat {
            id: 0,
            nomor: self.nomor,
            perihal: self.perihal,
            arah: self.arah,
            pihak: self.pihak,
            tanggal: self.tanggal,
            level_akses: self.level_akses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::filter_visible;
    use crate::seed;
    use ra_security::rbac::Role;

    #[test]
    fn filter_by_direction_and_range() {
        let filter = SuratFilter {
            arah: Some(ArahSurat::Masuk),
            dari: NaiveDate::from_ymd_opt(2024, 1, 1),
            sampai: NaiveDate::from_ymd_opt(2024, 12, 31),
        };
        let letters = filter.apply(seed::surat());
        assert!(!letters.is_empty());
        assert!(letters.iter().all(|s| s.arah == ArahSurat::Masuk));
    }

    #[test]
    fn restricted_letters_hidden_from_legal() {
        let all = seed::surat();
        let visible = filter_visible(Role::FungsiLegal, all.clone());
        assert!(visible.len() < all.len());
        assert!(visible.iter().all(|s| s.level_akses == LevelAkses::NonRestrict));
    }

    #[test]
    fn search_covers_counterparty() {
        let letter = &seed::surat()[0];
        assert!(letter.matches(&letter.pihak.to_lowercase()));
    }
}
