//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Debtors, their collectibility badge, and follow-up records.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use ra_security::rbac::LevelAkses;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use validator::Validate;

use crate::document::Classified;
use crate::query::{Searchable, Sortable};
use crate::repository::{Record, RecordId};

/// Collectibility classification ("Kol 1" best, "Kol 5" worst).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Kolektibilitas {
    #[serde(rename = "Kol 1")]
    #[strum(serialize = "Kol 1")]
    Kol1,
    #[serde(rename = "Kol 2")]
    #[strum(serialize = "Kol 2")]
    Kol2,
    #[serde(rename = "Kol 3")]
    #[strum(serialize = "Kol 3")]
    Kol3,
    #[serde(rename = "Kol 4")]
    #[strum(serialize = "Kol 4")]
    Kol4,
    #[serde(rename = "Kol 5")]
    #[strum(serialize = "Kol 5")]
    Kol5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Green,
    Yellow,
    Orange,
    Red,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub color: BadgeColor,
}

impl Kolektibilitas {
    pub fn badge(self) -> Badge {
        let (label, color) = match self {
            Kolektibilitas::Kol1 => ("Lancar", BadgeColor::Green),
            Kolektibilitas::Kol2 => ("Dalam Perhatian Khusus", BadgeColor::Yellow),
            Kolektibilitas::Kol3 => ("Kurang Lancar", BadgeColor::Orange),
            Kolektibilitas::Kol4 => ("Diragukan", BadgeColor::Red),
            Kolektibilitas::Kol5 => ("Macet", BadgeColor::Dark),
        };
        Badge { label, color }
    }

    /// Kol 3 and worse count as non-performing.
    pub fn is_non_performing(self) -> bool {
        self >= Kolektibilitas::Kol3
    }

    /// Parse "Kol 3", "kol3", or a bare "3".
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let digits = digits
            .strip_prefix("Kol")
            .or_else(|| digits.strip_prefix("kol"))
            .or_else(|| digits.strip_prefix("KOL"))
            .unwrap_or(&digits);
        match digits {
            "1" => Some(Kolektibilitas::Kol1),
            "2" => Some(Kolektibilitas::Kol2),
            "3" => Some(Kolektibilitas::Kol3),
            "4" => Some(Kolektibilitas::Kol4),
            "5" => Some(Kolektibilitas::Kol5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debitur {
    pub id: RecordId,
    pub cif: String,
    pub nama: String,
    pub cabang: String,
    pub kolektibilitas: Kolektibilitas,
    /// Outstanding balance in rupiah.
    pub outstanding: u64,
    pub level_akses: LevelAkses,
}

impl Record for Debitur {
    const ENTITY: &'static str = "debitur";

    fn id(&self) -> RecordId {
        self.id
    }

    fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }
}

impl Classified for Debitur {
    fn level_akses(&self) -> LevelAkses {
        self.level_akses
    }
}

impl Searchable for Debitur {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.cif.as_str(), self.nama.as_str(), self.cabang.as_str()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebiturSort {
    Nama,
    Kolektibilitas,
    Outstanding,
}

impl Sortable for Debitur {
    type Key = DebiturSort;

    fn compare_by(&self, other: &Self, key: DebiturSort) -> Ordering {
        match key {
            DebiturSort::Nama => self.nama.to_lowercase().cmp(&other.nama.to_lowercase()),
            DebiturSort::Kolektibilitas => self.kolektibilitas.cmp(&other.kolektibilitas),
            DebiturSort::Outstanding => self.outstanding.cmp(&other.outstanding),
        }
        .then_with(|| self.id.cmp(&other.id))
    }
}

/// Table row with the derived badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebiturRow {
    #[serde(flatten)]
    pub debitur: Debitur,
    pub badge: Badge,
}

impl From<Debitur> for DebiturRow {
    fn from(debitur: Debitur) -> Self {
        let badge = debitur.kolektibilitas.badge();
        Self { debitur, badge }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum StatusRencana {
    Direncanakan,
    Berjalan,
    Selesai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: RecordId,
    pub debitur_id: RecordId,
    pub rencana: String,
    pub target: NaiveDate,
    pub status: StatusRencana,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasilKunjungan {
    pub id: RecordId,
    pub debitur_id: RecordId,
    pub tanggal: NaiveDate,
    pub petugas: String,
    pub hasil: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum TingkatSp {
    SP1,
    SP2,
    SP3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuratPeringatan {
    pub id: RecordId,
    pub debitur_id: RecordId,
    pub nomor: String,
    pub tingkat: TingkatSp,
    pub tanggal: NaiveDate,
}

macro_rules! impl_debtor_child {
    ($ty:ty, $entity:literal) => {
        impl Record for $ty {
            const ENTITY: &'static str = $entity;

            fn id(&self) -> RecordId {
                self.id
            }

            fn with_id(mut self, id: RecordId) -> Self {
                self.id = id;
                self
            }
        }
    };
}

impl_debtor_child!(ActionPlan, "action_plan");
impl_debtor_child!(HasilKunjungan, "hasil_kunjungan");
impl_debtor_child!(SuratPeringatan, "surat_peringatan");

/// Debtor joined with its follow-up records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebiturDetail {
    #[serde(flatten)]
    pub row: DebiturRow,
    pub action_plans: Vec<ActionPlan>,
    pub hasil_kunjungan: Vec<HasilKunjungan>,
    pub surat_peringatan: Vec<SuratPeringatan>,
}

impl DebiturDetail {
    pub fn assemble(
        debitur: Debitur,
        plans: &[ActionPlan],
        visits: &[HasilKunjungan],
        letters: &[SuratPeringatan],
    ) -> Self {
        let id = debitur.id;
        let mut hasil_kunjungan: Vec<HasilKunjungan> =
            visits.iter().filter(|v| v.debitur_id == id).cloned().collect();
        hasil_kunjungan.sort_by(|a, b| b.tanggal.cmp(&a.tanggal));
        let mut surat_peringatan: Vec<SuratPeringatan> =
            letters.iter().filter(|l| l.debitur_id == id).cloned().collect();
        surat_peringatan.sort_by_key(|l| l.tingkat);
        Self {
            row: DebiturRow::from(debitur),
            action_plans: plans.iter().filter(|p| p.debitur_id == id).cloned().collect(),
            hasil_kunjungan,
            surat_peringatan,
        }
    }

    /// Highest warning letter issued, if any.
    pub fn latest_warning(&self) -> Option<TingkatSp> {
        self.surat_peringatan.iter().map(|l| l.tingkat).max()
    }
}

/// Debtor count per collectibility code, always listing all five codes.
pub fn collectibility_summary(debtors: &[Debitur]) -> BTreeMap<String, usize> {
    let mut summary: BTreeMap<String, usize> =
        Kolektibilitas::iter().map(|k| (k.to_string(), 0)).collect();
    for debitur in debtors {
        *summary.entry(debitur.kolektibilitas.to_string()).or_default() += 1;
    }
    summary
}

/// One row of a debtor upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDebitur {
    #[validate(length(min = 1, max = 32, message = "CIF wajib diisi"))]
    pub cif: String,
    #[validate(length(min = 1, max = 200, message = "Nama debitur wajib diisi"))]
    pub nama: String,
    #[validate(length(min = 1, message = "Cabang wajib diisi"))]
    pub cabang: String,
    pub kolektibilitas: Kolektibilitas,
    #[serde(default)]
    pub outstanding: u64,
}

impl NewDebitur {
    pub fn normalized(mut self) -> Self {
        self.cif = self.cif.trim().to_owned();
        self.nama = self.nama.trim().to_owned();
        self.cabang = self.cabang.trim().to_owned();
        self
    }

    pub fn into_debitur(self, level_akses: LevelAkses) -> Debitur {
        Debitur {
            id: 0,
            cif: self.cif,
            nama: self.nama,
            cabang: self.cabang,
            kolektibilitas: self.kolektibilitas,
            outstanding: self.outstanding,
            level_akses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based row number in the upload.
    pub row: usize,
    pub cif: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: Vec<RecordId>,
    pub skipped: Vec<SkippedRow>,
}

/// Validate upload rows against each other and the CIFs already on file.
/// CIFs compare case-insensitively. Returns the accepted rows and the
/// rejected ones.
pub fn screen_upload(
    existing_cifs: &HashSet<String>,
    rows: Vec<NewDebitur>,
) -> (Vec<NewDebitur>, Vec<SkippedRow>) {
    let mut seen: HashSet<String> = existing_cifs.iter().map(|c| c.to_uppercase()).collect();
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        let row = row.normalized();
        if let Err(errors) = row.validate() {
            let reason = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
                .collect::<Vec<_>>()
                .join("; ");
            skipped.push(SkippedRow {
                row: index + 1,
                cif: row.cif,
                reason,
            });
            continue;
        }
        if !seen.insert(row.cif.to_uppercase()) {
            skipped.push(SkippedRow {
                row: index + 1,
                cif: row.cif,
                reason: "CIF sudah terdaftar".into(),
            });
            continue;
        }
        accepted.push(row);
    }
    (accepted, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debitur(id: RecordId, kol: Kolektibilitas) -> Debitur {
        Debitur {
            id,
            cif: format!("CIF{id:04}"),
            nama: format!("Debitur {id}"),
            cabang: "Jakarta".into(),
            kolektibilitas: kol,
            outstanding: 1_000_000,
            level_akses: LevelAkses::NonRestrict,
        }
    }

    #[test]
    fn kol_codes_use_spaced_wire_format() {
        assert_eq!(serde_json::to_string(&Kolektibilitas::Kol3).unwrap(), "\"Kol 3\"");
        assert_eq!(
            serde_json::from_str::<Kolektibilitas>("\"Kol 5\"").unwrap(),
            Kolektibilitas::Kol5
        );
        assert_eq!(Kolektibilitas::Kol2.to_string(), "Kol 2");
    }

    #[test]
    fn badge_colors_by_code() {
        assert_eq!(Kolektibilitas::Kol1.badge().color, BadgeColor::Green);
        assert_eq!(Kolektibilitas::Kol2.badge().color, BadgeColor::Yellow);
        assert_eq!(Kolektibilitas::Kol3.badge().color, BadgeColor::Orange);
        assert_eq!(Kolektibilitas::Kol4.badge().color, BadgeColor::Red);
        assert_eq!(Kolektibilitas::Kol5.badge().label, "Macet");
        assert!(Kolektibilitas::Kol3.is_non_performing());
        assert!(!Kolektibilitas::Kol2.is_non_performing());
    }

    #[test]
    fn parse_accepts_loose_forms() {
        assert_eq!(Kolektibilitas::parse("Kol 4"), Some(Kolektibilitas::Kol4));
        assert_eq!(Kolektibilitas::parse("kol1"), Some(Kolektibilitas::Kol1));
        assert_eq!(Kolektibilitas::parse(" 2 "), Some(Kolektibilitas::Kol2));
        assert_eq!(Kolektibilitas::parse("Kol 6"), None);
    }

    #[test]
    fn detail_joins_children_by_id() {
        let plans = vec![
            ActionPlan {
                id: 1,
                debitur_id: 1,
                rencana: "Restrukturisasi".into(),
                target: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                status: StatusRencana::Berjalan,
            },
            ActionPlan {
                id: 2,
                debitur_id: 2,
                rencana: "Lelang".into(),
                target: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                status: StatusRencana::Direncanakan,
            },
        ];
        let letters = vec![
            SuratPeringatan {
                id: 1,
                debitur_id: 1,
                nomor: "SP-2/2024".into(),
                tingkat: TingkatSp::SP2,
                tanggal: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            },
            SuratPeringatan {
                id: 2,
                debitur_id: 1,
                nomor: "SP-1/2024".into(),
                tingkat: TingkatSp::SP1,
                tanggal: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            },
        ];
        let detail = DebiturDetail::assemble(debitur(1, Kolektibilitas::Kol4), &plans, &[], &letters);
        assert_eq!(detail.action_plans.len(), 1);
        assert_eq!(detail.surat_peringatan[0].tingkat, TingkatSp::SP1);
        assert_eq!(detail.latest_warning(), Some(TingkatSp::SP2));
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["badge"]["color"], "red");
        assert_eq!(value["kolektibilitas"], "Kol 4");
    }

    #[test]
    fn summary_lists_all_codes() {
        let summary = collectibility_summary(&[
            debitur(1, Kolektibilitas::Kol1),
            debitur(2, Kolektibilitas::Kol1),
            debitur(3, Kolektibilitas::Kol5),
        ]);
        assert_eq!(summary.len(), 5);
        assert_eq!(summary["Kol 1"], 2);
        assert_eq!(summary["Kol 3"], 0);
        assert_eq!(summary["Kol 5"], 1);
    }

    #[test]
    fn upload_screening_skips_duplicates_and_invalid_rows() {
        let existing = HashSet::from(["CIF0001".to_owned()]);
        let row = |cif: &str, nama: &str| NewDebitur {
            cif: cif.into(),
            nama: nama.into(),
            cabang: "Bandung".into(),
            kolektibilitas: Kolektibilitas::Kol2,
            outstanding: 0,
        };
        let (accepted, skipped) = screen_upload(
            &existing,
            vec![
                row("CIF0001", "Lama"),
                row(" CIF0009 ", "Baru"),
                row("CIF0009", "Ganda"),
                row("CIF0010", "  "),
            ],
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].cif, "CIF0009");
        assert_eq!(
            skipped.iter().map(|s| s.row).collect::<Vec<_>>(),
            vec![1, 3, 4]
        );
        assert_eq!(skipped[2].reason, "Nama debitur wajib diisi");
    }
}
