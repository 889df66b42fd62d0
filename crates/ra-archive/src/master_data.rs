//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Storage locations and document types, persisted as one JSON document.
//!
//! Persisted content is never trusted as-is: [`MasterData::validate`] runs a
//! structural guard on every load and save, and anything that fails it is
//! replaced with the compiled-in seed.

use std::collections::HashSet;

use ra_common::storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::repository::RecordId;
use crate::seed;

/// Storage key holding the serialized master data.
pub const MASTER_DATA_KEY: &str = "ruang-arsip.master-data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LokasiPenyimpanan {
    pub id: RecordId,
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub keterangan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenisDokumen {
    pub kode: String,
    pub nama: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterData {
    pub lokasi_penyimpanan: Vec<LokasiPenyimpanan>,
    pub jenis_dokumen: Vec<JenisDokumen>,
}

#[derive(Debug, Error)]
pub enum MasterDataError {
    #[error("master data tidak valid: {0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("master data tidak dapat dibaca: {0}")]
    Json(#[from] serde_json::Error),
}

impl MasterData {
    /// Structural guard: both lists non-empty, codes and names non-blank,
    /// location ids and codes unique, document type codes unique.
    pub fn validate(&self) -> Result<(), MasterDataError> {
        if self.lokasi_penyimpanan.is_empty() {
            return Err(MasterDataError::Invalid(
                "daftar lokasi penyimpanan kosong".into(),
            ));
        }
        if self.jenis_dokumen.is_empty() {
            return Err(MasterDataError::Invalid("daftar jenis dokumen kosong".into()));
        }

        let mut ids = HashSet::new();
        let mut kode_lokasi = HashSet::new();
        for lokasi in &self.lokasi_penyimpanan {
            if lokasi.id == 0 {
                return Err(MasterDataError::Invalid(format!(
                    "lokasi {} tidak memiliki id",
                    lokasi.kode
                )));
            }
            if lokasi.kode.trim().is_empty() || lokasi.nama.trim().is_empty() {
                return Err(MasterDataError::Invalid(format!(
                    "lokasi #{} memiliki kode atau nama kosong",
                    lokasi.id
                )));
            }
            if !ids.insert(lokasi.id) {
                return Err(MasterDataError::Invalid(format!(
                    "id lokasi #{} ganda",
                    lokasi.id
                )));
            }
            if !kode_lokasi.insert(lokasi.kode.trim().to_uppercase()) {
                return Err(MasterDataError::Invalid(format!(
                    "kode lokasi {} ganda",
                    lokasi.kode
                )));
            }
        }

        let mut kode_jenis = HashSet::new();
        for jenis in &self.jenis_dokumen {
            if jenis.kode.trim().is_empty() || jenis.nama.trim().is_empty() {
                return Err(MasterDataError::Invalid(
                    "jenis dokumen memiliki kode atau nama kosong".into(),
                ));
            }
            if !kode_jenis.insert(jenis.kode.trim().to_uppercase()) {
                return Err(MasterDataError::Invalid(format!(
                    "kode jenis dokumen {} ganda",
                    jenis.kode
                )));
            }
        }
        Ok(())
    }

    pub fn lokasi(&self, id: RecordId) -> Option<&LokasiPenyimpanan> {
        self.lokasi_penyimpanan.iter().find(|l| l.id == id)
    }

    pub fn jenis(&self, kode: &str) -> Option<&JenisDokumen> {
        self.jenis_dokumen.iter().find(|j| j.kode == kode)
    }
}

impl Default for MasterData {
    fn default() -> Self {
        seed::master_data()
    }
}

/// Master data persisted in a [`KeyValueStore`].
#[derive(Debug)]
pub struct MasterDataStore<S> {
    store: S,
}

impl<S: KeyValueStore> MasterDataStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load persisted master data, falling back to the seed when the key is
    /// missing, unreadable, or fails the guard.
    pub fn load(&self) -> MasterData {
        match self.load_checked() {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!("no persisted master data; using seed");
                MasterData::default()
            }
            Err(err) => {
                warn!(error = %err, key = MASTER_DATA_KEY, "discarding persisted master data");
                MasterData::default()
            }
        }
    }

    /// Load without fallback. `Ok(None)` means nothing is persisted.
    pub fn load_checked(&self) -> Result<Option<MasterData>, MasterDataError> {
        let Some(raw) = self.store.get(MASTER_DATA_KEY)? else {
            return Ok(None);
        };
        let data: MasterData = serde_json::from_str(&raw)?;
        data.validate()?;
        Ok(Some(data))
    }

    /// Validate and persist.
    pub fn save(&self, data: &MasterData) -> Result<(), MasterDataError> {
        data.validate()?;
        let raw = serde_json::to_string(data)?;
        self.store.set(MASTER_DATA_KEY, &raw)?;
        debug!(
            lokasi = data.lokasi_penyimpanan.len(),
            jenis = data.jenis_dokumen.len(),
            "master data saved"
        );
        Ok(())
    }

    /// Drop persisted data so the next load returns the seed.
    pub fn reset(&self) -> Result<(), MasterDataError> {
        self.store.remove(MASTER_DATA_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra_common::storage::{FileStore, MemoryStore};

    fn store() -> MasterDataStore<MemoryStore> {
        MasterDataStore::new(MemoryStore::new())
    }

    #[test]
    fn seed_passes_guard() {
        seed::master_data().validate().unwrap();
    }

    #[test]
    fn missing_key_loads_seed() {
        assert_eq!(store().load(), seed::master_data());
    }

    #[test]
    fn saved_data_round_trips() {
        let store = store();
        let mut data = seed::master_data();
        data.jenis_dokumen.push(JenisDokumen {
            kode: "SKMHT".into(),
            nama: "Surat Kuasa Membebankan Hak Tanggungan".into(),
        });
        store.save(&data).unwrap();
        assert_eq!(store.load(), data);
    }

    #[test]
    fn corrupt_json_falls_back_to_seed() {
        let kv = MemoryStore::new();
        kv.set(MASTER_DATA_KEY, "{not json").unwrap();
        let store = MasterDataStore::new(kv);
        assert!(matches!(store.load_checked(), Err(MasterDataError::Json(_))));
        assert_eq!(store.load(), seed::master_data());
    }

    #[test]
    fn structurally_invalid_data_falls_back_to_seed() {
        let kv = MemoryStore::new();
        kv.set(
            MASTER_DATA_KEY,
            r#"{"lokasi_penyimpanan": [], "jenis_dokumen": [{"kode": "AKTA", "nama": "Akta"}]}"#,
        )
        .unwrap();
        let store = MasterDataStore::new(kv);
        assert!(matches!(store.load_checked(), Err(MasterDataError::Invalid(_))));
        assert_eq!(store.load(), seed::master_data());
    }

    #[test]
    fn save_rejects_duplicate_codes() {
        let mut data = seed::master_data();
        let first = data.jenis_dokumen[0].clone();
        data.jenis_dokumen.push(JenisDokumen {
            kode: first.kode.to_lowercase(),
            nama: "Duplikat".into(),
        });
        let store = store();
        assert!(matches!(store.save(&data), Err(MasterDataError::Invalid(_))));
        assert!(store.load_checked().unwrap().is_none());
    }

    #[test]
    fn save_rejects_blank_location_code() {
        let mut data = seed::master_data();
        data.lokasi_penyimpanan[0].kode = "  ".into();
        assert!(data.validate().is_err());
    }

    #[test]
    fn reset_restores_seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MasterDataStore::new(FileStore::new(dir.path().join("local.json")));
        let mut data = seed::master_data();
        data.lokasi_penyimpanan.truncate(1);
        store.save(&data).unwrap();
        assert_eq!(store.load().lokasi_penyimpanan.len(), 1);
        store.reset().unwrap();
        assert_eq!(store.load(), seed::master_data());
    }

    #[test]
    fn save_and_reset_succeed_over_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = MasterDataStore::new(FileStore::new(&path));
        assert_eq!(store.load(), seed::master_data());

        store.reset().unwrap();
        assert_eq!(store.load_checked().unwrap(), None);

        std::fs::write(&path, "{not json").unwrap();
        let mut data = seed::master_data();
        data.jenis_dokumen.truncate(2);
        store.save(&data).unwrap();
        assert_eq!(store.load().jenis_dokumen.len(), 2);
    }
}
