//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! CSV export of the document and debtor tables, and CSV parsing of debtor
//! uploads.

use std::io::{Read, Write};

use serde::Serialize;
use thiserror::Error;

use crate::debitur::{Debitur, NewDebitur};
use crate::document::Dokumen;
use crate::master_data::MasterData;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("gagal menulis csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("gagal menulis csv: {0}")]
    Io(#[from] std::io::Error),
    #[error("baris {row} tidak valid: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Serialize)]
struct DocumentRow<'a> {
    kode: &'a str,
    nama: &'a str,
    jenis: &'a str,
    lokasi: &'a str,
    status: String,
    level_akses: String,
    tanggal: String,
}

#[derive(Debug, Serialize)]
struct DebtorRow<'a> {
    cif: &'a str,
    nama: &'a str,
    cabang: &'a str,
    kolektibilitas: String,
    keterangan: &'static str,
    outstanding: u64,
}

/// Write `documents` as CSV, resolving type and location names through
/// `master`. Unknown references fall back to the raw code or id.
pub fn write_documents<W: Write>(
    writer: W,
    documents: &[Dokumen],
    master: &MasterData,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for doc in documents {
        let lokasi = master
            .lokasi(doc.lokasi_id)
            .map(|l| l.nama.clone())
            .unwrap_or_else(|| format!("#{}", doc.lokasi_id));
        let jenis = master
            .jenis(&doc.jenis)
            .map(|j| j.nama.as_str())
            .unwrap_or(doc.jenis.as_str());
        csv.serialize(DocumentRow {
            kode: &doc.kode,
            nama: &doc.nama,
            jenis,
            lokasi: &lokasi,
            status: doc.status_pinjam.to_string(),
            level_akses: doc.level_akses.to_string(),
            tanggal: doc.tanggal.format("%Y-%m-%d").to_string(),
        })?;
    }
    if documents.is_empty() {
        csv.write_record([
            "kode",
            "nama",
            "jenis",
            "lokasi",
            "status",
            "level_akses",
            "tanggal",
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_debtors<W: Write>(writer: W, debtors: &[Debitur]) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for debitur in debtors {
        csv.serialize(DebtorRow {
            cif: &debitur.cif,
            nama: &debitur.nama,
            cabang: &debitur.cabang,
            kolektibilitas: debitur.kolektibilitas.to_string(),
            keterangan: debitur.kolektibilitas.badge().label,
            outstanding: debitur.outstanding,
        })?;
    }
    if debtors.is_empty() {
        csv.write_record([
            "cif",
            "nama",
            "cabang",
            "kolektibilitas",
            "keterangan",
            "outstanding",
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn documents_csv(documents: &[Dokumen], master: &MasterData) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_documents(&mut buffer, documents, master)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn debtors_csv(debtors: &[Debitur]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_debtors(&mut buffer, debtors)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Parse an uploaded debtor sheet with header
/// `cif,nama,cabang,kolektibilitas,outstanding`.
pub fn read_debtor_upload<R: Read>(reader: R) -> Result<Vec<NewDebitur>, ExportError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for (index, row) in csv.deserialize::<NewDebitur>().enumerate() {
        let row = row.map_err(|source| ExportError::InvalidRow {
            row: index + 1,
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debitur::Kolektibilitas;
    use crate::seed;

    #[test]
    fn document_export_has_header_and_names() {
        let docs = seed::documents();
        let out = documents_csv(&docs[..2], &seed::master_data()).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("kode,nama,jenis,lokasi,status,level_akses,tanggal")
        );
        assert_eq!(out.lines().count(), 3);
        let master = seed::master_data();
        let lokasi = &master.lokasi(docs[0].lokasi_id).unwrap().nama;
        assert!(lines.next().unwrap().contains(lokasi.as_str()));
    }

    #[test]
    fn empty_export_still_has_header() {
        assert_eq!(
            debtors_csv(&[]).unwrap().trim_end(),
            "cif,nama,cabang,kolektibilitas,keterangan,outstanding"
        );
    }

    #[test]
    fn debtor_export_includes_badge_label() {
        let out = debtors_csv(&seed::debtors()).unwrap();
        assert!(out.contains("Lancar"));
        assert_eq!(out.lines().count(), seed::debtors().len() + 1);
    }

    #[test]
    fn upload_sheet_parses_kol_codes() {
        let sheet = "cif,nama,cabang,kolektibilitas,outstanding\n\
                     CIF9001, PT Maju ,Surabaya,Kol 3,250000000\n";
        let rows = read_debtor_upload(sheet.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nama, "PT Maju");
        assert_eq!(rows[0].kolektibilitas, Kolektibilitas::Kol3);
    }

    #[test]
    fn upload_sheet_reports_bad_row() {
        let sheet = "cif,nama,cabang,kolektibilitas,outstanding\nCIF1,A,B,Kol 9,1\n";
        let err = read_debtor_upload(sheet.as_bytes()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidRow { row: 1, .. }));
    }
}
