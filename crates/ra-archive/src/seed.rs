//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Compiled-in demo data loaded at startup.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ra_security::identity::{User, UserStatus};
use ra_security::rbac::{LevelAkses, Role};

use crate::debitur::{
    ActionPlan, Debitur, HasilKunjungan, Kolektibilitas, StatusRencana, SuratPeringatan, TingkatSp,
};
use crate::disposisi::{Disposisi, DisposisiStatus};
use crate::document::{Dokumen, StatusPinjam};
use crate::master_data::{JenisDokumen, LokasiPenyimpanan, MasterData};
use crate::peminjaman::{Peminjaman, PeminjamanStatus};
use crate::surat::{ArahSurat, Surat};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Demo accounts, one per role plus a disabled one. Passwords are
/// `<username>123`.
pub fn users() -> Vec<User> {
    vec![
        User::new(1, "admin", "admin123", "Rina Kartika", "IT & Operasional", Role::MasterUser),
        User::new(2, "full", "full123", "Budi Santoso", "Kepatuhan", Role::FullAkses),
        User::new(3, "legal", "legal123", "Sari Wulandari", "Legal", Role::FungsiLegal),
        User::new(
            4,
            "restrict",
            "restrict123",
            "Agus Prasetyo",
            "Remedial",
            Role::AksesRestrict,
        ),
        User::new(5, "nonaktif", "nonaktif123", "Dewi Lestari", "Legal", Role::FungsiLegal)
            .with_status(UserStatus::NonAktif),
    ]
}

pub fn master_data() -> MasterData {
    let lokasi = |id, kode: &str, nama: &str, keterangan: Option<&str>| LokasiPenyimpanan {
        id,
        kode: kode.into(),
        nama: nama.into(),
        keterangan: keterangan.map(Into::into),
    };
    let jenis = |kode: &str, nama: &str| JenisDokumen {
        kode: kode.into(),
        nama: nama.into(),
    };
    MasterData {
        lokasi_penyimpanan: vec![
            lokasi(1, "LMR-A1", "Lemari Arsip A1", Some("Lantai 2, ruang legal")),
            lokasi(2, "BRK-01", "Brankas Utama", Some("Ruang khasanah")),
            lokasi(3, "RAK-B3", "Rak Arsip B3", None),
        ],
        jenis_dokumen: vec![
            jenis("AKTA", "Akta Notaris"),
            jenis("SHM", "Sertifikat Hak Milik"),
            jenis("SHGB", "Sertifikat Hak Guna Bangunan"),
            jenis("PK", "Perjanjian Kredit"),
            jenis("APHT", "Akta Pemberian Hak Tanggungan"),
        ],
    }
}

pub fn documents() -> Vec<Dokumen> {
    #[allow(clippy::too_many_arguments)]
    fn doc(
        id: u32,
        kode: &str,
        jenis: &str,
        nama: &str,
        lokasi_id: u32,
        status_pinjam: StatusPinjam,
        level_akses: LevelAkses,
        tanggal: NaiveDate,
        debitur_id: Option<u32>,
    ) -> Dokumen {
        Dokumen {
            id,
            kode: kode.into(),
            jenis: jenis.into(),
            nama: nama.into(),
            lokasi_id,
            status_pinjam,
            level_akses,
            tanggal,
            debitur_id,
            keterangan: None,
        }
    }
    use LevelAkses::{NonRestrict, Restrict};
    use StatusPinjam::{Dipinjam, Tersedia};
    vec![
        doc(1, "AKTA-001", "AKTA", "Akta Pendirian PT Sinar Jaya", 1, Tersedia, NonRestrict, date(2023, 3, 14), Some(1)),
        doc(2, "SHM-014", "SHM", "Sertifikat Hak Milik No. 014 Bekasi", 2, Dipinjam, Restrict, date(2023, 5, 2), Some(2)),
        doc(3, "PK-2023-101", "PK", "Perjanjian Kredit Investasi Nusantara Logistik", 1, Tersedia, Restrict, date(2023, 8, 21), Some(3)),
        doc(4, "SHGB-007", "SHGB", "Sertifikat HGB Ruko Cempaka", 3, Tersedia, NonRestrict, date(2023, 11, 9), Some(4)),
        doc(5, "APHT-022", "APHT", "APHT Gudang Sinar Jaya", 2, Dipinjam, NonRestrict, date(2024, 1, 17), Some(1)),
        doc(6, "PK-2024-015", "PK", "Perjanjian Kredit Modal Kerja Sumber Rejeki", 3, Tersedia, NonRestrict, date(2024, 2, 5), Some(5)),
        doc(7, "AKTA-019", "AKTA", "Akta Perubahan Anggaran Dasar Garuda Tekstil", 1, Tersedia, Restrict, date(2024, 4, 30), Some(6)),
    ]
}

pub fn disposisi() -> Vec<Disposisi> {
    let item = |id, dokumen_id, pemohon_id, alasan: &str, tanggal_pengajuan| Disposisi {
        id,
        dokumen_id,
        pemohon_id,
        alasan: alasan.into(),
        status: DisposisiStatus::Pending,
        catatan: None,
        diputuskan_oleh: None,
        tanggal_pengajuan,
        tanggal_keputusan: None,
    };
    let mut approved = item(3, 4, 2, "Pemeriksaan kepatuhan tahunan", at(2024, 3, 4, 9));
    approved.status = DisposisiStatus::Approved;
    approved.diputuskan_oleh = Some(3);
    approved.catatan = Some("Disetujui untuk audit".into());
    approved.tanggal_keputusan = Some(at(2024, 3, 5, 10));
    vec![
        item(1, 1, 3, "Verifikasi legalitas pengurus", at(2024, 5, 6, 8)),
        item(2, 3, 4, "Review perjanjian untuk restrukturisasi", at(2024, 5, 7, 13)),
        approved,
    ]
}

pub fn peminjaman() -> Vec<Peminjaman> {
    let loan = |id, dokumen_id, peminjam_id, keperluan: &str, status, tanggal_pengajuan| Peminjaman {
        id,
        dokumen_id,
        peminjam_id,
        keperluan: keperluan.into(),
        status,
        tanggal_pengajuan,
        tanggal_pinjam: None,
        tanggal_kembali: None,
        diproses_oleh: None,
    };
    let mut out_2 = loan(1, 2, 2, "Pengecekan fisik sertifikat", PeminjamanStatus::Dipinjam, at(2024, 4, 1, 9));
    out_2.tanggal_pinjam = Some(at(2024, 4, 1, 11));
    out_2.diproses_oleh = Some(3);
    let mut out_5 = loan(2, 5, 3, "Roya hak tanggungan", PeminjamanStatus::Dipinjam, at(2024, 4, 15, 9));
    out_5.tanggal_pinjam = Some(at(2024, 4, 16, 8));
    out_5.diproses_oleh = Some(1);
    let mut returned = loan(4, 1, 2, "Legalisasi salinan akta", PeminjamanStatus::Dikembalikan, at(2024, 2, 1, 9));
    returned.tanggal_pinjam = Some(at(2024, 2, 1, 14));
    returned.tanggal_kembali = Some(at(2024, 2, 3, 10));
    returned.diproses_oleh = Some(3);
    let mut rejected = loan(5, 7, 4, "Salinan untuk arsip pribadi", PeminjamanStatus::Ditolak, at(2024, 3, 11, 15));
    rejected.diproses_oleh = Some(1);
    vec![
        out_2,
        out_5,
        loan(3, 4, 3, "Pemeriksaan lapangan agunan", PeminjamanStatus::Pending, at(2024, 5, 8, 10)),
        returned,
        rejected,
    ]
}

pub fn debtors() -> Vec<Debitur> {
    let debitur = |id, cif: &str, nama: &str, cabang: &str, kolektibilitas, outstanding, level_akses| Debitur {
        id,
        cif: cif.into(),
        nama: nama.into(),
        cabang: cabang.into(),
        kolektibilitas,
        outstanding,
        level_akses,
    };
    use Kolektibilitas::*;
    use LevelAkses::{NonRestrict, Restrict};
    vec![
        debitur(1, "CIF0001", "PT Sinar Jaya", "Jakarta Pusat", Kol1, 1_250_000_000, NonRestrict),
        debitur(2, "CIF0002", "CV Berkah Abadi", "Bekasi", Kol3, 480_000_000, Restrict),
        debitur(3, "CIF0003", "PT Nusantara Logistik", "Surabaya", Kol5, 3_100_000_000, Restrict),
        debitur(4, "CIF0004", "Toko Cempaka", "Bandung", Kol2, 175_000_000, NonRestrict),
        debitur(5, "CIF0005", "UD Sumber Rejeki", "Semarang", Kol4, 620_000_000, NonRestrict),
        debitur(6, "CIF0006", "PT Garuda Tekstil", "Bandung", Kol1, 2_050_000_000, Restrict),
    ]
}

pub fn action_plans() -> Vec<ActionPlan> {
    vec![
        ActionPlan {
            id: 1,
            debitur_id: 2,
            rencana: "Restrukturisasi jadwal angsuran".into(),
            target: date(2024, 6, 30),
            status: StatusRencana::Berjalan,
        },
        ActionPlan {
            id: 2,
            debitur_id: 3,
            rencana: "Persiapan lelang agunan".into(),
            target: date(2024, 8, 31),
            status: StatusRencana::Direncanakan,
        },
        ActionPlan {
            id: 3,
            debitur_id: 5,
            rencana: "Penagihan intensif".into(),
            target: date(2024, 5, 31),
            status: StatusRencana::Selesai,
        },
    ]
}

pub fn hasil_kunjungan() -> Vec<HasilKunjungan> {
    vec![
        HasilKunjungan {
            id: 1,
            debitur_id: 2,
            tanggal: date(2024, 4, 10),
            petugas: "Agus Prasetyo".into(),
            hasil: "Usaha berjalan, arus kas tertekan".into(),
        },
        HasilKunjungan {
            id: 2,
            debitur_id: 3,
            tanggal: date(2024, 3, 22),
            petugas: "Agus Prasetyo".into(),
            hasil: "Kantor tutup, pengurus sulit dihubungi".into(),
        },
        HasilKunjungan {
            id: 3,
            debitur_id: 3,
            tanggal: date(2024, 4, 25),
            petugas: "Budi Santoso".into(),
            hasil: "Bertemu direktur, janji setor bulan depan".into(),
        },
    ]
}

pub fn surat_peringatan() -> Vec<SuratPeringatan> {
    vec![
        SuratPeringatan {
            id: 1,
            debitur_id: 3,
            nomor: "SP1/REM/2024/011".into(),
            tingkat: TingkatSp::SP1,
            tanggal: date(2024, 1, 15),
        },
        SuratPeringatan {
            id: 2,
            debitur_id: 3,
            nomor: "SP2/REM/2024/027".into(),
            tingkat: TingkatSp::SP2,
            tanggal: date(2024, 2, 15),
        },
        SuratPeringatan {
            id: 3,
            debitur_id: 5,
            nomor: "SP1/REM/2024/031".into(),
            tingkat: TingkatSp::SP1,
            tanggal: date(2024, 3, 1),
        },
    ]
}

pub fn surat() -> Vec<Surat> {
    let surat = |id, nomor: &str, perihal: &str, arah, pihak: &str, tanggal, level_akses| Surat {
        id,
        nomor: nomor.into(),
        perihal: perihal.into(),
        arah,
        pihak: pihak.into(),
        tanggal,
        level_akses,
    };
    use ArahSurat::{Keluar, Masuk};
    use LevelAkses::{NonRestrict, Restrict};
    vec![
        surat(1, "045/EXT/2024", "Permohonan salinan sertifikat", Masuk, "Kantor Notaris Hadi", date(2024, 2, 12), NonRestrict),
        surat(2, "LGL/OUT/2024/008", "Jawaban somasi", Keluar, "PT Nusantara Logistik", date(2024, 3, 3), Restrict),
        surat(3, "112/BPN/2024", "Konfirmasi roya", Masuk, "Kantor Pertanahan Bekasi", date(2024, 4, 18), Restrict),
        surat(4, "LGL/OUT/2024/015", "Undangan penandatanganan addendum", Keluar, "Toko Cempaka", date(2024, 5, 2), NonRestrict),
    ]
}
