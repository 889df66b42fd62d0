//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Archive domain for Ruwang Arsip: documents and their visibility rule,
//! disposition and loan workflows, debtors, correspondence, master data,
//! table queries, and CSV export.

pub mod archive;
pub mod debitur;
pub mod disposisi;
pub mod document;
pub mod export;
pub mod master_data;
pub mod peminjaman;
pub mod query;
pub mod repository;
pub mod seed;
pub mod surat;
pub mod workflow;

pub use archive::{ArchiveState, DashboardSummary, LegalQueue};
pub use debitur::{
    Badge, BadgeColor, Debitur, DebiturDetail, DebiturRow, DebiturSort, ImportReport,
    Kolektibilitas, NewDebitur,
};
pub use disposisi::{Disposisi, DisposisiAction, DisposisiSort, DisposisiStatus, Keputusan, NewDisposisi};
pub use document::{
    filter_digital_documents, filter_visible, Classified, DocumentFilter, DocumentSort, Dokumen,
    NewDokumen, StatusPinjam,
};
pub use export::ExportError;
pub use master_data::{
    JenisDokumen, LokasiPenyimpanan, MasterData, MasterDataError, MasterDataStore, MASTER_DATA_KEY,
};
pub use peminjaman::{NewPeminjaman, Peminjaman, PeminjamanAction, PeminjamanSort, PeminjamanStatus};
pub use query::{ListQuery, Page, PageRequest, SortDirection};
pub use repository::{MemoryRepository, Record, RecordId, Repository, RepositoryError};
pub use surat::{ArahSurat, NewSurat, Surat, SuratFilter, SuratSort};
pub use workflow::{Actor, Transition, WorkflowError};
