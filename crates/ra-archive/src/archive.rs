//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Shared archive state: every repository plus the operations that span
//! more than one of them.
//!
//! Reads filter by the caller's role. Writes check the matching capability
//! before touching any record, and workflow transitions are serialized so a
//! loan accept and the document status change land together.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use ra_security::authorizer::{authorize_action, authorize_with, Decision};
use ra_security::rbac::{can_view_data_by_level, Capability, LevelAkses, Role};
use serde::Serialize;
use tracing::{debug, info};
use validator::Validate;

use crate::debitur::{
    self, ActionPlan, Debitur, DebiturDetail, HasilKunjungan, ImportReport, NewDebitur,
    SuratPeringatan,
};
use crate::disposisi::{Disposisi, DisposisiAction, DisposisiStatus, NewDisposisi};
use crate::document::{filter_digital_documents, filter_visible, Dokumen, NewDokumen, StatusPinjam};
use crate::master_data::MasterData;
use crate::peminjaman::{NewPeminjaman, Peminjaman, PeminjamanAction, PeminjamanStatus};
use crate::repository::{MemoryRepository, Record, RecordId, Repository};
use crate::seed;
use crate::surat::{NewSurat, Surat};
use crate::workflow::{Actor, Transition, WorkflowError};

/// Pending items awaiting a legal decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegalQueue {
    pub disposisi: Vec<Disposisi>,
    pub peminjaman: Vec<Peminjaman>,
}

/// Landing-page counters, computed over what the role can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub role: Role,
    pub dokumen_total: usize,
    pub dokumen_dipinjam: usize,
    pub disposisi_pending: usize,
    pub peminjaman_pending: usize,
    pub peminjaman_aktif: usize,
    pub debitur_total: usize,
    /// Debtors at Kol 3 or worse.
    pub debitur_bermasalah: usize,
    pub surat_total: usize,
    pub kolektibilitas: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct ArchiveState {
    documents: MemoryRepository<Dokumen>,
    disposisi: MemoryRepository<Disposisi>,
    peminjaman: MemoryRepository<Peminjaman>,
    debtors: MemoryRepository<Debitur>,
    action_plans: MemoryRepository<ActionPlan>,
    visits: MemoryRepository<HasilKunjungan>,
    warnings: MemoryRepository<SuratPeringatan>,
    surat: MemoryRepository<Surat>,
    workflow: Mutex<()>,
}

fn require(actor: &Actor, capability: Capability) -> Result<(), WorkflowError> {
    match authorize_action(Some(actor.role), capability) {
        Decision::Allowed => Ok(()),
        Decision::Denied(reason) => Err(WorkflowError::Forbidden(reason)),
    }
}

/// Capability needed to write data at `level`.
fn level_capability(level: LevelAkses) -> Capability {
    match level {
        LevelAkses::Restrict => Capability::AccessRestrictData,
        LevelAkses::NonRestrict => Capability::AccessNonRestrictData,
    }
}

impl ArchiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State loaded with the compiled-in demo records.
    pub fn seeded() -> Self {
        Self {
            documents: MemoryRepository::seeded(seed::documents()),
            disposisi: MemoryRepository::seeded(seed::disposisi()),
            peminjaman: MemoryRepository::seeded(seed::peminjaman()),
            debtors: MemoryRepository::seeded(seed::debtors()),
            action_plans: MemoryRepository::seeded(seed::action_plans()),
            visits: MemoryRepository::seeded(seed::hasil_kunjungan()),
            warnings: MemoryRepository::seeded(seed::surat_peringatan()),
            surat: MemoryRepository::seeded(seed::surat()),
            workflow: Mutex::new(()),
        }
    }

    // Documents.

    pub fn documents(&self, role: Role) -> Vec<Dokumen> {
        filter_digital_documents(role, self.documents.list())
    }

    /// A document the role may see. Hidden documents report as not found.
    pub fn document(&self, role: Role, id: RecordId) -> Result<Dokumen, WorkflowError> {
        self.documents
            .get(id)
            .filter(|doc| can_view_data_by_level(role, doc.level_akses))
            .ok_or(WorkflowError::NotFound {
                entity: Dokumen::ENTITY,
                id,
            })
    }

    pub fn create_document(
        &self,
        actor: &Actor,
        form: NewDokumen,
        master: &MasterData,
    ) -> Result<Dokumen, WorkflowError> {
        require(actor, Capability::AccessDigitalArchiveAdmin)?;
        let form = form.normalized();
        form.validate()?;
        require(actor, level_capability(form.level_akses))?;
        if master.jenis(&form.jenis).is_none() {
            return Err(WorkflowError::invalid_field(
                "jenis",
                format!("jenis dokumen {} tidak terdaftar", form.jenis),
            ));
        }
        if master.lokasi(form.lokasi_id).is_none() {
            return Err(WorkflowError::invalid_field(
                "lokasi_id",
                format!("lokasi #{} tidak terdaftar", form.lokasi_id),
            ));
        }
        let _guard = self.workflow.lock();
        if self
            .documents
            .list()
            .iter()
            .any(|doc| doc.kode.eq_ignore_ascii_case(&form.kode))
        {
            return Err(WorkflowError::invalid_field(
                "kode",
                format!("kode dokumen {} sudah digunakan", form.kode),
            ));
        }
        let doc = self.documents.insert(form.into_dokumen());
        info!(user = %actor.username, dokumen_id = doc.id, kode = %doc.kode, "document created");
        Ok(doc)
    }

    // Dispositions.

    /// Requests on documents the role can see.
    pub fn disposisi(&self, role: Role) -> Vec<Disposisi> {
        let visible = self.visible_document_ids(role);
        self.disposisi
            .list()
            .into_iter()
            .filter(|d| visible.contains(&d.dokumen_id))
            .collect()
    }

    pub fn submit_disposisi(
        &self,
        actor: &Actor,
        form: NewDisposisi,
        now: DateTime<Utc>,
    ) -> Result<Disposisi, WorkflowError> {
        require(actor, Capability::AccessDigitalArchive)?;
        let form = NewDisposisi {
            alasan: form.alasan.trim().to_owned(),
            ..form
        };
        form.validate()?;
        self.document(actor.role, form.dokumen_id)?;
        let item = self.disposisi.insert(Disposisi {
            id: 0,
            dokumen_id: form.dokumen_id,
            pemohon_id: actor.id,
            alasan: form.alasan,
            status: DisposisiStatus::Pending,
            catatan: None,
            diputuskan_oleh: None,
            tanggal_pengajuan: now,
            tanggal_keputusan: None,
        });
        debug!(user = %actor.username, disposisi_id = item.id, "disposition submitted");
        Ok(item)
    }

    /// Approve or reject a pending request. Requests on documents hidden
    /// from the actor's role report as not found.
    pub fn decide_disposisi(
        &self,
        actor: &Actor,
        id: RecordId,
        action: DisposisiAction,
        catatan: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Disposisi, Transition), WorkflowError> {
        require(actor, Capability::ApproveLegal)?;
        let _guard = self.workflow.lock();
        let missing = || WorkflowError::NotFound {
            entity: Disposisi::ENTITY,
            id,
        };
        let mut item = self.disposisi.get(id).ok_or_else(missing)?;
        if self.document(actor.role, item.dokumen_id).is_err() {
            return Err(missing());
        }
        let transition = item.decide(action, actor.id, catatan, now)?;
        let item = self.disposisi.update(item)?;
        info!(
            user = %actor.username,
            disposisi_id = id,
            from = %transition.from,
            to = %transition.to,
            "disposition decided"
        );
        Ok((item, transition))
    }

    // Loans.

    pub fn peminjaman(&self, role: Role) -> Vec<Peminjaman> {
        let visible = self.visible_document_ids(role);
        self.peminjaman
            .list()
            .into_iter()
            .filter(|p| visible.contains(&p.dokumen_id))
            .collect()
    }

    pub fn submit_peminjaman(
        &self,
        actor: &Actor,
        form: NewPeminjaman,
        now: DateTime<Utc>,
    ) -> Result<Peminjaman, WorkflowError> {
        require(actor, Capability::AccessDigitalArchive)?;
        let form = NewPeminjaman {
            keperluan: form.keperluan.trim().to_owned(),
            ..form
        };
        form.validate()?;
        let doc = self.document(actor.role, form.dokumen_id)?;
        if !doc.is_available() {
            return Err(WorkflowError::DocumentUnavailable(doc.id));
        }
        let loan = self.peminjaman.insert(Peminjaman {
            id: 0,
            dokumen_id: doc.id,
            peminjam_id: actor.id,
            keperluan: form.keperluan,
            status: PeminjamanStatus::Pending,
            tanggal_pengajuan: now,
            tanggal_pinjam: None,
            tanggal_kembali: None,
            diproses_oleh: None,
        });
        debug!(user = %actor.username, peminjaman_id = loan.id, "loan requested");
        Ok(loan)
    }

    /// Accept, reject, or return a loan. Accepting marks the document as
    /// borrowed; returning makes it available again. The borrower may return
    /// their own loan without the approval capability. Loans on documents
    /// hidden from the actor's role report as not found.
    pub fn process_peminjaman(
        &self,
        actor: &Actor,
        id: RecordId,
        action: PeminjamanAction,
        now: DateTime<Utc>,
    ) -> Result<(Peminjaman, Transition), WorkflowError> {
        let _guard = self.workflow.lock();
        let missing = || WorkflowError::NotFound {
            entity: Peminjaman::ENTITY,
            id,
        };
        let mut loan = self.peminjaman.get(id).ok_or_else(missing)?;
        let Ok(mut doc) = self.document(actor.role, loan.dokumen_id) else {
            return Err(missing());
        };
        let own_loan = action.borrower_may_perform() && loan.peminjam_id == actor.id;
        let capability = action.required_capability();
        if let Decision::Denied(reason) = authorize_with(
            Some(actor.role),
            |role| own_loan || capability.allows(role),
            capability.denial_reason(),
        ) {
            return Err(WorkflowError::Forbidden(reason));
        }

        if action == PeminjamanAction::Accept && !doc.is_available() {
            return Err(WorkflowError::DocumentUnavailable(doc.id));
        }
        let transition = loan.transition(action, actor.id, now)?;
        let status = if loan.status.holds_document() {
            StatusPinjam::Dipinjam
        } else {
            StatusPinjam::Tersedia
        };
        if matches!(action, PeminjamanAction::Accept | PeminjamanAction::Return) {
            doc.status_pinjam = status;
            self.documents.update(doc)?;
        }
        let loan = self.peminjaman.update(loan)?;
        info!(
            user = %actor.username,
            peminjaman_id = id,
            from = %transition.from,
            to = %transition.to,
            "loan processed"
        );
        Ok((loan, transition))
    }

    pub fn legal_queue(&self, actor: &Actor) -> Result<LegalQueue, WorkflowError> {
        require(actor, Capability::AccessLegalModule)?;
        Ok(LegalQueue {
            disposisi: self
                .disposisi(actor.role)
                .into_iter()
                .filter(|d| d.status == DisposisiStatus::Pending)
                .collect(),
            peminjaman: self
                .peminjaman(actor.role)
                .into_iter()
                .filter(|p| p.status == PeminjamanStatus::Pending)
                .collect(),
        })
    }

    // Debtors.

    pub fn debtors(&self, role: Role) -> Vec<Debitur> {
        filter_visible(role, self.debtors.list())
    }

    pub fn debtor_detail(&self, role: Role, id: RecordId) -> Result<DebiturDetail, WorkflowError> {
        let debitur = self
            .debtors
            .get(id)
            .filter(|d| can_view_data_by_level(role, d.level_akses))
            .ok_or(WorkflowError::NotFound {
                entity: Debitur::ENTITY,
                id,
            })?;
        Ok(DebiturDetail::assemble(
            debitur,
            &self.action_plans.list(),
            &self.visits.list(),
            &self.warnings.list(),
        ))
    }

    /// Append uploaded rows at `level`. Rows that fail validation or repeat
    /// a known CIF are skipped and reported.
    pub fn import_debtors(
        &self,
        actor: &Actor,
        level: LevelAkses,
        rows: Vec<NewDebitur>,
    ) -> Result<ImportReport, WorkflowError> {
        require(actor, level_capability(level))?;
        let _guard = self.workflow.lock();
        let existing: HashSet<String> = self.debtors.list().into_iter().map(|d| d.cif).collect();
        let (accepted, skipped) = debitur::screen_upload(&existing, rows);
        let inserted = accepted
            .into_iter()
            .map(|row| self.debtors.insert(row.into_debitur(level)).id)
            .collect::<Vec<_>>();
        info!(
            user = %actor.username,
            level = %level,
            inserted = inserted.len(),
            skipped = skipped.len(),
            "debtor upload imported"
        );
        Ok(ImportReport { inserted, skipped })
    }

    // Correspondence.

    pub fn surat(&self, role: Role) -> Vec<Surat> {
        filter_visible(role, self.surat.list())
    }

    pub fn create_surat(&self, actor: &Actor, form: NewSurat) -> Result<Surat, WorkflowError> {
        let form = form.normalized();
        form.validate()?;
        if !can_view_data_by_level(actor.role, form.level_akses) {
            return Err(WorkflowError::Forbidden(
                level_capability(form.level_akses).denial_reason(),
            ));
        }
        let surat = self.surat.insert(form.into_surat());
        debug!(user = %actor.username, surat_id = surat.id, "letter registered");
        Ok(surat)
    }

    pub fn dashboard_summary(&self, role: Role) -> DashboardSummary {
        let documents = self.documents(role);
        let disposisi = self.disposisi(role);
        let peminjaman = self.peminjaman(role);
        let debtors = self.debtors(role);
        DashboardSummary {
            role,
            dokumen_total: documents.len(),
            dokumen_dipinjam: documents.iter().filter(|d| !d.is_available()).count(),
            disposisi_pending: disposisi
                .iter()
                .filter(|d| d.status == DisposisiStatus::Pending)
                .count(),
            peminjaman_pending: peminjaman
                .iter()
                .filter(|p| p.status == PeminjamanStatus::Pending)
                .count(),
            peminjaman_aktif: peminjaman.iter().filter(|p| p.status.holds_document()).count(),
            debitur_total: debtors.len(),
            debitur_bermasalah: debtors
                .iter()
                .filter(|d| d.kolektibilitas.is_non_performing())
                .count(),
            surat_total: self.surat(role).len(),
            kolektibilitas: debitur::collectibility_summary(&debtors),
        }
    }

    fn visible_document_ids(&self, role: Role) -> HashSet<RecordId> {
        self.documents(role).into_iter().map(|d| d.id).collect()
    }
}
