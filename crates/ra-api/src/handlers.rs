//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Dashboard REST API and its authorizer guard."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use prometheus::{Encoder, TextEncoder};
use ra_archive::export;
use ra_archive::{
    Actor, ArahSurat, DashboardSummary, DebiturDetail, DebiturRow, DebiturSort, Disposisi,
    DisposisiAction, DisposisiSort, DocumentFilter, DocumentSort, Dokumen, ImportReport,
    Keputusan, LegalQueue, ListQuery, MasterData, NewDebitur, NewDisposisi, NewDokumen,
    NewPeminjaman, NewSurat, Page, Peminjaman, PeminjamanAction, PeminjamanSort, RecordId,
    SortDirection, StatusPinjam, Surat, SuratFilter, SuratSort, Transition, WorkflowError,
};
use ra_common::notice::Notice;
use ra_security::{
    normalize_path, AuditEvent, Decision, LevelAkses, ReasonCode, SignInError, UserProfile,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ApiError;
use crate::state::{bearer_token, ApiState};

type Shared = State<Arc<ApiState>>;

// Auth.

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in_secs: u64,
    pub user: UserProfile,
    pub notice: Notice,
}

pub async fn login(
    State(state): Shared,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    state.metrics().inc_sign_in_attempt();
    let user = match state.identity().sign_in(&request.username, &request.password) {
        Ok(user) => user,
        Err(err) => {
            state.metrics().inc_sign_in_failure();
            let actor = request.username.trim();
            state.audit(
                if actor.is_empty() { "anonymous" } else { actor },
                AuditEvent::SignInFailed {
                    reason: match err {
                        SignInError::InvalidCredentials => "invalid_credentials".into(),
                        SignInError::Inactive => "inactive".into(),
                    },
                },
            );
            return Err(err.into());
        }
    };
    let (token, ttl) = state.open_session(user.id, request.remember);
    state.audit(
        &user.username,
        AuditEvent::SignIn {
            persistent: request.remember,
        },
    );
    info!(user = %user.username, remember = request.remember, "user signed in");
    Ok(Json(LoginResponse {
        token: token.to_string(),
        expires_in_secs: ttl.as_secs(),
        notice: Notice::success(format!("Selamat datang, {}", user.nama_lengkap)),
        user: user.profile(),
    }))
}

pub async fn logout(State(state): Shared, headers: HeaderMap) -> Result<Json<Notice>, ApiError> {
    let user = state
        .authenticate(&headers)
        .ok_or_else(|| ApiError::denied(ReasonCode::AuthRequired, None))?;
    if let Some(token) = bearer_token(&headers) {
        state.close_session(token);
    }
    state.audit(&user.username, AuditEvent::SignOut);
    Ok(Json(Notice::success("Anda telah keluar.")))
}

pub async fn me(State(state): Shared, headers: HeaderMap) -> Result<Json<UserProfile>, ApiError> {
    state
        .authenticate(&headers)
        .map(|user| Json(user.profile()))
        .ok_or_else(|| ApiError::denied(ReasonCode::AuthRequired, None))
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub path: String,
    #[serde(flatten)]
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Route decision for the caller, used by the front end before navigating.
pub async fn authorize(
    State(state): Shared,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> Json<AuthorizeResponse> {
    let role = state.authenticate(&headers).map(|u| u.role);
    let decision = state.authorizer().decide(role, &params.path);
    Json(AuthorizeResponse {
        path: normalize_path(&params.path),
        message: decision.reason().map(|r| r.message_for(role)),
        decision,
    })
}

pub async fn metrics(State(state): Shared) -> Response {
    let families = state.metrics().registry().gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    match encoder.encode(&families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            )],
            buffer,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding error").into_response()
        }
    }
}

// Shared helpers.

/// Search, sort, and page parameters shared by the table endpoints.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>"))]
pub struct TableParams<K> {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<K>,
    #[serde(default)]
    pub dir: Option<SortDirection>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

impl<K: Copy> TableParams<K> {
    fn query(&self) -> ListQuery<K> {
        let mut query = ListQuery::default();
        if let Some(q) = &self.q {
            query = query.search(q.clone());
        }
        if let Some(key) = self.sort {
            query = query.sort(key, self.dir.unwrap_or_default());
        }
        query.page(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(ra_archive::query::DEFAULT_PER_PAGE),
        )
    }
}

/// Map a workflow failure, counting and auditing action-level denials.
fn reject(state: &ApiState, actor: &Actor, target: &str, err: WorkflowError) -> ApiError {
    if let WorkflowError::Forbidden(reason) = &err {
        state.metrics().inc_denial(*reason);
        state.audit(
            &actor.username,
            AuditEvent::AccessDenied {
                target: target.to_owned(),
                reason: *reason,
            },
        );
        return ApiError::denied(*reason, Some(actor.role));
    }
    err.into()
}

fn audit_transition(state: &ApiState, actor: &Actor, transition: &Transition) {
    state.audit(
        &actor.username,
        AuditEvent::Transition {
            entity: transition.entity.clone(),
            id: transition.id,
            from: transition.from.clone(),
            to: transition.to.clone(),
        },
    );
}

#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    pub data: T,
    pub notice: Notice,
}

fn outcome<T>(data: T, message: impl Into<String>) -> Json<Outcome<T>> {
    Json(Outcome {
        data,
        notice: Notice::success(message),
    })
}

// Dashboard.

pub async fn summary(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
) -> Json<DashboardSummary> {
    Json(state.archive().dashboard_summary(actor.role))
}

pub async fn profile(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .identity()
        .user(actor.id)
        .map(|user| Json(user.profile()))
        .ok_or_else(|| ApiError::not_found("pengguna tidak ditemukan"))
}

pub async fn users(State(state): Shared) -> Json<Vec<UserProfile>> {
    Json(state.identity().users())
}

pub async fn legal_queue(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
) -> Result<Json<LegalQueue>, ApiError> {
    state
        .archive()
        .legal_queue(&actor)
        .map(Json)
        .map_err(|err| reject(&state, &actor, "legal.queue", err))
}

// Correspondence.

#[derive(Debug, Deserialize)]
pub struct SuratParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<SuratSort>,
    #[serde(default)]
    pub dir: Option<SortDirection>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
    #[serde(default)]
    pub arah: Option<ArahSurat>,
    #[serde(default)]
    pub dari: Option<NaiveDate>,
    #[serde(default)]
    pub sampai: Option<NaiveDate>,
}

pub async fn list_surat(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Query(params): Query<SuratParams>,
) -> Json<Page<Surat>> {
    let filter = SuratFilter {
        arah: params.arah,
        dari: params.dari,
        sampai: params.sampai,
    };
    let table = TableParams {
        q: params.q,
        sort: params.sort,
        dir: params.dir,
        page: params.page,
        per_page: params.per_page,
    };
    let letters = filter.apply(state.archive().surat(actor.role));
    Json(table.query().apply(letters))
}

pub async fn create_surat(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Json(form): Json<NewSurat>,
) -> Result<(StatusCode, Json<Outcome<Surat>>), ApiError> {
    let surat = state
        .archive()
        .create_surat(&actor, form)
        .map_err(|err| reject(&state, &actor, "surat.create", err))?;
    let message = format!("Surat {} berhasil dicatat", surat.nomor);
    Ok((StatusCode::CREATED, outcome(surat, message)))
}

// Debtors.

pub async fn list_debtors(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Query(params): Query<TableParams<DebiturSort>>,
) -> Json<Page<DebiturRow>> {
    let debtors = state.archive().debtors(actor.role);
    Json(params.query().apply(debtors).map(DebiturRow::from))
}

pub async fn debtor_detail(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Path(id): Path<RecordId>,
) -> Result<Json<DebiturDetail>, ApiError> {
    Ok(Json(state.archive().debtor_detail(actor.role, id)?))
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub rows: Vec<NewDebitur>,
}

/// Accepts `{"rows": [...]}` JSON or a `text/csv` sheet.
fn parse_upload(headers: &HeaderMap, body: &Bytes) -> Result<Vec<NewDebitur>, ApiError> {
    let is_csv = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/csv"));
    if is_csv {
        return Ok(export::read_debtor_upload(body.as_ref())?);
    }
    serde_json::from_slice::<UploadRequest>(body)
        .map(|request| request.rows)
        .map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                Notice::error(format!("format unggahan tidak valid: {err}")),
            )
        })
}

fn upload_debtors(
    state: &ApiState,
    actor: &Actor,
    level: LevelAkses,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Json<Outcome<ImportReport>>, ApiError> {
    let rows = parse_upload(headers, body)?;
    let report = state
        .archive()
        .import_debtors(actor, level, rows)
        .map_err(|err| reject(state, actor, "debitur.upload", err))?;
    let message = format!(
        "{} debitur ditambahkan, {} dilewati",
        report.inserted.len(),
        report.skipped.len()
    );
    Ok(outcome(report, message))
}

pub async fn upload_restrict(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Outcome<ImportReport>>, ApiError> {
    upload_debtors(&state, &actor, LevelAkses::Restrict, &headers, &body)
}

pub async fn upload_non_restrict(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Outcome<ImportReport>>, ApiError> {
    upload_debtors(&state, &actor, LevelAkses::NonRestrict, &headers, &body)
}

// Digital archive: documents.

#[derive(Debug, Deserialize)]
pub struct DocumentParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<DocumentSort>,
    #[serde(default)]
    pub dir: Option<SortDirection>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
    #[serde(default)]
    pub jenis: Option<String>,
    #[serde(default)]
    pub status: Option<StatusPinjam>,
    #[serde(default)]
    pub level: Option<LevelAkses>,
    #[serde(default)]
    pub lokasi_id: Option<RecordId>,
}

impl DocumentParams {
    fn split(self) -> (DocumentFilter, TableParams<DocumentSort>) {
        (
            DocumentFilter {
                jenis: self.jenis,
                status: self.status,
                level: self.level,
                lokasi_id: self.lokasi_id,
            },
            TableParams {
                q: self.q,
                sort: self.sort,
                dir: self.dir,
                page: self.page,
                per_page: self.per_page,
            },
        )
    }
}

pub async fn list_documents(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Query(params): Query<DocumentParams>,
) -> Json<Page<Dokumen>> {
    let (filter, table) = params.split();
    let documents = filter.apply(state.archive().documents(actor.role));
    Json(table.query().apply(documents))
}

pub async fn create_document(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Json(form): Json<NewDokumen>,
) -> Result<(StatusCode, Json<Outcome<Dokumen>>), ApiError> {
    let master = state.master_data().load();
    let doc = state
        .archive()
        .create_document(&actor, form, &master)
        .map_err(|err| reject(&state, &actor, "dokumen.create", err))?;
    let message = format!("Dokumen {} berhasil ditambahkan", doc.kode);
    Ok((StatusCode::CREATED, outcome(doc, message)))
}

/// Self-service search page: free text over every visible document.
pub async fn search_documents(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Query(params): Query<TableParams<DocumentSort>>,
) -> Json<Page<Dokumen>> {
    Json(params.query().apply(state.archive().documents(actor.role)))
}

// Digital archive: dispositions.

pub async fn list_disposisi(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Query(params): Query<TableParams<DisposisiSort>>,
) -> Json<Page<Disposisi>> {
    Json(params.query().apply(state.archive().disposisi(actor.role)))
}

pub async fn submit_disposisi(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Json(form): Json<NewDisposisi>,
) -> Result<(StatusCode, Json<Outcome<Disposisi>>), ApiError> {
    let item = state
        .archive()
        .submit_disposisi(&actor, form, Utc::now())
        .map_err(|err| reject(&state, &actor, "disposisi.submit", err))?;
    Ok((
        StatusCode::CREATED,
        outcome(item, "Permohonan disposisi berhasil diajukan"),
    ))
}

pub async fn decide_disposisi(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Path((id, action)): Path<(RecordId, DisposisiAction)>,
    body: Option<Json<Keputusan>>,
) -> Result<Json<Outcome<Disposisi>>, ApiError> {
    let catatan = body.and_then(|Json(k)| k.catatan);
    let target = format!("disposisi.{action}");
    let (item, transition) = state
        .archive()
        .decide_disposisi(&actor, id, action, catatan, Utc::now())
        .map_err(|err| reject(&state, &actor, &target, err))?;
    audit_transition(&state, &actor, &transition);
    let message = match action {
        DisposisiAction::Approve => "Disposisi disetujui",
        DisposisiAction::Reject => "Disposisi ditolak",
    };
    Ok(outcome(item, message))
}

// Digital archive: loans.

pub async fn list_peminjaman(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Query(params): Query<TableParams<PeminjamanSort>>,
) -> Json<Page<Peminjaman>> {
    Json(params.query().apply(state.archive().peminjaman(actor.role)))
}

pub async fn submit_peminjaman(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Json(form): Json<NewPeminjaman>,
) -> Result<(StatusCode, Json<Outcome<Peminjaman>>), ApiError> {
    let loan = state
        .archive()
        .submit_peminjaman(&actor, form, Utc::now())
        .map_err(|err| reject(&state, &actor, "peminjaman.submit", err))?;
    Ok((
        StatusCode::CREATED,
        outcome(loan, "Permohonan peminjaman berhasil diajukan"),
    ))
}

fn process_loan(
    state: &ApiState,
    actor: &Actor,
    id: RecordId,
    action: PeminjamanAction,
) -> Result<Json<Outcome<Peminjaman>>, ApiError> {
    let (loan, transition) = state
        .archive()
        .process_peminjaman(actor, id, action, Utc::now())
        .map_err(|err| reject(state, actor, &format!("peminjaman.{action}"), err))?;
    audit_transition(state, actor, &transition);
    let message = match action {
        PeminjamanAction::Accept => "Peminjaman disetujui",
        PeminjamanAction::Reject => "Peminjaman ditolak",
        PeminjamanAction::Return => "Dokumen telah dikembalikan",
    };
    Ok(outcome(loan, message))
}

pub async fn accept_peminjaman(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Path(id): Path<RecordId>,
) -> Result<Json<Outcome<Peminjaman>>, ApiError> {
    process_loan(&state, &actor, id, PeminjamanAction::Accept)
}

pub async fn reject_peminjaman(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Path(id): Path<RecordId>,
) -> Result<Json<Outcome<Peminjaman>>, ApiError> {
    process_loan(&state, &actor, id, PeminjamanAction::Reject)
}

pub async fn return_peminjaman(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Path(id): Path<RecordId>,
) -> Result<Json<Outcome<Peminjaman>>, ApiError> {
    process_loan(&state, &actor, id, PeminjamanAction::Return)
}

// Digital archive: parameters and export.

pub async fn get_master_data(State(state): Shared) -> Json<MasterData> {
    Json(state.master_data().load())
}

pub async fn put_master_data(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Json(data): Json<MasterData>,
) -> Result<Json<Outcome<MasterData>>, ApiError> {
    state.master_data().save(&data)?;
    state.audit(
        &actor.username,
        AuditEvent::MasterDataChanged {
            change: format!(
                "replaced: {} lokasi, {} jenis dokumen",
                data.lokasi_penyimpanan.len(),
                data.jenis_dokumen.len()
            ),
        },
    );
    Ok(outcome(data, "Master data berhasil disimpan"))
}

pub async fn reset_master_data(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Outcome<MasterData>>, ApiError> {
    state.master_data().reset()?;
    state.audit(
        &actor.username,
        AuditEvent::MasterDataChanged {
            change: "reset to defaults".into(),
        },
    );
    Ok(outcome(
        state.master_data().load(),
        "Master data dikembalikan ke bawaan",
    ))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportData {
    #[default]
    Dokumen,
    Debitur,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub data: ExportData,
    #[serde(default)]
    pub q: Option<String>,
}

/// CSV download of every visible row matching the search text.
pub async fn export_csv(
    State(state): Shared,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let (body, name) = match params.data {
        ExportData::Dokumen => {
            let mut query = ListQuery::<DocumentSort>::default();
            if let Some(q) = params.q {
                query = query.search(q);
            }
            let rows = query.filter_sorted(state.archive().documents(actor.role));
            (
                export::documents_csv(&rows, &state.master_data().load())?,
                "dokumen",
            )
        }
        ExportData::Debitur => {
            let mut query = ListQuery::<DebiturSort>::default();
            if let Some(q) = params.q {
                query = query.search(q);
            }
            let rows = query.filter_sorted(state.archive().debtors(actor.role));
            (export::debtors_csv(&rows)?, "debitur")
        }
    };
    let filename = format!(
        "attachment; filename=\"{name}-{}.csv\"",
        Utc::now().format("%Y%m%d")
    );
    let disposition = HeaderValue::from_str(&filename)
        .map_err(|_| ApiError::internal("nama berkas ekspor tidak valid"))?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
