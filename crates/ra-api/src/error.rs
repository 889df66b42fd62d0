//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Dashboard REST API and its authorizer guard."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ra_archive::{ExportError, MasterDataError, WorkflowError};
use ra_common::notice::{Notice, NoticeLevel};
use ra_security::{ReasonCode, Role, SignInError};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<ReasonCode>,
    level: NoticeLevel,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    reason: Option<ReasonCode>,
    notice: Notice,
    fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(status: StatusCode, notice: Notice) -> Self {
        Self {
            status,
            reason: None,
            notice,
            fields: None,
        }
    }

    /// Authorizer denial: 401 when the caller must sign in, 403 otherwise.
    pub fn denied(reason: ReasonCode, role: Option<Role>) -> Self {
        let status = if reason.requires_login() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::FORBIDDEN
        };
        Self {
            status,
            reason: Some(reason),
            notice: Notice::warning(reason.message_for(role)),
            fields: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, Notice::error(message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, Notice::error(message))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            reason: self.reason,
            level: self.notice.level,
            message: self.notice.message,
            fields: self.fields,
        });
        (self.status, body).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let notice = err.notice();
        match err {
            WorkflowError::Forbidden(reason) => ApiError::denied(reason, None),
            WorkflowError::NotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, notice),
            WorkflowError::InvalidTransition { .. } | WorkflowError::DocumentUnavailable(_) => {
                ApiError::new(StatusCode::CONFLICT, notice)
            }
            WorkflowError::Invalid(fields) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                reason: None,
                notice,
                fields: Some(fields),
            },
        }
    }
}

impl From<SignInError> for ApiError {
    fn from(err: SignInError) -> Self {
        let status = match err {
            SignInError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            SignInError::Inactive => StatusCode::FORBIDDEN,
        };
        ApiError::new(status, Notice::error(err.to_string()))
    }
}

impl From<MasterDataError> for ApiError {
    fn from(err: MasterDataError) -> Self {
        match err {
            MasterDataError::Invalid(_) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, Notice::error(err.to_string()))
            }
            other => {
                error!(error = %other, "master data storage failure");
                ApiError::internal("master data tidak dapat disimpan")
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidRow { .. } => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, Notice::error(err.to_string()))
            }
            other => {
                error!(error = %other, "csv processing failed");
                ApiError::internal("gagal memproses berkas csv")
            }
        }
    }
}
