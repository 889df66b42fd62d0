//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::collections::BTreeMap;

use ra_common::notice::Notice;
use ra_security::authorizer::ReasonCode;
use ra_security::identity::{User, UserId};
use ra_security::rbac::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

use crate::repository::{RecordId, RepositoryError};

/// Signed-in user performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }
}

/// A state change applied to a workflow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub entity: String,
    pub id: RecordId,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("{entity} #{id} tidak ditemukan")]
    NotFound { entity: &'static str, id: RecordId },
    #[error("{entity} #{id} berstatus {from}; aksi {action} tidak dapat dilakukan")]
    InvalidTransition {
        entity: &'static str,
        id: RecordId,
        from: String,
        action: String,
    },
    #[error("{}", .0.message())]
    Forbidden(ReasonCode),
    #[error("dokumen #{0} sedang dipinjam")]
    DocumentUnavailable(RecordId),
    #[error("data tidak valid: {}", summarize_fields(.0))]
    Invalid(BTreeMap<String, Vec<String>>),
}

impl WorkflowError {
    /// Toast shown for the failure.
    pub fn notice(&self) -> Notice {
        match self {
            WorkflowError::Forbidden(_) | WorkflowError::InvalidTransition { .. } => {
                Notice::warning(self.to_string())
            }
            _ => Notice::error(self.to_string()),
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        WorkflowError::Invalid(BTreeMap::from([(field.to_owned(), vec![message.into()])]))
    }
}

impl From<RepositoryError> for WorkflowError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => WorkflowError::NotFound { entity, id },
        }
    }
}

impl From<ValidationErrors> for WorkflowError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|err| {
                    err.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        WorkflowError::Invalid(fields)
    }
}

fn summarize_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
        .collect::<Vec<_>>()
        .join("; ")
}
