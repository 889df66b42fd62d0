//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Dashboard REST API and its authorizer guard."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! Route guard run in front of every `/dashboard` handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use ra_archive::Actor;
use ra_security::{AuditEvent, Decision};
use tracing::info;

use crate::error::ApiError;
use crate::state::ApiState;

/// Ask the authorizer about the request path. Allowed requests continue with
/// the caller's [`Actor`] in the extensions; denials are counted, audited,
/// and answered with 401/403.
pub async fn dashboard_guard(
    State(state): State<Arc<ApiState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = state.authenticate(request.headers());
    let role = user.as_ref().map(|u| u.role);
    let path = request.uri().path().to_owned();
    match state.authorizer().decide(role, &path) {
        Decision::Allowed => {
            if let Some(user) = &user {
                request.extensions_mut().insert(Actor::from(user));
            }
            next.run(request).await
        }
        Decision::Denied(reason) => {
            let actor = user.as_ref().map_or("anonymous", |u| u.username.as_str());
            info!(user = actor, path = %path, reason = %reason, "dashboard request denied");
            state.metrics().inc_denial(reason);
            state.audit(
                actor,
                AuditEvent::AccessDenied {
                    target: path,
                    reason,
                },
            );
            ApiError::denied(reason, role).into_response()
        }
    }
}
