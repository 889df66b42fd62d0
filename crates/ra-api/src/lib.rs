//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Dashboard REST API and its authorizer guard."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub mod error;
pub mod guard;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::ApiState;

/// Handle to the running API server.
#[derive(Debug)]
pub struct ApiServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ApiServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(err.into()),
        }
    }
}

/// Every route of the dashboard back end. The guard wraps the whole router
/// so unknown `/dashboard` paths are denied rather than answered with 404.
pub fn build_router(state: Arc<ApiState>) -> Router {
    use handlers as h;

    Router::new()
        .route("/api/auth/login", post(h::login))
        .route("/api/auth/logout", post(h::logout))
        .route("/api/auth/me", get(h::me))
        .route("/api/authorize", get(h::authorize))
        .route("/metrics", get(h::metrics))
        .route("/dashboard", get(h::summary))
        .route("/dashboard/profil", get(h::profile))
        .route("/dashboard/users", get(h::users))
        .route("/dashboard/legal", get(h::legal_queue))
        .route("/dashboard/surat", get(h::list_surat).post(h::create_surat))
        .route("/dashboard/informasi-debitur", get(h::list_debtors))
        .route("/dashboard/informasi-debitur/:id", get(h::debtor_detail))
        .route(
            "/dashboard/informasi-debitur/admin/upload-restrik",
            post(h::upload_restrict),
        )
        .route(
            "/dashboard/informasi-debitur/admin/upload",
            post(h::upload_non_restrict),
        )
        .route(
            "/dashboard/arsip-digital/dokumen",
            get(h::list_documents).post(h::create_document),
        )
        .route("/dashboard/arsip-digital/pencarian", get(h::search_documents))
        .route(
            "/dashboard/arsip-digital/disposisi",
            get(h::list_disposisi).post(h::submit_disposisi),
        )
        .route(
            "/dashboard/arsip-digital/disposisi/:id/:action",
            post(h::decide_disposisi),
        )
        .route(
            "/dashboard/arsip-digital/peminjaman",
            get(h::list_peminjaman).post(h::submit_peminjaman),
        )
        .route(
            "/dashboard/arsip-digital/peminjaman/accept/:id",
            post(h::accept_peminjaman),
        )
        .route(
            "/dashboard/arsip-digital/peminjaman/:id/reject",
            post(h::reject_peminjaman),
        )
        .route(
            "/dashboard/arsip-digital/peminjaman/:id/return",
            post(h::return_peminjaman),
        )
        .route(
            "/dashboard/arsip-digital/parameter/master-data",
            get(h::get_master_data)
                .put(h::put_master_data)
                .delete(h::reset_master_data),
        )
        .route("/dashboard/arsip-digital/export", get(h::export_csv))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::dashboard_guard,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve the API until [`ApiServer::shutdown`].
pub fn spawn_api_server(state: Arc<ApiState>, addr: SocketAddr) -> Result<ApiServer> {
    let router = build_router(state);

    let listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind API listener {addr}"))?;
    listener
        .set_nonblocking(true)
        .context("failed to configure API listener as non-blocking")?;
    let addr = listener.local_addr().unwrap_or(addr);
    let tcp_listener =
        TcpListener::from_std(listener).context("failed to create tokio listener")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        info!(address = %addr, "api server listening");
        if let Err(err) = axum::serve(tcp_listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
        {
            error!(address = %addr, error = %err, "api server exited with error");
            return Err(err.into());
        }
        Ok(())
    });

    Ok(ApiServer {
        addr,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}
