//! ---
//! ra_section: "15-testing-qa-runbook"
//! ra_subsection: "integration-tests"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Integration and validation tests for the Ruwang Arsip stack."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use ra_api::{build_router, ApiState};
use ra_archive::seed;
use ra_common::config::AppConfig;
use ra_security::{AuditLog, IdentityProvider};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

fn config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.directory = dir.join("storage");
    config.audit.enabled = true;
    config.audit.path = dir.join("audit.log");
    config.logging.directory = dir.join("logs");
    config
}

fn router(config: &AppConfig) -> Router {
    let state = ApiState::from_config(config, IdentityProvider::with_users(seed::users())).unwrap();
    build_router(Arc::new(state))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": format!("{username}123")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {username}: {body}");
    body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn borrower_request_accept_and_return() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let app = router(&config);

    let restrict = login(&app, "restrict").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/dashboard/arsip-digital/peminjaman",
        Some(&restrict),
        Some(json!({"dokumen_id": 3, "keperluan": "Pemeriksaan agunan"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let loan_id = body["data"]["id"].as_u64().unwrap();
    assert_eq!(loan_id, 6);

    let full = login(&app, "full").await;
    let (status, body) = call(&app, Method::GET, "/dashboard/legal", Some(&full), None).await;
    assert_eq!(status, StatusCode::OK);
    let pending: Vec<u64> = body["peminjaman"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert!(pending.contains(&loan_id));

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/dashboard/arsip-digital/peminjaman/accept/{loan_id}"),
        Some(&full),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(
        &app,
        Method::GET,
        "/dashboard/arsip-digital/dokumen?q=PK-2023",
        Some(&restrict),
        None,
    )
    .await;
    assert_eq!(body["items"][0]["status_pinjam"], "Dipinjam");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/dashboard/arsip-digital/peminjaman/{loan_id}/return"),
        Some(&restrict),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Dikembalikan");

    let actions: Vec<String> = AuditLog::open(&config.audit.path)
        .unwrap()
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        [
            "auth.sign_in",
            "auth.sign_in",
            "peminjaman.transition",
            "peminjaman.transition"
        ]
    );
}

#[tokio::test]
async fn master_data_persists_across_restarts() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let app = router(&config);
    let admin = login(&app, "admin").await;

    let mut data = serde_json::to_value(seed::master_data()).unwrap();
    data["jenis_dokumen"]
        .as_array_mut()
        .unwrap()
        .push(json!({"kode": "BPKB", "nama": "Bukti Pemilikan Kendaraan"}));
    let (status, _) = call(
        &app,
        Method::PUT,
        "/dashboard/arsip-digital/parameter/master-data",
        Some(&admin),
        Some(data.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let restarted = router(&config);
    let admin = login(&restarted, "admin").await;
    let (_, body) = call(
        &restarted,
        Method::GET,
        "/dashboard/arsip-digital/parameter/master-data",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body, data);

    let (status, body) = call(
        &restarted,
        Method::POST,
        "/dashboard/arsip-digital/dokumen",
        Some(&admin),
        Some(json!({
            "kode": "BPKB-001",
            "jenis": "BPKB",
            "nama": "BPKB Truk Operasional",
            "lokasi_id": 2,
            "level_akses": "RESTRICT",
            "tanggal": "2024-07-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["id"], 8);

    let (status, _) = call(
        &restarted,
        Method::DELETE,
        "/dashboard/arsip-digital/parameter/master-data",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(
        &restarted,
        Method::GET,
        "/dashboard/arsip-digital/parameter/master-data",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body, serde_json::to_value(seed::master_data()).unwrap());
}

#[tokio::test]
async fn debtor_pages_follow_role_levels() {
    let dir = tempdir().unwrap();
    let app = router(&config(dir.path()));
    let legal = login(&app, "legal").await;

    let (status, body) = call(
        &app,
        Method::GET,
        "/dashboard/informasi-debitur?sort=kolektibilitas&dir=desc",
        Some(&legal),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["items"][0]["kolektibilitas"], "Kol 4");
    assert_eq!(body["items"][0]["badge"]["color"], "red");

    let (status, _) = call(
        &app,
        Method::GET,
        "/dashboard/informasi-debitur/3",
        Some(&legal),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::GET,
        "/dashboard/informasi-debitur/5",
        Some(&legal),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cif"], "CIF0005");
    assert_eq!(body["surat_peringatan"][0]["tingkat"], "SP1");
}
