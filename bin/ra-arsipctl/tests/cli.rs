//! ---
//! ra_section: "04-networking-external-interfaces"
//! ra_subsection: "tests"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Command-line behaviour of the control CLI."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        "[storage]\ndirectory = \"{}\"\n\n[audit]\nenabled = false\n",
        dir.path().join("storage").display()
    );
    fs::write(dir.path().join("config.toml"), config).unwrap();
    dir
}

fn stdout(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

fn stderr(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone()).unwrap()
}

fn ctl(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ra-arsipctl").unwrap();
    cmd.env("RA_CONFIG", dir.join("config.toml"))
        .env_remove("RA_PASSWORD");
    cmd
}

#[test]
fn authorize_reports_reason_and_role() {
    let dir = workspace();
    let json = stdout(
        ctl(dir.path())
            .args(["--output", "json", "authorize", "/dashboard/legal/", "--role", "AKSES_RESTRICT"])
            .assert()
            .success(),
    );
    assert!(json.contains("\"reason\": \"LEGAL_ONLY\""), "{json}");
    assert!(json.contains("\"path\": \"/dashboard/legal\""), "{json}");
    assert!(json.contains("(peran Anda: Akses Restrict)"), "{json}");

    let text = stdout(ctl(dir.path()).args(["authorize", "/dashboard"]).assert().success());
    assert!(text.starts_with("DENIED /dashboard [AUTH_REQUIRED]"), "{text}");
}

#[test]
fn login_whoami_logout_roundtrip() {
    let dir = workspace();
    let login = stdout(
        ctl(dir.path())
            .args(["login", "-u", "legal", "-p", "legal123"])
            .assert()
            .success(),
    );
    assert!(login.contains("Fungsi Legal"));
    let whoami = stdout(
        ctl(dir.path())
            .args(["--output", "yaml", "whoami"])
            .assert()
            .success(),
    );
    assert!(whoami.contains("role: FUNGSI_LEGAL"), "{whoami}");
    ctl(dir.path()).arg("logout").assert().success();
    ctl(dir.path()).arg("whoami").assert().failure();
}

#[test]
fn rejected_sign_in_fails() {
    let dir = workspace();
    let err = stderr(
        ctl(dir.path())
            .args(["login", "-u", "nonaktif", "-p", "nonaktif123"])
            .assert()
            .failure(),
    );
    assert!(err.contains("tidak aktif"), "{err}");
}

#[test]
fn users_requires_master_user() {
    let dir = workspace();
    ctl(dir.path())
        .args(["login", "-u", "full", "-p", "full123"])
        .assert()
        .success();
    let err = stderr(ctl(dir.path()).arg("users").assert().failure());
    assert!(err.contains("peran Anda: Full Akses"), "{err}");
}

#[test]
fn export_respects_visibility() {
    let dir = workspace();
    ctl(dir.path())
        .args(["login", "-u", "restrict", "-p", "restrict123", "--remember"])
        .assert()
        .success();
    let csv = stdout(ctl(dir.path()).args(["export", "dokumen"]).assert().success());
    assert!(csv.starts_with("kode,nama,jenis,lokasi"), "{csv}");
    assert!(csv.contains("SHM-014"));
    assert!(!csv.contains("AKTA-001"));
}

#[test]
fn master_data_validate_rejects_empty_lists() {
    let dir = workspace();
    let file = dir.path().join("master.json");
    fs::write(&file, r#"{"lokasi_penyimpanan": [], "jenis_dokumen": []}"#).unwrap();
    ctl(dir.path())
        .args(["master-data", "validate"])
        .arg(&file)
        .assert()
        .failure();
    let shown = stdout(ctl(dir.path()).args(["master-data", "show"]).assert().success());
    assert!(shown.contains("LMR-A1"));
}

#[test]
fn login_recovers_from_corrupt_storage_files() {
    let dir = workspace();
    let storage = dir.path().join("storage");
    fs::create_dir_all(&storage).unwrap();
    fs::write(storage.join("local.json"), "{not json").unwrap();
    fs::write(storage.join("session.json"), "{not json").unwrap();
    ctl(dir.path())
        .args(["login", "-u", "full", "-p", "full123", "--remember"])
        .assert()
        .success();
    let whoami = stdout(ctl(dir.path()).arg("whoami").assert().success());
    assert!(whoami.contains("<full>"), "{whoami}");
    ctl(dir.path()).args(["master-data", "show"]).assert().success();
}
