//! ---
//! ra_section: "15-testing-qa-runbook"
//! ra_subsection: "integration-tests"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Integration and validation tests for the Ruwang Arsip stack."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::fs;

use ra_common::storage::{FileStore, KeyValueStore};
use ra_security::session::{REMEMBER_KEY, SESSION_KEY};
use ra_security::{
    can_view_data_by_level, decide, normalize_path, AuditEvent, AuditLog, Decision, LevelAkses,
    ReasonCode, Role, SessionStore, StorageSessionStore,
};
use strum::IntoEnumIterator;
use tempfile::tempdir;

use Role::*;

fn denied(reason: ReasonCode) -> Decision {
    Decision::Denied(reason)
}

#[test]
fn route_matrix_for_every_role() {
    let cases: &[(&str, [Decision; 4])] = &[
        // FullAkses, FungsiLegal, AksesRestrict, MasterUser
        ("/dashboard", [Decision::Allowed; 4]),
        ("/dashboard/profil", [Decision::Allowed; 4]),
        ("/dashboard/surat", [Decision::Allowed; 4]),
        ("/dashboard/informasi-debitur/17", [Decision::Allowed; 4]),
        (
            "/dashboard/users",
            [
                denied(ReasonCode::UserManagementOnly),
                denied(ReasonCode::UserManagementOnly),
                denied(ReasonCode::UserManagementOnly),
                Decision::Allowed,
            ],
        ),
        (
            "/dashboard/legal",
            [
                Decision::Allowed,
                Decision::Allowed,
                denied(ReasonCode::LegalOnly),
                Decision::Allowed,
            ],
        ),
        (
            "/dashboard/informasi-debitur/admin/upload-restrik",
            [
                Decision::Allowed,
                denied(ReasonCode::RestrictDataOnly),
                Decision::Allowed,
                Decision::Allowed,
            ],
        ),
        (
            "/dashboard/informasi-debitur/admin/upload",
            [
                Decision::Allowed,
                Decision::Allowed,
                denied(ReasonCode::NonRestrictDataOnly),
                Decision::Allowed,
            ],
        ),
        (
            "/dashboard/arsip-digital/peminjaman/accept/3",
            [
                Decision::Allowed,
                Decision::Allowed,
                denied(ReasonCode::LegalOnly),
                Decision::Allowed,
            ],
        ),
        ("/dashboard/arsip-digital/peminjaman", [Decision::Allowed; 4]),
        ("/dashboard/arsip-digital/pencarian", [Decision::Allowed; 4]),
        (
            "/dashboard/arsip-digital/parameter/master-data",
            [
                Decision::Allowed,
                Decision::Allowed,
                denied(ReasonCode::DigitalArchiveAdminOnly),
                Decision::Allowed,
            ],
        ),
        (
            "/dashboard/laporan",
            [denied(ReasonCode::UnknownRouteDenied); 4],
        ),
    ];
    let roles = [FullAkses, FungsiLegal, AksesRestrict, MasterUser];
    for (path, expected) in cases {
        for (role, want) in roles.iter().zip(expected) {
            assert_eq!(decide(Some(*role), path), *want, "{role} on {path}");
        }
    }
}

#[test]
fn anonymous_callers_need_login_only_under_dashboard() {
    for path in ["/dashboard", "/dashboard/legal", "/dashboard/laporan", "//dashboard//"] {
        assert_eq!(decide(None, path), denied(ReasonCode::AuthRequired), "{path}");
    }
    for path in ["/", "/login", "/dashboards", "/api/auth/login", ""] {
        assert_eq!(decide(None, path), Decision::Allowed, "{path}");
    }
}

#[test]
fn decisions_ignore_path_noise() {
    for role in Role::iter() {
        for (noisy, clean) in [
            ("/dashboard/legal/", "/dashboard/legal"),
            ("//dashboard///users", "/dashboard/users"),
            ("/dashboard/legal?tab=disposisi", "/dashboard/legal"),
            ("/dashboard/arsip-digital#top", "/dashboard/arsip-digital"),
        ] {
            assert_eq!(normalize_path(noisy), clean);
            assert_eq!(decide(Some(role), noisy), decide(Some(role), clean));
        }
    }
}

#[test]
fn prefix_rules_respect_segment_boundaries() {
    assert_eq!(
        decide(Some(FullAkses), "/dashboard/legalisasi"),
        denied(ReasonCode::UnknownRouteDenied)
    );
    assert_eq!(
        decide(Some(MasterUser), "/dashboard/usersx"),
        denied(ReasonCode::UnknownRouteDenied)
    );
}

#[test]
fn every_denial_message_names_the_role() {
    for role in Role::iter() {
        for reason in ReasonCode::iter() {
            let message = reason.message_for(Some(role));
            assert!(message.starts_with(reason.message()));
            assert!(message.ends_with(&format!("(peran Anda: {})", role.label())));
        }
    }
}

#[test]
fn level_visibility_by_role() {
    let expect = [
        (FullAkses, true, true),
        (MasterUser, true, true),
        (FungsiLegal, false, true),
        (AksesRestrict, true, false),
    ];
    for (role, restrict, non_restrict) in expect {
        assert_eq!(can_view_data_by_level(role, LevelAkses::Restrict), restrict);
        assert_eq!(
            can_view_data_by_level(role, LevelAkses::NonRestrict),
            non_restrict
        );
    }
}

#[test]
fn file_backed_sessions_survive_restart() {
    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let local_path = dir.path().join("local.json");
    let open = || {
        StorageSessionStore::new(FileStore::new(&session_path), FileStore::new(&local_path))
    };

    open().write(3, false).unwrap();
    assert_eq!(open().read(), Some(3));
    assert!(FileStore::new(&local_path).get(REMEMBER_KEY).unwrap().is_none());

    open().write(4, true).unwrap();
    assert_eq!(open().read(), Some(4));
    assert!(FileStore::new(&session_path).get(SESSION_KEY).unwrap().is_none());

    open().clear().unwrap();
    assert_eq!(open().read(), None);
}

#[test]
fn tampered_audit_log_fails_verification() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let mut log = AuditLog::open(&path).unwrap();
    log.record("legal", &AuditEvent::SignIn { persistent: false })
        .unwrap();
    log.record(
        "restrict",
        &AuditEvent::AccessDenied {
            target: "/dashboard/legal".into(),
            reason: ReasonCode::LegalOnly,
        },
    )
    .unwrap();
    assert!(log.verify().unwrap());

    let contents = fs::read_to_string(&path).unwrap();
    fs::write(&path, contents.replace("restrict", "admin")).unwrap();
    assert!(!AuditLog::open(&path).unwrap().verify().unwrap());
}
