//! Integration tests for enlist CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use enlist::cli::{
    UpdateArgs, View, cmd_classify, cmd_expiring, cmd_import, cmd_init, cmd_lists, cmd_stats,
    cmd_transfer, cmd_update, open_store,
};
use enlist::config::AppConfig;
use enlist_core::{ListId, RecruitId, ReferenceTables, Status};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write the 2024 sample roster.
///
/// - r1 Ha Noi, 24, SOURCE, union member
/// - r2 Ha Noi, 23, DEFERRED for education ending 2024
/// - r3 Ha Noi, 16, first-time registration
/// - r4 Hue, 28, SOURCE (too old to carry over)
/// - r5 Hue, 22, FINALIZED official (departed)
/// - r6 Ha Noi, 21, not allowed to register
fn create_roster_json(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("roster.json");
    let content = r#"[
        {"id": "r1", "fullName": "Nguyen Van A", "dob": "2000-01-01", "recruitmentYear": 2024,
         "status": "SOURCE",
         "address": {"province": "Ha Noi", "commune": "Dong Anh", "village": "Thon 1"},
         "details": {"education": "12/12", "politicalStatus": "Đoàn viên"},
         "physical": {"healthGrade": 1, "bmi": 21.0}},
        {"id": "r2", "fullName": "Tran Van B", "dob": "05/05/2001", "recruitmentYear": 2024,
         "status": "DEFERRED", "defermentReason": "EDUCATION",
         "address": {"province": "Ha Noi", "commune": "Dong Anh", "village": "Thon 2"},
         "details": {"educationPeriod": "2021-2024"}},
        {"id": "r3", "fullName": "Le Van C", "dob": "2008-02-02", "recruitmentYear": 2024,
         "status": "FIRST_TIME_REGISTRATION",
         "address": {"province": "Ha Noi", "commune": "Soc Son", "village": "Thon 3"}},
        {"id": "r4", "fullName": "Pham Van D", "dob": "1996-03-03", "recruitmentYear": 2024,
         "status": "SOURCE",
         "address": {"province": "Hue", "commune": "Phu Vang", "village": "Thon 4"}},
        {"id": "r5", "fullName": "Hoang Van E", "dob": "2002", "recruitmentYear": 2024,
         "status": "FINALIZED", "enlistmentType": "OFFICIAL",
         "address": {"province": "Hue", "commune": "Phu Vang", "village": "Thon 5"}},
        {"id": "r6", "fullName": "Vu Van F", "dob": "2003-06-06", "recruitmentYear": 2024,
         "status": "NOT_ALLOWED_REGISTRATION",
         "address": {"province": "Ha Noi", "commune": "Soc Son", "village": "Thon 3"}}
    ]"#;
    std::fs::write(&path, content).unwrap();
    path
}

/// Initialize a database and import the sample roster into it.
fn seeded_db(dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("test.redb");
    cmd_init(&db_path, false).unwrap();
    let roster = create_roster_json(dir);
    cmd_import(&db_path, &roster).unwrap();
    db_path
}

fn nation() -> View {
    View::default()
}

fn province(name: &str) -> View {
    View {
        province: Some(name.to_string()),
        ..View::default()
    }
}

fn record_count(db: &Path) -> usize {
    open_store(db).unwrap().len().unwrap()
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    let result = cmd_init(&db_path, false);
    assert!(result.is_ok());
    assert!(db_path.exists());
    assert_eq!(record_count(&db_path), 0);
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    // First init
    cmd_init(&db_path, false).unwrap();

    // Second init should fail
    let result = cmd_init(&db_path, false);
    assert!(result.is_err());
}

#[test]
fn test_init_with_force_starts_empty() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    assert_eq!(record_count(&db_path), 6);

    let result = cmd_init(&db_path, true);
    assert!(result.is_ok());
    assert_eq!(record_count(&db_path), 0);
}

// =============================================================================
// IMPORT COMMAND TESTS
// =============================================================================

#[test]
fn test_import_writes_every_record() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    cmd_init(&db_path, false).unwrap();
    let roster = create_roster_json(&temp);

    let imported = cmd_import(&db_path, &roster).unwrap();
    assert_eq!(imported, 6);
    assert_eq!(record_count(&db_path), 6);
}

#[test]
fn test_import_duplicate_batch_writes_nothing() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let extra = temp.path().join("extra.json");
    std::fs::write(
        &extra,
        r#"[
            {"id": "r7", "recruitmentYear": 2024, "status": "SOURCE"},
            {"id": "r1", "recruitmentYear": 2024, "status": "SOURCE"}
        ]"#,
    )
    .unwrap();

    assert!(cmd_import(&db_path, &extra).is_err());
    assert_eq!(record_count(&db_path), 6);
}

#[test]
fn test_import_rejects_malformed_json() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    cmd_init(&db_path, false).unwrap();

    let bad = temp.path().join("bad.json");
    std::fs::write(&bad, r#"[{"id": "x", "status": "ON_LEAVE"}]"#).unwrap();

    assert!(cmd_import(&db_path, &bad).is_err());
    assert_eq!(record_count(&db_path), 0);
}

#[test]
fn test_import_requires_initialized_database() {
    let temp = create_temp_dir();
    let roster = create_roster_json(&temp);
    let result = cmd_import(&temp.path().join("missing.redb"), &roster);
    assert!(result.is_err());
}

// =============================================================================
// LISTS / CLASSIFY COMMAND TESTS
// =============================================================================

#[test]
fn test_lists_prints_every_list() {
    assert_eq!(cmd_lists(false).unwrap(), ListId::ALL.len());
    assert_eq!(cmd_lists(true).unwrap(), ListId::ALL.len());
}

#[test]
fn test_classify_total_source_nation() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    // r1, r2, r4, r5: of age and not a registration exclusion.
    let count = cmd_classify(&db_path, &tables, 2024, "total-source", &nation(), false).unwrap();
    assert_eq!(count, 4);
}

#[test]
fn test_classify_accepts_short_code() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    // DS14: r1, r2, r4 remaining plus r3 first-time.
    let count = cmd_classify(&db_path, &tables, 2024, "DS14", &nation(), true).unwrap();
    assert_eq!(count, 4);
}

#[test]
fn test_classify_respects_province_scope() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let count =
        cmd_classify(&db_path, &tables, 2024, "total-source", &province("Ha Noi"), false).unwrap();
    assert_eq!(count, 2);

    let deferred =
        cmd_classify(&db_path, &tables, 2024, "deferred-education", &nation(), false).unwrap();
    assert_eq!(deferred, 1);
}

#[test]
fn test_classify_other_year_is_empty() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let count = cmd_classify(&db_path, &tables, 2023, "total-source", &nation(), false).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_classify_unknown_list_fails() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let result = cmd_classify(&db_path, &tables, 2024, "volunteers", &nation(), false);
    assert!(result.is_err());
}

#[test]
fn test_admin_nation_view_hides_sandbox() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let config = AppConfig::from_toml_str("[reference]\nsandbox_province = \"Hue\"\n").unwrap();
    let tables = &config.reference;

    let admin = View {
        admin: true,
        ..View::default()
    };
    let hidden = cmd_classify(&db_path, tables, 2024, "total-source", &admin, false).unwrap();
    assert_eq!(hidden, 2);

    let officer = cmd_classify(&db_path, tables, 2024, "total-source", &nation(), false).unwrap();
    assert_eq!(officer, 4);
}

// =============================================================================
// STATS COMMAND TESTS
// =============================================================================

#[test]
fn test_stats_reports_counts_and_trend() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let report = cmd_stats(&db_path, &tables, 2024, &nation(), false).unwrap();
    let dashboard = &report.dashboard;

    assert_eq!(dashboard.count(ListId::TotalSource), 4);
    assert_eq!(dashboard.count(ListId::NotAllowed), 1);
    assert_eq!(dashboard.count(ListId::FinalizedOfficial), 1);
    assert_eq!(dashboard.political.total, 4);
    assert_eq!(dashboard.political.union, 1);
    assert_eq!(dashboard.political.union_per_mille, 250);

    // r1, r2, r5 are 18..=27 in 2024 and not registration exclusions.
    assert_eq!(report.trend, vec![(2024, 3)]);
}

#[test]
fn test_stats_json_on_empty_scope() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let report = cmd_stats(&db_path, &tables, 2024, &province("Da Nang"), true).unwrap();
    assert_eq!(report.dashboard.count(ListId::TotalSource), 0);
    assert!(report.trend.is_empty());
}

// =============================================================================
// TRANSFER COMMAND TESTS
// =============================================================================

#[test]
fn test_transfer_dry_run_writes_nothing() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let stats = cmd_transfer(&db_path, &tables, 2024, 2025, &nation(), true, false).unwrap();
    assert_eq!(stats.transferred(), 3);
    assert_eq!(stats.excluded_over_age, 1);
    assert_eq!(record_count(&db_path), 6);
}

#[test]
fn test_transfer_creates_next_year_cohort() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let stats = cmd_transfer(&db_path, &tables, 2024, 2025, &nation(), false, false).unwrap();
    assert_eq!(stats.first_time_to_source, 1);
    assert_eq!(stats.kept_status, 1);
    assert_eq!(stats.reset_to_source, 1);
    assert_eq!(record_count(&db_path), 9);

    let store = open_store(&db_path).unwrap();
    let first_time = store.get(&RecruitId::new("r3@2025")).unwrap().unwrap();
    assert_eq!(first_time.status, Status::Source);
    assert_eq!(first_time.recruitment_year, 2025);
    assert_eq!(first_time.source_id, Some(RecruitId::new("r3")));

    let deferred = store.get(&RecruitId::new("r2@2025")).unwrap().unwrap();
    assert_eq!(deferred.status, Status::Deferred);
    assert_eq!(deferred.deferment_reason.as_deref(), Some("EDUCATION"));

    // The source cohort is untouched.
    let original = store.get(&RecruitId::new("r3")).unwrap().unwrap();
    assert_eq!(original.status, Status::FirstTimeRegistration);
}

#[test]
fn test_transfer_twice_is_refused() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    cmd_transfer(&db_path, &tables, 2024, 2025, &nation(), false, false).unwrap();
    let second = cmd_transfer(&db_path, &tables, 2024, 2025, &nation(), false, false);
    assert!(second.is_err());
    assert_eq!(record_count(&db_path), 9);
}

#[test]
fn test_transfer_empty_scope_is_a_warning() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    // Hue only has an over-age source and a departed recruit.
    let stats = cmd_transfer(&db_path, &tables, 2024, 2025, &province("Hue"), false, false).unwrap();
    assert_eq!(stats.transferred(), 0);
    assert_eq!(record_count(&db_path), 6);
}

#[test]
fn test_transfer_rejects_backwards_years() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    let result = cmd_transfer(&db_path, &tables, 2024, 2024, &nation(), false, false);
    assert!(result.is_err());
}

// =============================================================================
// EXPIRING / UPDATE COMMAND TESTS
// =============================================================================

#[test]
fn test_expiring_finds_lapsing_deferment() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let tables = ReferenceTables::default();

    assert_eq!(cmd_expiring(&db_path, &tables, 2024, &nation(), false).unwrap(), 1);
    assert_eq!(cmd_expiring(&db_path, &tables, 2024, &province("Hue"), true).unwrap(), 0);
}

#[test]
fn test_update_changes_status_and_reason() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let args = UpdateArgs {
        status: Some("deferred".to_string()),
        reason: Some("DQTT".to_string()),
        ..UpdateArgs::default()
    };
    cmd_update(&db_path, "r1", &args).unwrap();

    let store = open_store(&db_path).unwrap();
    let updated = store.get(&RecruitId::new("r1")).unwrap().unwrap();
    assert_eq!(updated.status, Status::Deferred);
    assert_eq!(updated.deferment_reason.as_deref(), Some("DQTT"));
    drop(store);

    let tables = ReferenceTables::default();
    let militia =
        cmd_classify(&db_path, &tables, 2024, "deferred-militia", &nation(), false).unwrap();
    assert_eq!(militia, 1);
}

#[test]
fn test_update_clear_reason() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let args = UpdateArgs {
        clear_reason: true,
        ..UpdateArgs::default()
    };
    cmd_update(&db_path, "r2", &args).unwrap();

    let store = open_store(&db_path).unwrap();
    let updated = store.get(&RecruitId::new("r2")).unwrap().unwrap();
    assert_eq!(updated.deferment_reason, None);
    assert_eq!(updated.status, Status::Deferred);
}

#[test]
fn test_update_rejects_bad_input() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let unknown_status = UpdateArgs {
        status: Some("ON_LEAVE".to_string()),
        ..UpdateArgs::default()
    };
    assert!(cmd_update(&db_path, "r1", &unknown_status).is_err());

    assert!(cmd_update(&db_path, "r1", &UpdateArgs::default()).is_err());

    let valid = UpdateArgs {
        status: Some("SOURCE".to_string()),
        ..UpdateArgs::default()
    };
    assert!(cmd_update(&db_path, "nobody", &valid).is_err());
}
