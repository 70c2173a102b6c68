//! Integration tests for LookMax CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use lookmax::cli::{
    Cli, Commands, cmd_delete, cmd_init, cmd_list, cmd_show, load_analyses,
};
use lookmax::config::ServerConfig;
use lookmax_core::{
    AnalysisId, AnalysisPayload, AnalysisStore, DEFAULT_USER_ID, NewFaceAnalysis, RedbStore,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Initialize a database holding `count` records.
fn seeded_db(dir: &TempDir, count: usize) -> PathBuf {
    let path = dir.path().join("lookmax.redb");
    cmd_init(&path, false).unwrap();
    let mut store = RedbStore::open(&path).unwrap();
    for i in 0..count {
        let new = NewFaceAnalysis::new(
            DEFAULT_USER_ID,
            format!("facial-analysis-{}.jpg", i),
            AnalysisPayload::canned(),
        );
        store.create(new, "2024-01-01T00:00:00.000Z").unwrap();
    }
    path
}

fn record_count(path: &Path) -> usize {
    load_analyses(path).unwrap().len()
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

    cmd_init(&db_path, false).unwrap();

    let result = cmd_init(&db_path, false);
    assert!(result.is_err());
}

#[test]
fn test_init_with_force_starts_over() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp, 2);
    assert_eq!(record_count(&db_path), 2);

    let result = cmd_init(&db_path, true);
    assert!(result.is_ok());
    assert_eq!(record_count(&db_path), 0);
}

// =============================================================================
// LIST / SHOW / DELETE TESTS
// =============================================================================

#[test]
fn test_list_requires_existing_database() {
    let temp = create_temp_dir();
    let result = cmd_list(&temp.path().join("missing.redb"), false);
    assert!(result.is_err());
}

#[test]
fn test_list_table_and_json() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp, 3);

    assert!(cmd_list(&db_path, false).is_ok());
    assert!(cmd_list(&db_path, true).is_ok());

    let ids: Vec<u64> = load_analyses(&db_path)
        .unwrap()
        .into_iter()
        .map(|r| r.id.0)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_show_existing_and_missing() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp, 1);

    assert!(cmd_show(&db_path, AnalysisId(1)).is_ok());
    let err = cmd_show(&db_path, AnalysisId(9)).unwrap_err();
    assert!(err.contains("not found"));
}

#[test]
fn test_delete_then_delete_again() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp, 2);

    assert!(cmd_delete(&db_path, AnalysisId(1)).is_ok());
    assert_eq!(record_count(&db_path), 1);

    let result = cmd_delete(&db_path, AnalysisId(1));
    assert!(result.is_err());
}

// =============================================================================
// ARGUMENT PARSING TESTS
// =============================================================================

#[test]
fn test_serve_defaults() {
    let cli = Cli::try_parse_from(["lookmax", "serve"]).unwrap();
    let Commands::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    let config = ServerConfig::try_from(args).unwrap();
    assert_eq!(config.port, 5000);
    assert_eq!(config.backend, "memory");
    assert!(config.api_key.is_none());
}

#[test]
fn test_serve_flags() {
    let cli = Cli::try_parse_from([
        "lookmax",
        "serve",
        "--port",
        "8080",
        "--backend",
        "redb",
        "--rate-limit",
        "10",
        "--api-key",
        "k",
    ])
    .unwrap();
    let Commands::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    let config = ServerConfig::try_from(args).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.backend, "redb");
    assert_eq!(config.rate_limit.map(|r| r.get()), Some(10));
    assert_eq!(config.api_key.as_deref(), Some("k"));
}

#[test]
fn test_serve_rejects_unknown_backend() {
    let cli = Cli::try_parse_from(["lookmax", "serve", "--backend", "sqlite"]).unwrap();
    let Commands::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    assert!(ServerConfig::try_from(args).is_err());
}

#[test]
fn test_show_requires_id() {
    assert!(Cli::try_parse_from(["lookmax", "show"]).is_err());
    let cli = Cli::try_parse_from(["lookmax", "show", "--db", "x.redb", "7"]).unwrap();
    assert!(matches!(cli.command, Commands::Show { id: 7, .. }));
}
