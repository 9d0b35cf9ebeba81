//! CLI integration tests for shipway commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use shipway::auth::session;
use shipway::store::{SqliteStore, Store};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir_str(&self) -> String {
        self.temp_dir.path().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        Command::cargo_bin("shipway").expect("failed to find binary")
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["init", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.temp_dir.path().join("shipway.db")).expect("open store")
    }
}

/// Pulls the issued token out of `token issue` output.
fn token_from_output(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("shipway_"))
        .expect("token line")
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();
    ctx.init()
        .success()
        .stdout(predicate::str::contains("Initialized database"));
    assert!(ctx.temp_dir.path().join("shipway.db").exists());
}

#[test]
fn test_token_issue_requires_init() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args(["token", "issue", "--user-id", "7", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_token_issue_and_revoke() {
    let ctx = TestContext::new();
    ctx.init().success();

    let output = ctx
        .cmd()
        .args(["token", "issue", "--user-id", "7", "--data-dir", &ctx.data_dir_str()])
        .output()
        .expect("run token issue");
    assert!(output.status.success());
    let token = token_from_output(&output.stdout);
    assert!(token.starts_with("shipway_7_"));

    let store = ctx.store();
    assert!(session::validate_token(&store as &dyn Store, 7, &token));

    ctx.cmd()
        .args(["token", "revoke", "--user-id", "7", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Revoked tokens for user 7"));
    assert!(!session::validate_token(&store as &dyn Store, 7, &token));
}

#[test]
fn test_token_issue_rejects_bad_ttl() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.cmd()
        .args([
            "token",
            "issue",
            "--user-id",
            "7",
            "--ttl-secs",
            "0",
            "--data-dir",
            &ctx.data_dir_str(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ttl-secs must be positive"));
}

#[test]
fn test_token_issue_rejects_oversized_ttl() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.cmd()
        .args([
            "token",
            "issue",
            "--user-id",
            "7",
            "--ttl-secs",
            "10000000000000",
            "--data-dir",
            &ctx.data_dir_str(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("token_ttl_secs must be between"));
}
