//! Integration tests for the fan-post CLI

use assert_cmd::Command;
use libfanout::{AccountStore, ConnectedAccount, Database, Platform, PostStatus, PostStore};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Config with twitter as the default platform and no provider latency
fn setup_test_env() -> (TempDir, String, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("fanout.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[defaults]
owner = "alice"
platforms = ["twitter"]

[dispatch]
timeout_secs = 5
simulated_latency = false
"#,
        db_path.display().to_string().replace('\\', "/")
    );
    fs::write(&config_path, config_content).unwrap();

    (
        temp_dir,
        config_path.to_str().unwrap().to_string(),
        db_path.to_str().unwrap().to_string(),
    )
}

async fn connect(db_path: &str, owner: &str, platform: Platform) {
    let db = Database::new(db_path).await.unwrap();
    let token = format!("mock_access_token_{}", platform.as_str());
    db.upsert_account(&ConnectedAccount::new(owner, platform, token))
        .await
        .unwrap();
}

fn fan_post(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("fan-post").unwrap();
    cmd.env("FANOUT_CONFIG", config_path)
        .env_remove("FANOUT_DB_PATH")
        .env_remove("FANOUT_OWNER");
    cmd
}

#[tokio::test]
async fn test_stdin_content_publishes_to_default_platform() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    connect(&db_path, "alice", Platform::Twitter).await;

    fan_post(&config_path)
        .write_stdin("Hello from stdin\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("twitter:tweet_"));
}

#[tokio::test]
async fn test_json_output_includes_results() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    connect(&db_path, "alice", Platform::Twitter).await;
    connect(&db_path, "alice", Platform::Facebook).await;

    let output = fan_post(&config_path)
        .args(["Launch day", "--platform", "twitter,facebook", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["post"]["status"], "published");
    assert_eq!(response["results"].as_array().unwrap().len(), 2);
    assert_eq!(response["results"][0]["platform"], "twitter");
    assert_eq!(response["results"][1]["success"], true);
}

#[test]
fn test_all_platforms_failing_exits_one() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .args(["Nobody listening", "--platform", "linkedin"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("linkedin: Account not connected"));
}

#[tokio::test]
async fn test_partial_failure_still_succeeds() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    connect(&db_path, "alice", Platform::Twitter).await;
    connect(&db_path, "alice", Platform::Instagram).await;

    fan_post(&config_path)
        .args(["Text only", "--platform", "twitter,instagram"])
        .assert()
        .success()
        .stdout(predicate::str::contains("twitter:tweet_"))
        .stderr(predicate::str::contains(
            "instagram: Instagram requires an image or video",
        ));
}

#[test]
fn test_queue_prints_position() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .args(["First", "--queue"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("queued:"))
        .stdout(predicate::str::ends_with(":1\n"));

    fan_post(&config_path)
        .args(["Second", "--queue"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with(":2\n"));
}

#[tokio::test]
async fn test_schedule_stores_post_for_owner() {
    let (_temp_dir, config_path, db_path) = setup_test_env();

    let output = fan_post(&config_path)
        .args(["Later", "--schedule", "2h", "--owner", "bob", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["post"]["status"], "scheduled");
    assert!(response["results"].is_null());

    let db = Database::new(&db_path).await.unwrap();
    let scheduled = db.list_scheduled("bob").await.unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].status, PostStatus::Scheduled);
    assert!(db.list_scheduled("alice").await.unwrap().is_empty());
}

#[test]
fn test_owner_from_environment() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .env("FANOUT_OWNER", "carol")
        .args(["Queued for carol", "--queue", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"owner_id\": \"carol\""));
}

#[test]
fn test_empty_content_is_invalid_input() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .write_stdin("")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Content or media is required"));
}

#[test]
fn test_media_type_without_url_is_invalid_input() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .args(["Caption", "--media-type", "image"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("A media URL is required for IMAGE posts"));
}

#[test]
fn test_unknown_platform_is_invalid_input() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .args(["Hello", "--platform", "myspace"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Unknown platform 'myspace'"));
}

#[test]
fn test_unparseable_schedule_is_invalid_input() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .args(["Hello", "--schedule", "when pigs fly"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Could not parse schedule"));
}

#[test]
fn test_schedule_past_calendar_range_is_invalid_input() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    fan_post(&config_path)
        .args(["Hello", "--schedule", "1000000years"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("too far in the future"));
}

#[test]
fn test_help_lists_exit_codes() {
    Command::cargo_bin("fan-post")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXIT CODES"))
        .stdout(predicate::str::contains("--schedule"))
        .stdout(predicate::str::contains("--queue"));
}
