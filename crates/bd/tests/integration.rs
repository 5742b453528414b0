//! End-to-end CLI integration tests for the `bd` binary.
//!
//! Each test creates its own temporary directory, initializes a beads project,
//! and exercises the `bd` binary as a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `bd` binary.
fn bd() -> Command {
    Command::cargo_bin("bd").unwrap()
}

/// Initialize a fresh beads project in a temp directory and return the handle.
fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    bd().args(["init", "--prefix", "t", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();
    tmp
}

/// Create an issue and return its ID (parsed from `--json` output).
fn create_issue(tmp: &TempDir, title: &str, extra_args: &[&str]) -> String {
    let mut args = vec!["create", title, "--json"];
    args.extend_from_slice(extra_args);
    let output = bd().args(&args).current_dir(tmp.path()).output().unwrap();
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Flow 1: Full lifecycle
// ---------------------------------------------------------------------------

#[test]
fn flow1_full_lifecycle() {
    let tmp = init_project();

    let id1 = create_issue(
        &tmp,
        "Bug: login broken",
        &["-t", "bug", "-p", "0", "-d", "Users can't login"],
    );
    let id2 = create_issue(&tmp, "Feature: dark mode", &["-t", "feature", "-p", "2"]);
    let id3 = create_issue(&tmp, "Task: update docs", &["-t", "task", "-p", "3"]);

    assert!(id1.starts_with("t-"), "id1 should start with t-: {}", id1);
    assert!(id2.starts_with("t-"), "id2 should start with t-: {}", id2);
    assert!(id3.starts_with("t-"), "id3 should start with t-: {}", id3);

    let output = bd()
        .args(["list", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let arr = list.as_array().expect("list --json should return array");
    assert_eq!(arr.len(), 3, "should have 3 issues");

    let bug_issue = arr
        .iter()
        .find(|i| i["title"].as_str().map_or(false, |t| t.contains("login")))
        .expect("should find the login bug issue");
    assert!(bug_issue["id"].is_string());
    assert_eq!(bug_issue["issue_type"].as_str().unwrap(), "bug");
    assert!(bug_issue["priority"].is_number());
    assert!(bug_issue["created_at"].is_string());
    assert!(bug_issue["updated_at"].is_string());

    let output = bd()
        .args(["show", &id1, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let show_arr = show.as_array().expect("show --json should return array");
    assert_eq!(show_arr.len(), 1);
    assert_eq!(show_arr[0]["id"].as_str().unwrap(), id1);

    bd().args(["update", &id1, "--status", "in_progress"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id1, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(show[0]["status"].as_str().unwrap_or(""), "in_progress");

    bd().args(["close", &id1, "-r", "Fixed"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["list", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2);

    let output = bd()
        .args(["list", "--all", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 3);

    bd().args(["reopen", &id1])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id1, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(show[0]["status"].as_str().unwrap_or("open"), "open");
}

// ---------------------------------------------------------------------------
// Flow 2: Dependencies, ready, and blocked work
// ---------------------------------------------------------------------------

#[test]
fn flow2_dependencies_ready_and_blocked() {
    let tmp = init_project();

    let parent = create_issue(&tmp, "Parent task", &["-t", "task", "-p", "1"]);
    let child = create_issue(&tmp, "Child task", &["-t", "task", "-p", "2"]);
    let unrelated = create_issue(&tmp, "Unrelated task", &["-t", "task", "-p", "3"]);

    bd().args(["dep", "add", &child, &parent, "--type", "blocks"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["ready", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert!(ready_ids.contains(&parent.as_str()), "parent should be ready");
    assert!(ready_ids.contains(&unrelated.as_str()), "unrelated should be ready");
    assert!(!ready_ids.contains(&child.as_str()), "child should NOT be ready (blocked)");

    // bd blocked --json => child should show up as blocked by parent.
    let output = bd()
        .args(["blocked", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let blocked: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blocked_ids: Vec<&str> = blocked
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert!(blocked_ids.contains(&child.as_str()), "child should be blocked");

    bd().args(["close", &parent])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["ready", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert!(ready_ids.contains(&child.as_str()), "child should now be ready");

    bd().args(["dep", "list", &child])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Depends on"));
}

// ---------------------------------------------------------------------------
// Flow 3: Search and filter
// ---------------------------------------------------------------------------

#[test]
fn flow3_search_and_filter() {
    let tmp = init_project();

    create_issue(&tmp, "Bug: login page broken", &["-t", "bug", "-p", "0"]);
    create_issue(&tmp, "Feature: dark mode toggle", &["-t", "feature", "-p", "2"]);
    create_issue(&tmp, "Bug: signup validation", &["-t", "bug", "-p", "1"]);

    let output = bd()
        .args(["search", "login", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let arr = results.as_array().unwrap();
    assert_eq!(arr.len(), 1, "search for 'login' should return 1 result");
    assert!(arr[0]["title"].as_str().unwrap().contains("login"));

    let output = bd()
        .args(["list", "--type", "bug", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2, "should have 2 bugs");

    let output = bd()
        .args(["list", "--status", "open", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 3, "all 3 should be open");

    let output = bd()
        .args(["ready", "--priority", "0", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ready.as_array().unwrap().len(), 1, "only 1 P0 issue");
}

// ---------------------------------------------------------------------------
// Flow 4: Labels
// ---------------------------------------------------------------------------

#[test]
fn flow4_labels() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Label test issue", &[]);

    bd().args(["label", &id, "add", "critical"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["label", &id, "add", "backend"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["label", &id, "list"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("backend"))
        .stdout(predicate::str::contains("critical"));

    bd().args(["label", &id, "remove", "critical"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["label", &id, "list"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("backend"))
        .stdout(predicate::str::contains("critical").not());
}

// ---------------------------------------------------------------------------
// Flow 5: Comments
// ---------------------------------------------------------------------------

#[test]
fn flow5_comments() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Comment test issue", &[]);

    bd().args(["comment", &id, "First comment"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["comment", &id, "Second comment"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["comments", &id, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let comments: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let arr = comments.as_array().unwrap();
    assert_eq!(arr.len(), 2, "should have 2 comments");
    assert_eq!(arr[0]["text"].as_str().unwrap(), "First comment");
    assert_eq!(arr[1]["text"].as_str().unwrap(), "Second comment");
}

// ---------------------------------------------------------------------------
// Flow 6: Stats
// ---------------------------------------------------------------------------

#[test]
fn flow6_stats() {
    let tmp = init_project();

    create_issue(&tmp, "Bug one", &["-t", "bug", "-p", "0"]);
    create_issue(&tmp, "Bug two", &["-t", "bug", "-p", "1"]);
    create_issue(&tmp, "Feature one", &["-t", "feature", "-p", "2"]);
    create_issue(&tmp, "Task one", &["-t", "task", "-p", "3"]);
    create_issue(&tmp, "Task two", &["-t", "task", "-p", "4"]);

    let output = bd()
        .args(["stats", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"].as_i64().unwrap(), 5);
    assert_eq!(stats["open"].as_i64().unwrap(), 5);
    assert_eq!(stats["closed"].as_i64().unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Flow 7: Config
// ---------------------------------------------------------------------------

#[test]
fn flow7_config() {
    let tmp = init_project();

    bd().args(["config", "set", "my.key", "my value"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["config", "get", "my.key"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("my value"));

    bd().args(["config", "list"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("my.key"));
}

// ---------------------------------------------------------------------------
// Flow 8: Sync and doctor
// ---------------------------------------------------------------------------

#[test]
fn flow8_sync_and_doctor() {
    let tmp = init_project();
    create_issue(&tmp, "Synced issue", &[]);

    bd().args(["sync"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));

    let jsonl = std::fs::read_to_string(tmp.path().join(".beads/issues.jsonl")).unwrap();
    assert!(jsonl.contains("Synced issue"));

    bd().args(["sync", "--flush-only"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["doctor"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Health check"));
}

// ---------------------------------------------------------------------------
// Additional edge-case tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_beads_dir() {
    let tmp = TempDir::new().unwrap();
    bd().args(["init", "--prefix", "test", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join(".beads").is_dir());
    assert!(tmp.path().join(".beads").join("beads.db").is_file());
    assert!(tmp.path().join(".beads").join("issues.jsonl").is_file());
    assert!(tmp.path().join(".beads").join("config.yaml").is_file());
}

#[test]
fn init_refuses_double_init() {
    let tmp = init_project();

    bd().args(["init", "--prefix", "t", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn create_without_title_fails() {
    let tmp = init_project();

    bd().args(["create"])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

#[test]
fn show_nonexistent_issue_fails() {
    let tmp = init_project();

    bd().args(["show", "t-nonexistent"])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

#[test]
fn close_already_closed_issue_warns() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Close me", &[]);

    bd().args(["close", &id])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["close", &id])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("already closed"));
}

#[test]
fn reopen_non_closed_fails() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Open issue", &[]);

    bd().args(["reopen", &id])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not closed"));
}

#[test]
fn delete_requires_force() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Delete me", &[]);

    bd().args(["delete", &id])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    bd().args(["delete", &id, "--force"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["show", &id])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

#[test]
fn close_blocked_issue_requires_force() {
    let tmp = init_project();
    let parent = create_issue(&tmp, "Parent", &[]);
    let child = create_issue(&tmp, "Child", &[]);

    bd().args(["dep", "add", &child, &parent, "--type", "blocks"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["close", &child])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("blocked by"));

    bd().args(["close", &child, "--force"])
        .current_dir(tmp.path())
        .assert()
        .success();
}

#[test]
fn version_command() {
    bd().args(["version"]).assert().success();
}

#[test]
fn dep_cycles_detection() {
    let tmp = init_project();

    let a = create_issue(&tmp, "Issue A", &[]);
    let b = create_issue(&tmp, "Issue B", &[]);

    bd().args(["dep", "add", &a, &b, "--type", "blocks"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["dep", "add", &b, &a, "--type", "blocks"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["dep", "cycles"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cycle"));
}

#[test]
fn create_with_labels() {
    let tmp = init_project();

    let output = bd()
        .args(["create", "Labeled issue", "-l", "frontend", "-l", "urgent", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let created: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = created["id"].as_str().unwrap();

    let output = bd()
        .args(["show", id, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let labels: Vec<&str> = show[0]["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap())
        .collect();
    assert!(labels.contains(&"frontend"));
    assert!(labels.contains(&"urgent"));
}

#[test]
fn update_multiple_fields() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Multi update test", &["-t", "task", "-p", "3"]);

    bd().args([
        "update",
        &id,
        "--title",
        "Updated title",
        "--priority",
        "1",
        "--type",
        "bug",
    ])
    .current_dir(tmp.path())
    .assert()
    .success();

    let output = bd()
        .args(["show", &id, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let issue = &show[0];
    assert_eq!(issue["title"].as_str().unwrap(), "Updated title");
    assert_eq!(issue["priority"].as_i64().unwrap(), 1);
}

#[test]
fn update_add_and_remove_labels() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Label update test", &[]);

    bd().args(["update", &id, "--add-label", "foo", "--add-label", "bar"])
        .current_dir(tmp.path())
        .assert()
        .success();

    bd().args(["update", &id, "--remove-label", "foo"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = bd()
        .args(["show", &id, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let labels: Vec<&str> = show[0]["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap())
        .collect();
    assert!(labels.contains(&"bar"));
    assert!(!labels.contains(&"foo"));
}

#[test]
fn completion_generates_bash_script() {
    bd().args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bd"));
}
