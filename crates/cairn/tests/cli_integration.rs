//! CLI integration tests for the cairn command-line interface.
//!
//! Every test points the binary at a temporary storage root and config
//! directory, and seeds state through the library the binary itself uses.

use std::path::Path;

use assert_cmd::Command;
use cairn_session::{NamespaceConfig, NamespaceOverrides, NamespaceStore};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

struct Env {
    cache: TempDir,
    config: TempDir,
    cwd: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            cache: TempDir::new().unwrap(),
            config: TempDir::new().unwrap(),
            cwd: TempDir::new().unwrap(),
        }
    }

    fn cairn(&self) -> Command {
        let mut cmd = Command::cargo_bin("cairn").unwrap();
        cmd.env_remove("CAIRN_CACHE_DIR")
            .env_remove("CAIRN_CONFIG_DIR")
            .current_dir(self.cwd.path())
            .arg("--cache-dir")
            .arg(self.cache.path())
            .arg("--config-dir")
            .arg(self.config.path());
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cairn().arg("--json").args(args).output().unwrap();
        assert!(output.status.success(), "cairn {:?} failed", args);
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn store(&self, namespace: &str) -> NamespaceStore<Value> {
        store_at(self.cache.path(), namespace)
    }
}

fn store_at(root: &Path, namespace: &str) -> NamespaceStore<Value> {
    NamespaceStore::new(
        root,
        NamespaceConfig::resolve(namespace, &NamespaceOverrides::new()),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("cairn")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("sweep"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    Command::cargo_bin("cairn")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cairn"));
}

#[test]
fn test_show_requires_session_id() {
    Env::new()
        .cairn()
        .args(["show", "conversation"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SESSION_ID"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Commands
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_and_show() {
    let env = Env::new();
    let store = env.store("conversation");
    store.save("thread-1", json!({"turns": 2})).await.unwrap();
    store.save("thread-2", json!({"turns": 4})).await.unwrap();

    let listed = env.json(&["list", "conversation"]);
    assert_eq!(listed["namespace"], "conversation");
    let mut ids: Vec<&str> = listed["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["session_id"].as_str().unwrap())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["thread-1", "thread-2"]);

    let shown = env.json(&["show", "conversation", "thread-2"]);
    assert_eq!(shown["session_id"], "thread-2");
    assert_eq!(shown["payload"], json!({"turns": 4}));

    env.cairn()
        .args(["list", "conversation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("thread-1"));
}

#[test]
fn test_show_missing_session() {
    let env = Env::new();
    assert_eq!(env.json(&["show", "review", "nope"]), Value::Null);

    env.cairn()
        .args(["show", "review", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No session 'nope'"));
}

#[tokio::test]
async fn test_delete() {
    let env = Env::new();
    env.store("brainstorm")
        .save("ideas", json!(["a"]))
        .await
        .unwrap();

    let deleted = env.json(&["delete", "brainstorm", "ideas"]);
    assert_eq!(deleted["deleted"], true);
    assert!(env.store("brainstorm").load("ideas").await.unwrap().is_none());

    env.cairn()
        .args(["delete", "brainstorm", "ideas"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[tokio::test]
async fn test_stats_defaults_to_well_known_namespaces() {
    let env = Env::new();
    env.store("review").save("pr-1", json!({})).await.unwrap();

    let stats = env.json(&["stats"]);
    let stats = stats.as_array().unwrap();
    let names: Vec<&str> = stats.iter().map(|s| s["namespace"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["conversation", "brainstorm", "review"]);

    assert_eq!(stats[2]["live_count"], 1);
    assert_eq!(stats[2]["max_entries"], 50);
    assert_eq!(stats[2]["eviction_policy"], "lru");
    assert_eq!(stats[0]["live_count"], 0);
}

#[tokio::test]
async fn test_sweep_removes_corrupt_entries() {
    let env = Env::new();
    let store = env.store("scratch");
    store.save("good", json!(1)).await.unwrap();
    std::fs::write(store.dir().join("bad.json"), b"{ not json").unwrap();

    let swept = env.json(&["sweep", "scratch"]);
    assert_eq!(swept["report"]["scanned"], 2);
    assert_eq!(swept["report"]["corrupt"], 1);
    assert_eq!(swept["report"]["expired"], 0);

    assert!(!store.dir().join("bad.json").exists());
    assert!(store.load("good").await.unwrap().is_some());
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_reflects_user_file() {
    let env = Env::new();
    std::fs::write(
        env.config.path().join("config.toml"),
        r#"
[cache.defaults]
ttl_secs = 60

[cache.namespaces.review]
max_entries = 7
eviction = "fifo"
"#,
    )
    .unwrap();

    let config = env.json(&["config"]);
    assert_eq!(config["sources"][0]["loaded"], true);
    assert_eq!(
        config["cache_dir"].as_str().unwrap(),
        env.cache.path().to_str().unwrap()
    );

    let review = config["namespaces"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["namespace"] == "review")
        .unwrap();
    assert_eq!(review["max_entries"], 7);
    assert_eq!(review["eviction_policy"], "fifo");
    // File defaults sit below the built-in table for well-known namespaces
    assert_eq!(review["ttl_secs"], 14 * 24 * 60 * 60);
}

#[test]
fn test_config_defaults_apply_to_other_namespaces() {
    let env = Env::new();
    std::fs::write(
        env.config.path().join("config.toml"),
        "[cache.defaults]\nttl_secs = 60\n",
    )
    .unwrap();

    let config = env.json(&["config", "scratch"]);
    let scratch = config["namespaces"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["namespace"] == "scratch")
        .unwrap();
    assert_eq!(scratch["ttl_secs"], 60);
}

#[tokio::test]
async fn test_cache_dir_from_environment() {
    let env = Env::new();
    store_at(env.cache.path(), "conversation")
        .save("from-env", json!(null))
        .await
        .unwrap();

    Command::cargo_bin("cairn")
        .unwrap()
        .current_dir(env.cwd.path())
        .env("CAIRN_CACHE_DIR", env.cache.path())
        .env("CAIRN_CONFIG_DIR", env.config.path())
        .args(["list", "conversation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env"));
}
