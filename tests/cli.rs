//! CLI smoke tests. None of these touch the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

use sw_cache::cache::{CacheStorage, SqliteStorage};

fn sw_cache(dir: &Path) -> Command {
  let mut cmd = Command::cargo_bin("sw-cache").unwrap();
  cmd
    .current_dir(dir)
    .env("XDG_CONFIG_HOME", dir.join("config"))
    .env_remove("SW_CACHE_DB")
    .env_remove("SW_CACHE_LOG");
  cmd
}

#[test]
fn help_displays() {
  let dir = tempfile::tempdir().unwrap();
  sw_cache(dir.path())
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("cache-first static assets"));
}

#[test]
fn empty_database_has_no_buckets() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("cache.db");

  sw_cache(dir.path())
    .arg("--db")
    .arg(&db)
    .arg("buckets")
    .assert()
    .success()
    .stdout(predicate::str::contains("No buckets"));

  sw_cache(dir.path())
    .arg("--db")
    .arg(&db)
    .arg("keys")
    .assert()
    .success()
    .stdout(predicate::str::contains("No entries in item-manage-v1"));
}

#[test]
fn buckets_marks_current_and_activate_prunes() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("cache.db");
  {
    let storage = SqliteStorage::open(&db).unwrap();
    storage.open_bucket("item-manage-v1").unwrap();
    storage.open_bucket("item-manage-v2").unwrap();
  }
  std::fs::write(dir.path().join("sw-cache.yaml"), "cache_name: item-manage-v2\n").unwrap();

  sw_cache(dir.path())
    .arg("--db")
    .arg(&db)
    .arg("buckets")
    .assert()
    .success()
    .stdout(predicate::str::contains("* item-manage-v2"))
    .stdout(predicate::str::contains("  item-manage-v1"));

  sw_cache(dir.path())
    .arg("--db")
    .arg(&db)
    .arg("activate")
    .assert()
    .success()
    .stdout(predicate::str::contains("Deleted item-manage-v1"));

  let storage = SqliteStorage::open(&db).unwrap();
  assert_eq!(storage.bucket_names().unwrap(), vec!["item-manage-v2"]);
}

#[test]
fn database_path_from_environment() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("env.db");

  sw_cache(dir.path())
    .env("SW_CACHE_DB", &db)
    .arg("activate")
    .assert()
    .success()
    .stdout(predicate::str::contains("No stale buckets"));

  assert!(db.exists());
}

#[test]
fn missing_explicit_config_fails() {
  let dir = tempfile::tempdir().unwrap();

  sw_cache(dir.path())
    .args(["--config", "nope.yaml", "buckets"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn log_file_receives_output() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("cache.db");
  let log = dir.path().join("logs").join("sw-cache.log");
  {
    let storage = SqliteStorage::open(&db).unwrap();
    storage.open_bucket("item-manage-v0").unwrap();
  }

  sw_cache(dir.path())
    .env("SW_CACHE_LOG", "info")
    .arg("--db")
    .arg(&db)
    .arg("--log-file")
    .arg(&log)
    .arg("activate")
    .assert()
    .success();

  let contents = std::fs::read_to_string(&log).unwrap();
  assert!(contents.contains("deleted stale bucket"));
}
