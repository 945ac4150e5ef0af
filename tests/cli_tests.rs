use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn feedrank_cmd(db_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("feedrank").unwrap();
    cmd.env("FEEDRANK_DB_PATH", db_dir.path().join("test.db").to_str().unwrap())
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_shows_once_flag() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .arg("run")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--once"))
        .stdout(predicate::str::contains("Run a single polling cycle and exit"));
}

#[test]
fn test_list_empty_registry() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No feeds configured."));
}

#[test]
fn test_add_then_list() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .args(["add", "https://a.example/feed", "--title", "Example A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Feed added: https://a.example/feed"));

    feedrank_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example A"))
        .stdout(predicate::str::contains("https://a.example/feed"));
}

#[test]
fn test_add_duplicate_is_not_an_error() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .args(["add", "https://a.example/feed"])
        .assert()
        .success();

    feedrank_cmd(&temp_dir)
        .args(["add", "https://a.example/feed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Feed already exists"));
}

#[test]
fn test_add_invalid_url_fails() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .args(["add", "ftp://a.example/feed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid feed URL"));
}

#[test]
fn test_remove_by_url() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .args(["add", "https://a.example/feed"])
        .assert()
        .success();

    feedrank_cmd(&temp_dir)
        .args(["remove", "--url", "https://a.example/feed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed: https://a.example/feed"));

    feedrank_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No feeds configured."));
}

#[test]
fn test_remove_by_url_matches_normalized_spelling() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .args(["add", "https://Example.com/feed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Feed added: https://example.com/feed"));

    feedrank_cmd(&temp_dir)
        .args(["remove", "--url", "https://EXAMPLE.com/feed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed: https://example.com/feed"));
}

#[test]
fn test_latest_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .arg("latest")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries yet."));
}

#[test]
fn test_latest_json_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .args(["latest", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_stats_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Global collection: 0 entries"));
}

#[test]
fn test_bad_numeric_config_fails() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .arg("list")
        .env("FEEDRANK_MAX_ENTRIES", "lots")
        .assert()
        .failure()
        .stderr(predicate::str::contains("FEEDRANK_MAX_ENTRIES"));
}

#[test]
fn test_out_of_range_max_age_fails() {
    let temp_dir = TempDir::new().unwrap();

    feedrank_cmd(&temp_dir)
        .arg("list")
        .env("FEEDRANK_MAX_AGE_DAYS", "1000000000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("FEEDRANK_MAX_AGE_DAYS must be between 1 and"));
}

mod run_once {
    use super::*;

    #[test]
    fn test_run_once_with_empty_registry_is_idle() {
        let temp_dir = TempDir::new().unwrap();

        feedrank_cmd(&temp_dir)
            .args(["run", "--once"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Fetching feeds..."))
            .stdout(predicate::str::contains("No feeds configured."));
    }

    #[test]
    fn test_run_once_survives_unreachable_feed() {
        let temp_dir = TempDir::new().unwrap();

        feedrank_cmd(&temp_dir)
            .args(["add", "http://127.0.0.1:9/feed"])
            .assert()
            .success();

        feedrank_cmd(&temp_dir)
            .args(["run", "--once", "--max-wait-secs", "0"])
            .env("FEEDRANK_FETCH_TIMEOUT_SECS", "2")
            .assert()
            .success()
            .stdout(predicate::str::contains("Fetched 0 of 1 feeds (0 not modified, 1 failed)"));
    }

    #[test]
    fn test_import_then_export() {
        let temp_dir = TempDir::new().unwrap();
        let opml_path = temp_dir.path().join("feeds.opml");
        std::fs::write(
            &opml_path,
            r#"<?xml version="1.0"?>
<opml version="2.0">
  <head><title>Mine</title></head>
  <body>
    <outline text="A" type="rss" xmlUrl="https://a.example/feed"/>
  </body>
</opml>"#,
        )
        .unwrap();

        feedrank_cmd(&temp_dir)
            .args(["import", opml_path.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Import complete: 1 added, 0 duplicates, 0 failed"));

        feedrank_cmd(&temp_dir)
            .arg("export")
            .assert()
            .success()
            .stdout(predicate::str::contains("https://a.example/feed"));
    }
}
