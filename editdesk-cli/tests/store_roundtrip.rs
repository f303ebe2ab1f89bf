use std::path::Path;

use assert_cmd::cargo::{self};
use predicates::str::contains;
use serde_json::Value;

fn editdesk(store: &Path) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!("editdesk");
    cmd.arg("--store").arg(store).arg("--yes");
    cmd
}

fn stored(store: &Path, relative: &str) -> Value {
    let contents = std::fs::read_to_string(store.join(relative)).unwrap();
    serde_json::from_str(&contents).unwrap()
}

#[test]
fn layout_lifecycle_through_the_cli() {
    let dir = tempfile::tempdir().unwrap();

    editdesk(dir.path())
        .args(["layout", "new", "--key", "article", "--title", "Article"])
        .args(["--field", r#"{"fldName": "headline", "fldType": "text"}"#])
        .args(["--field", r#"{"fldName": "body", "fldType": "richtext"}"#])
        .assert()
        .success()
        .stdout(contains("\"okey\": \"article\""))
        .stderr(contains("created layout 1"))
        .stderr(contains("Document saved"));

    editdesk(dir.path())
        .args(["layout", "move-field", "1", "2", "1"])
        .assert()
        .success();
    let layout = stored(dir.path(), "documents/1.json");
    assert_eq!(layout["custFields"][0]["fldName"], "body");
    assert_eq!(layout["custFields"][1]["fldName"], "headline");

    editdesk(dir.path())
        .args(["layout", "remove-field", "1", "2"])
        .assert()
        .success();
    let layout = stored(dir.path(), "documents/1.json");
    assert_eq!(layout["custFields"].as_array().map(Vec::len), Some(1));

    editdesk(dir.path())
        .args(["layout", "show", "1"])
        .assert()
        .success()
        .stdout(contains("\"title\": \"Article\""));

    editdesk(dir.path())
        .args(["layout", "delete", "1"])
        .assert()
        .success()
        .stderr(contains("Document deleted"));
    assert!(!dir.path().join("documents/1.json").exists());
}

#[test]
fn layout_without_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    editdesk(dir.path())
        .args(["layout", "new", "--title", "Nameless"])
        .assert()
        .failure()
        .stderr(contains("Key name is required!"));
    assert!(!dir.path().join("documents").exists());
}

#[test]
fn missing_layout_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    editdesk(dir.path())
        .args(["layout", "show", "9"])
        .assert()
        .failure()
        .stderr(contains("Layout not found"));
}

#[test]
fn settings_edits_and_backup() {
    let dir = tempfile::tempdir().unwrap();

    editdesk(dir.path())
        .args(["settings", "add", "buckets"])
        .arg(r#"{"label": "Prod", "bucketname": "site-prod"}"#)
        .assert()
        .success()
        .stderr(contains("Configuration saved"))
        .stderr(contains("restart requested"));

    editdesk(dir.path())
        .args(["settings", "add-category", "news"])
        .assert()
        .success();
    let config = stored(dir.path(), "config.json");
    assert_eq!(config["buckets"][0]["label"], "Prod");
    assert_eq!(config["categories"][0], "news");

    editdesk(dir.path())
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(contains("site-prod"));

    editdesk(dir.path())
        .args(["settings", "backup", "nightly"])
        .assert()
        .success()
        .stdout(contains("backup written to"))
        .stderr(contains("Backup saved to S3 bucket"));
    assert!(dir.path().join("backups/nightly/config.json").exists());

    editdesk(dir.path())
        .args(["settings", "backup", "-"])
        .assert()
        .failure()
        .stderr(contains("You must select a bucket."));
}

#[test]
fn unreadable_options_file_is_reported_with_its_cause() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");

    editdesk(dir.path())
        .arg("--options")
        .arg(&missing)
        .args(["layout", "show", "1"])
        .assert()
        .failure()
        .stderr(contains("failed to read options file"));
}

#[test]
fn malformed_options_file_keeps_the_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = dir.path().join("options.json");
    std::fs::write(&options, r#"{"dirty_policy": "sometimes"}"#).unwrap();

    editdesk(dir.path())
        .arg("--options")
        .arg(&options)
        .args(["settings", "show"])
        .assert()
        .failure()
        .stderr(contains("invalid session options"))
        .stderr(contains("sometimes"));
}
