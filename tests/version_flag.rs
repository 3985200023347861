use assert_cmd::Command;
use predicates::prelude::*;

fn chirp(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("chirp").expect("chirp binary");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("CHIRP_STORAGE__PATH", home.join("state.db"));
    cmd
}

#[test]
fn prints_version() {
    let home = tempfile::tempdir().unwrap();
    chirp(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    let home = tempfile::tempdir().unwrap();
    chirp(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chirp"))
        .stdout(predicate::str::contains("--version"))
        .stdout(predicate::str::contains("--export-html"));
}

#[test]
fn exports_seed_feed_as_html() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("feed.html");
    chirp(home.path())
        .arg("--export-html")
        .arg(&out)
        .assert()
        .success();

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains(r#"id="feed""#));
    assert!(html.contains(r#"id="tweet-btn""#));
    assert!(html.contains("@Elon"));
    assert!(html.contains(r#"data-new-reply="3c23454ee-c0f5-9g9g-9c4b-77835tgs2""#));
}

#[test]
fn reset_without_snapshot_reports_nothing_removed() {
    let home = tempfile::tempdir().unwrap();
    chirp(home.path())
        .arg("--reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored feed"));
}

#[test]
fn export_without_path_fails() {
    let home = tempfile::tempdir().unwrap();
    chirp(home.path())
        .arg("--export-html")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("needs a file path"));
}
