use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn sprint(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sprint").unwrap();
    cmd.env("SPRINT_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// Creates a note and returns the short id printed by `create`.
fn create(home: &Path, args: &[&str]) -> String {
    let output = sprint(home).arg("create").args(args).output().unwrap();
    assert!(output.status.success(), "create failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    stdout
        .trim()
        .strip_prefix("Created note ")
        .and_then(|rest| rest.split(':').next())
        .unwrap()
        .to_string()
}

#[test]
fn test_empty_list() {
    let temp_dir = tempfile::tempdir().unwrap();
    sprint(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No notes found."));
}

#[test]
fn test_create_then_list_and_view() {
    let temp_dir = tempfile::tempdir().unwrap();
    let id = create(
        temp_dir.path(),
        &["Standup", "--markup", "<b>Agenda</b><br>demo &amp; review"],
    );

    sprint(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(&id))
        .stdout(predicate::str::contains("Standup Agenda demo & review"));

    sprint(temp_dir.path())
        .args(["view", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Standup"))
        .stdout(predicate::str::contains("demo & review"));

    sprint(temp_dir.path())
        .args(["view", &id, "--markup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<b>Agenda</b>"))
        .stdout(predicate::str::contains("demo &amp; review"));
}

#[test]
fn test_data_dir_flag_overrides_env() {
    let env_home = tempfile::tempdir().unwrap();
    let flag_home = tempfile::tempdir().unwrap();

    sprint(env_home.path())
        .arg("--data-dir")
        .arg(flag_home.path())
        .args(["create", "Elsewhere"])
        .assert()
        .success();

    assert!(flag_home.path().join("data.json").exists());
    assert!(!env_home.path().join("data.json").exists());
}

#[test]
fn test_create_with_image_uploads_attachment() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = temp_dir.path().join("chart.png");
    std::fs::write(&image, b"\x89PNG fake").unwrap();

    let id = create(
        temp_dir.path(),
        &["Charts", "--markup", "Q3", "--image", image.to_str().unwrap()],
    );

    sprint(temp_dir.path())
        .args(["view", &id, "--markup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<img src=\"attachments/att-"))
        .stdout(predicate::str::contains("width=\"360\" height=\"170\""));

    let attachments: Vec<_> = std::fs::read_dir(temp_dir.path().join("attachments"))
        .unwrap()
        .collect();
    assert_eq!(attachments.len(), 1);
}

#[test]
fn test_create_with_missing_image_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    sprint(temp_dir.path())
        .args(["create", "Broken", "--image", "/definitely/not/here.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_format_bold_and_heading() {
    let temp_dir = tempfile::tempdir().unwrap();
    let id = create(temp_dir.path(), &["Plan", "--markup", "Goals and risks"]);

    sprint(temp_dir.path())
        .args(["format", &id, "bold", "--start", "0", "--end", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bold on"));

    sprint(temp_dir.path())
        .args(["view", &id, "--markup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<b>Goals</b> and risks"));

    sprint(temp_dir.path())
        .args(["format", &id, "subheading", "--start", "10", "--end", "15"])
        .assert()
        .success();

    sprint(temp_dir.path())
        .args(["view", &id, "--markup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("class=\"subheading\""));
}

#[test]
fn test_format_out_of_range_fails_and_keeps_note() {
    let temp_dir = tempfile::tempdir().unwrap();
    let id = create(temp_dir.path(), &["Short", "--markup", "hello"]);

    sprint(temp_dir.path())
        .args(["format", &id, "italic", "--start", "0", "--end", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of bounds"));

    sprint(temp_dir.path())
        .args(["view", &id, "--markup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<i>").not());
}

#[test]
fn test_view_unknown_id_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    create(temp_dir.path(), &["Only"]);

    sprint(temp_dir.path())
        .args(["view", "zzzzzzzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No note matches id"));
}

/// Overwrites the single stored note body with `content`.
fn corrupt_note_body(home: &Path, content: &str) -> std::path::PathBuf {
    let body_file = std::fs::read_dir(home)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("note-"))
        })
        .unwrap();
    std::fs::write(&body_file, content).unwrap();
    body_file
}

#[test]
fn test_corrupted_note_shows_fallback() {
    let temp_dir = tempfile::tempdir().unwrap();
    let id = create(temp_dir.path(), &["Fragile", "--markup", "<i>fine</i>"]);
    corrupt_note_body(temp_dir.path(), "<b>unclosed");

    sprint(temp_dir.path())
        .args(["view", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("This note could not be displayed."));
}

#[test]
fn test_format_refuses_corrupted_note_and_keeps_markup() {
    let temp_dir = tempfile::tempdir().unwrap();
    let id = create(temp_dir.path(), &["Fragile", "--markup", "<i>fine</i>"]);
    let body_file = corrupt_note_body(temp_dir.path(), "<b>unclosed");

    sprint(temp_dir.path())
        .args(["format", &id, "bold", "--start", "0", "--end", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not be decoded"));

    assert_eq!(std::fs::read_to_string(&body_file).unwrap(), "<b>unclosed");
}
