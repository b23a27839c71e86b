//! End-to-end checks driving the `wincopy` binary, each against a fresh
//! temporary working copy.

use assert_cmd::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, TempDir};

fn checkout_repo(dir: &Path) {
    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir)
        .args(["checkout", "https://example.com/repo", "11111111-1111-1111-1111-111111111111"])
        .assert()
        .success();
}

fn setup_wc() -> TempDir {
    let dir = tempdir().unwrap();
    checkout_repo(dir.path());
    dir
}

#[test]
fn checkout_creates_the_admin_directory() {
    let dir = setup_wc();
    assert!(dir.path().join(".wc").join("wc.db").is_file());
}

#[test]
fn status_on_an_unmodified_path_succeeds() {
    let dir = setup_wc();
    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["status", "."])
        .assert()
        .success();
}

#[test]
fn add_then_status_reports_the_file() {
    let dir = setup_wc();
    fs::write(dir.path().join("hello.txt"), "hello world\n").unwrap();

    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["add", "hello.txt"])
        .assert()
        .success();

    let output = Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["status", "hello.txt"])
        .output()
        .expect("failed to execute status command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello.txt"), "status output should name the added file");
}

#[test]
fn status_outside_a_working_copy_fails() {
    let dir = tempdir().unwrap();
    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["status", "."])
        .assert()
        .failure();
}

#[test]
fn add_then_remove_succeeds() {
    let dir = setup_wc();
    fs::write(dir.path().join("todo.txt"), "todo\n").unwrap();

    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["add", "todo.txt"])
        .assert()
        .success();

    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["remove", "todo.txt"])
        .assert()
        .success();
}

#[test]
fn lock_then_unlock_a_path() {
    let dir = setup_wc();
    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["lock", "."])
        .assert()
        .success();

    Command::new(assert_cmd::cargo::cargo_bin!("wincopy"))
        .current_dir(dir.path())
        .args(["unlock", "."])
        .assert()
        .success();
}
