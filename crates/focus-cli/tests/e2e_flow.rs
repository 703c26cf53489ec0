//! End-to-end tests for the `focus` binary.
//!
//! Each test points the binary at a database inside a temp dir and isolates
//! HOME so no user config is picked up.

use std::path::Path;
use std::process::{Command, Output};

use focus_cli::commands::lock::TimerLock;
use tempfile::TempDir;

fn focus_binary() -> String {
    env!("CARGO_BIN_EXE_focus").to_string()
}

fn focus(home: &Path, args: &[&str]) -> Output {
    Command::new(focus_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("FOCUS_DATABASE_PATH", home.join("data/focus.db"))
        .env("FOCUS_TICK_INTERVAL_MS", "100")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run focus")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "focus should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// A short countdown runs to completion and shows up in history and stats.
#[test]
fn test_countdown_is_recorded() {
    let temp = TempDir::new().unwrap();

    let output = focus(temp.path(), &["run", "--tag", "Writing", "--minutes", "0.02"]);
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.contains("Сессия завершена!"), "unexpected output: {text}");
    assert!(text.contains("Задача: Writing"));

    let output = focus(temp.path(), &["history", "--json"]);
    assert_success(&output);
    let history: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let sessions = history.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["tag"], "Writing");
    assert_eq!(sessions[0]["elapsedSeconds"], 1);
    assert_eq!(sessions[0]["plannedMinutes"], serde_json::json!(1.0 / 60.0));

    let output = focus(temp.path(), &["status", "--json"]);
    assert_success(&output);
    let status: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(status["status"], "idle");
    assert_eq!(status["sessions"], 1);

    let output = focus(temp.path(), &["tags"]);
    assert_success(&output);
    assert!(stdout(&output).starts_with("Writing"));

    let output = focus(temp.path(), &["stats", "--json"]);
    assert_success(&output);
    let stats: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(stats["periods"].as_array().unwrap().len(), 4);
    // a one-second session rounds to zero minutes
    assert_eq!(stats["table"]["rows"].as_array().unwrap().len(), 0);
}

/// Starting without a tag fails with the validation message.
#[test]
fn test_run_without_tag_fails() {
    let temp = TempDir::new().unwrap();

    let output = focus(temp.path(), &["run"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tag cannot be empty"), "unexpected stderr: {stderr}");
}

/// Invalid durations are rejected and nothing is recorded.
#[test]
fn test_configure_rejects_zero_minutes() {
    let temp = TempDir::new().unwrap();

    let output = focus(temp.path(), &["configure", "--tag", "Writing", "--minutes", "0"]);
    assert!(!output.status.success());

    let output = focus(temp.path(), &["status"]);
    assert_success(&output);
    assert!(stdout(&output).starts_with("Задача: не выбрана"));
}

/// Configure, then stop and reset with nothing in progress.
#[test]
fn test_configure_stop_reset() {
    let temp = TempDir::new().unwrap();

    let output = focus(temp.path(), &["configure", "--tag", "Reading", "--minutes", "30"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "Задача: Reading (30 мин)\n");

    let output = focus(temp.path(), &["status"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Осталось: 30:00"));

    let output = focus(temp.path(), &["stop"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "Нет активной сессии.\n");

    let output = focus(temp.path(), &["reset"]);
    assert_success(&output);

    let output = focus(temp.path(), &["history"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "История пуста.\n");
}

/// The theme preference persists across invocations.
#[test]
fn test_theme_roundtrip() {
    let temp = TempDir::new().unwrap();

    let output = focus(temp.path(), &["theme"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "Тема: system\n");

    assert_success(&focus(temp.path(), &["theme", "--dark"]));

    let output = focus(temp.path(), &["theme"]);
    assert_eq!(stdout(&output), "Тема: dark\n");
}

/// While a run holds the timer lock, state-changing commands are refused
/// and read-only ones still work.
#[test]
fn test_timer_commands_wait_for_running_process() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("data")).unwrap();
    let lock = TimerLock::acquire(&temp.path().join("data/focus.db")).unwrap();

    let output = focus(temp.path(), &["stop"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("timer is running in another process"),
        "unexpected stderr: {stderr}"
    );

    assert_success(&focus(temp.path(), &["status"]));
    assert_success(&focus(temp.path(), &["stats", "--period", "today"]));

    drop(lock);
    assert_success(&focus(temp.path(), &["stop"]));
}
