//! CLI E2E tests.
//!
//! Each test runs the built `lifeos` binary against its own temporary data
//! directory and checks exit codes and JSON output.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

struct Home(TempDir);

impl Home {
    fn new() -> Self {
        Self(tempfile::tempdir().expect("tempdir"))
    }

    /// Run the CLI and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_lifeos"))
            .args(args)
            .env("LIFEOS_HOME", self.0.path())
            .env_remove("LIFEOS_LOG")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let stdout = self.ok(&full);
        serde_json::from_str(&stdout).expect("Failed to parse JSON output")
    }

    fn fails(&self, args: &[&str]) -> String {
        let (_, stderr, code) = self.run(args);
        assert_ne!(code, 0, "{args:?} unexpectedly succeeded");
        stderr
    }
}

#[test]
fn config_path_lives_in_home() {
    let home = Home::new();
    let path = home.ok(&["config", "path"]);
    assert!(path.trim().ends_with("config.toml"));

    home.ok(&["config", "list"]);
    assert!(home.0.path().join("config.toml").exists());
}

#[test]
fn config_set_and_get() {
    let home = Home::new();
    home.ok(&["config", "set", "timer.default_minutes", "50"]);
    assert_eq!(home.ok(&["config", "get", "timer.default_minutes"]).trim(), "50");

    let stderr = home.fails(&["config", "set", "timer.nonexistent", "1"]);
    assert!(stderr.starts_with("error:"));
    home.fails(&["config", "set", "timer.default_minutes", "500"]);
}

#[test]
fn health_checklist_round_trip() {
    let home = Home::new();
    let day = home.json(&["health", "show", "--date", "2026-01-05"]);
    assert_eq!(day["habits"].as_array().unwrap().len(), 5);
    assert_eq!(day["progress"]["completed"], 0);

    home.ok(&["health", "done", "Workout", "--date", "2026-01-05"]);
    let day = home.json(&["health", "show", "--date", "2026-01-05"]);
    assert_eq!(day["progress"]["completed"], 1);

    home.ok(&["health", "undo", "Workout", "--date", "2026-01-05"]);
    let day = home.json(&["health", "show", "--date", "2026-01-05"]);
    assert_eq!(day["progress"]["completed"], 0);

    home.fails(&["health", "done", "Juggling"]);
}

#[test]
fn academics_custom_task() {
    let home = Home::new();
    home.ok(&["academics", "add", "Maths: Taylor Series", "--date", "2026-01-03"]);
    home.ok(&["academics", "done", "Maths: Taylor Series", "--date", "2026-01-03"]);

    let day = home.json(&["academics", "show", "--date", "2026-01-03"]);
    assert_eq!(day["tasks"][0]["name"], "Maths: Taylor Series");
    assert_eq!(day["tasks"][0]["done"], true);
    assert_eq!(day["progress"]["percent"], 100);

    home.fails(&["academics", "done", "No Such Task", "--date", "2026-01-03"]);
}

#[test]
fn finance_ten_percent_rule() {
    let home = Home::new();
    home.ok(&["finance", "add", "income", "Freelance", "1000", "--date", "2026-01-02"]);
    home.ok(&["finance", "add", "expense", "Food", "200", "--date", "2026-01-02"]);
    home.ok(&["finance", "add", "invest", "Gold", "100", "--date", "2026-01-03"]);

    let summary = home.json(&["finance", "summary"]);
    assert_eq!(summary["total_income"], 1000.0);
    assert_eq!(summary["investment_rate"], 10.0);
    assert_eq!(summary["status"], "Goal Met!");

    let recent = home.json(&["finance", "recent", "--limit", "1"]);
    assert_eq!(recent[0]["category"], "Invest: Gold");

    home.fails(&["finance", "add", "expense", "Food", "-5"]);
    home.fails(&["finance", "add", "expense", "Yachts", "5"]);
}

#[test]
fn timer_lifecycle() {
    let home = Home::new();
    home.ok(&["timer", "start", "--minutes", "25", "--subject", "Maths"]);

    let status = home.json(&["timer", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["state"], "running");

    home.fails(&["timer", "start"]);
    home.ok(&["timer", "pause"]);
    assert_eq!(home.json(&["timer", "status"])["state"], "paused");
    home.ok(&["timer", "resume"]);

    let finished = home.json(&["timer", "finish"]);
    assert_eq!(finished["type"], "TimerFinished");
    assert_eq!(home.json(&["timer", "status"])["state"], "idle");

    let history = home.json(&["timer", "history"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["duration_minutes"], 25);
    assert_eq!(history[0]["subject"], "Maths");

    let stats = home.json(&["timer", "stats"]);
    assert_eq!(stats["total_minutes"], 25);
    assert_eq!(stats["focus_streak"], 1);
}

#[test]
fn timer_stop_records_nothing() {
    let home = Home::new();
    home.ok(&["timer", "start", "--preset", "short"]);
    home.ok(&["timer", "stop"]);
    assert!(home.json(&["timer", "history"]).as_array().unwrap().is_empty());
    home.fails(&["timer", "stop"]);
    home.fails(&["timer", "start", "--preset", "marathon"]);
}

#[test]
fn rev_meter_needs_a_servo() {
    let home = Home::new();
    let stderr = home.fails(&["timer", "start", "--rev-meter"]);
    assert!(stderr.contains("servo"));
    assert_eq!(home.json(&["timer", "status"])["state"], "idle");
}

#[test]
fn servo_angle_mapping() {
    let home = Home::new();
    let out = home.json(&["servo", "angle", "40"]);
    assert_eq!(out["angle"], 112);
    assert_eq!(out["sent"], false);
}
