//! Integration tests for the fitlog binary.
//!
//! These tests verify end-to-end behavior including:
//! - Meal logging, editing and totals
//! - Target computation and custom overrides
//! - Hydration, sleep, step, workout and check-in logs
//! - The combined progress view and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI bound to a temp data dir, isolated from the user's config
fn fitlog(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitlog"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn on(data_dir: &Path, date: &str) -> Command {
    let mut cmd = fitlog(data_dir);
    cmd.arg("--date").arg(date);
    cmd
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("fitlog"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Nutrition, hydration, sleep and workout tracker",
        ));
}

#[test]
fn test_food_search() {
    let temp_dir = setup_test_dir();

    fitlog(temp_dir.path())
        .args(["food", "search", "banana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Banana [Fruits] per 100g: 89 kcal"));

    fitlog(temp_dir.path())
        .args(["food", "search", "chick", "--category", "Non-Veg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chicken Breast"))
        .stdout(predicate::str::contains("Chickpeas").not());
}

#[test]
fn test_meal_add_scales_and_persists() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-01-01")
        .args(["meal", "add", "Banana", "150", "--slot", "breakfast"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Added 150g Banana to Breakfast (133.5 kcal)",
        ));

    let path = data_dir.join("users/local/meals/2024-01-01.json");
    let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let item = &doc["meals"]["Breakfast"][0];
    assert_eq!(item["calories"].as_f64(), Some(133.5));
    assert_eq!(item["carbs"].as_f64(), Some(34.2));
    assert_eq!(item["baseline"]["calories"].as_f64(), Some(89.0));
    assert!(doc["updated_at"].is_string());

    on(data_dir, "2024-01-01")
        .args(["meal", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Banana 150g: 133.5 kcal"))
        .stdout(predicate::str::contains("Day total vs default target"));
}

#[test]
fn test_meal_edit_and_delete() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-01-01")
        .args(["meal", "add", "Banana", "150", "--slot", "Lunch"])
        .assert()
        .success();

    on(data_dir, "2024-01-01")
        .args(["meal", "edit", "lunch", "1", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Banana now 100g (89 kcal)"));

    on(data_dir, "2024-01-01")
        .args(["meal", "delete", "lunch", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed Banana from Lunch"));

    on(data_dir, "2024-01-01")
        .args(["meal", "delete", "lunch", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_meal_input_errors() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-01-01")
        .args(["meal", "add", "Banana", "0", "--slot", "lunch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Quantity must be greater than 0"));

    on(data_dir, "2024-01-01")
        .args(["meal", "add", "Banana", "lots", "--slot", "lunch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is not a number"));

    on(data_dir, "2024-01-01")
        .args(["meal", "add", "Dragonfruit", "100", "--slot", "lunch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not in the catalog"));

    on(data_dir, "2024-01-01")
        .args(["meal", "add", "Banana", "100", "--slot", "brunch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Must be one of: Breakfast, Lunch, Dinner",
        ));

    // Nothing was written by the failed commands
    assert!(!data_dir.join("users/local/meals/2024-01-01.json").exists());
}

#[test]
fn test_target_compute_custom_and_clear() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fitlog(data_dir)
        .args(["target", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Target (default):"))
        .stdout(predicate::str::contains("Calories: 3200 kcal"));

    fitlog(data_dir)
        .args([
            "target", "compute", "--age", "30", "--gender", "male", "--height", "180",
            "--weight", "80", "--activity", "moderate", "--goal", "maintain",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Calories: 2759 kcal"))
        .stdout(predicate::str::contains("Protein:  176 g"))
        .stdout(predicate::str::contains("Carbs:    341 g"))
        .stdout(predicate::str::contains("Fats:     77 g"));

    fitlog(data_dir)
        .args(["target", "custom", "--calories", "2000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Target (custom):"))
        .stdout(predicate::str::contains("Protein:  150 g"));

    fitlog(data_dir)
        .args(["target", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Calories: 2000 kcal"));

    fitlog(data_dir)
        .args(["target", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Target (computed):"))
        .stdout(predicate::str::contains("Calories: 2759 kcal"));
}

#[test]
fn test_target_reset_forgets_profile() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fitlog(data_dir)
        .args(["target", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No biometrics or targets set."));

    fitlog(data_dir)
        .args([
            "target", "compute", "--age", "30", "--gender", "male", "--height", "180",
            "--weight", "80", "--activity", "moderate",
        ])
        .assert()
        .success();
    fitlog(data_dir)
        .args(["target", "custom", "--calories", "2000"])
        .assert()
        .success();

    fitlog(data_dir)
        .args(["target", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Biometrics and targets cleared"))
        .stdout(predicate::str::contains("Target (default):"))
        .stdout(predicate::str::contains("Calories: 3200 kcal"));

    let profile: Value = serde_json::from_str(
        &fs::read_to_string(data_dir.join("users/local/profile.json")).unwrap(),
    )
    .unwrap();
    assert!(profile["biometrics"].is_null());
    assert!(profile["computed"].is_null());
    assert!(profile["custom"].is_null());
}

#[test]
fn test_target_custom_macro_recomputes_calories() {
    let temp_dir = setup_test_dir();

    fitlog(temp_dir.path())
        .args(["target", "custom", "--calories", "2000", "--protein", "180"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Calories: 2124 kcal"));

    fitlog(temp_dir.path())
        .args(["target", "custom"])
        .assert()
        .code(2);
}

#[test]
fn test_target_compute_rejects_bad_biometrics() {
    let temp_dir = setup_test_dir();

    fitlog(temp_dir.path())
        .args([
            "target", "compute", "--age", "30", "--gender", "female", "--height", "0",
            "--weight", "60",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("height must be a positive number"));
}

#[test]
fn test_water_tracking() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-02-01")
        .args(["water", "add", "500"])
        .assert()
        .success();
    on(data_dir, "2024-02-01")
        .args(["water", "add", "500", "--creatine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000 ml logged for 2024-02-01"));

    on(data_dir, "2024-02-01")
        .args(["water", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000 / 3000 ml (low)"));

    // 70 kg with creatine: 70 * 30 + 500
    on(data_dir, "2024-02-01")
        .args(["water", "show", "--weight", "70"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000 / 2600 ml (low)"))
        .stdout(predicate::str::contains("1600 ml left"));

    on(data_dir, "2024-02-02")
        .args(["water", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 3000 ml"));
}

#[test]
fn test_sleep_log() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-02-01")
        .args(["sleep", "log", "--sleep", "23:30", "--wake", "07:00", "--quality", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slept 7.50 h"));

    on(data_dir, "2024-02-01")
        .args(["sleep", "log", "--sleep", "23:30", "--wake", "07:00", "--quality", "6"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("between 1 and 5"));

    // Same date replaces the earlier log
    on(data_dir, "2024-02-01")
        .args(["sleep", "log", "--sleep", "22:00", "--wake", "06:00", "--quality", "5"])
        .assert()
        .success();

    let doc: Value = serde_json::from_str(
        &fs::read_to_string(data_dir.join("users/local/sleep.json")).unwrap(),
    )
    .unwrap();
    let logs = doc.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["quality"].as_u64(), Some(5));

    on(data_dir, "2024-02-02")
        .args(["sleep", "log", "--sleep", "23:17", "--wake", "07:00", "--quality", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slept 7.70 h"));
    let doc: Value = serde_json::from_str(
        &fs::read_to_string(data_dir.join("users/local/sleep.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(doc[1]["duration_hours"].as_f64(), Some(7.7));
}

#[test]
fn test_step_tracking() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-02-01")
        .args(["steps", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No steps logged for 2024-02-01."))
        .stdout(predicate::str::contains("No step history yet."));

    on(data_dir, "2024-02-01")
        .args(["steps", "log", "6500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6500 steps logged for 2024-02-01 (goal 10000)"));

    on(data_dir, "2024-02-02")
        .args(["steps", "log", "4000", "--goal", "8000"])
        .assert()
        .success();

    // A later entry for the same day keeps that day's goal
    on(data_dir, "2024-02-02")
        .args(["steps", "log", "8200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(goal 8000)"));

    on(data_dir, "2024-02-02")
        .args(["steps", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Steps 2024-02-02: 8200 / 8000 (goal met)"))
        .stdout(predicate::str::contains(
            "  2024-02-02: 8200 steps\n  2024-02-01: 6500 steps",
        ));

    on(data_dir, "2024-02-03")
        .args(["steps", "log", "100", "--goal", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Step goal must be greater than 0"));

    let doc: Value = serde_json::from_str(
        &fs::read_to_string(data_dir.join("users/local/steps.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(doc.as_array().unwrap().len(), 2);
}

#[test]
fn test_workout_log_appends() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-02-01")
        .args([
            "workout", "log", "--workout", "Push", "--exercise", "Bench Press", "--set",
            "10x60", "--set", "8x70", "--intensity", "4",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Logged Bench Press (2 sets, 1160 kg volume)",
        ));

    on(data_dir, "2024-02-01")
        .args(["workout", "log", "--workout", "Push", "--exercise", "Dips", "--set", "12x0"])
        .assert()
        .success();

    on(data_dir, "2024-02-01")
        .args(["workout", "log", "--workout", "Push", "--exercise", "Dips", "--set", "twelve"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid set"));

    let journal = fs::read_to_string(data_dir.join("users/local/exercise.jsonl")).unwrap();
    assert_eq!(journal.lines().count(), 2);
}

#[test]
fn test_checkin_history_summary() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let checkin = |date: &str, weight: &str, arms: &str| {
        on(data_dir, date)
            .args([
                "checkin", "add", "--weight", weight, "--chest", "100", "--waist", "82",
                "--arms", arms, "--mood", "7", "--energy", "8",
            ])
            .assert()
            .success();
    };
    checkin("2025-04-06", "82", "34.5");
    checkin("2025-04-14", "81", "34.8");
    checkin("2025-04-17", "80.5", "35");

    fitlog(data_dir)
        .args(["checkin", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-04-17: 80.5 kg"))
        .stdout(predicate::str::contains("2025-04-14").not())
        .stdout(predicate::str::contains(
            "Weight decreased by 1.5 kg. Arms up 0.5 cm.",
        ));

    on(data_dir, "2025-04-20")
        .args([
            "checkin", "add", "--weight", "80", "--chest", "100", "--waist", "82", "--arms",
            "35", "--mood", "11", "--energy", "8",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Mood must be between 1 and 10"));

    for weight in ["--weight=-5", "--weight=NaN"] {
        on(data_dir, "2025-04-20")
            .args(["checkin", "add", weight])
            .args([
                "--chest", "100", "--waist", "82", "--arms", "35", "--mood", "7", "--energy",
                "8",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Weight must be a non-negative number"));
    }
}

#[test]
fn test_progress_merges_logs_and_exports_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-03-01")
        .args(["water", "add", "2000"])
        .assert()
        .success();
    on(data_dir, "2024-03-03")
        .args(["water", "add", "2500"])
        .assert()
        .success();
    on(data_dir, "2024-03-02")
        .args(["meal", "add", "Oats", "100", "--slot", "breakfast"])
        .assert()
        .success();
    on(data_dir, "2024-03-01")
        .args(["workout", "log", "--workout", "Legs", "--exercise", "Squat", "--set", "5x100"])
        .assert()
        .success();

    let csv_path = data_dir.join("export").join("progress.csv");
    let output = on(data_dir, "2024-03-03")
        .arg("progress")
        .arg("--csv")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 days"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let day3 = stdout.find("2024-03-03:").unwrap();
    let day2 = stdout.find("2024-03-02:").unwrap();
    let day1 = stdout.find("2024-03-01:").unwrap();
    assert!(day3 < day2 && day2 < day1, "not newest first:\n{}", stdout);
    assert!(stdout.contains("2024-03-02: 389 kcal"));

    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(1).unwrap().starts_with("2024-03-03,2500.0"));

    // Window of one day keeps only the selected date
    on(data_dir, "2024-03-03")
        .args(["progress", "--days", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-02").not());

    // A window reaching before the earliest date keeps every day
    on(data_dir, "2024-03-03")
        .args(["progress", "--days", "4294967295"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-01:"));
}

#[test]
fn test_users_are_isolated() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    on(data_dir, "2024-01-01")
        .args(["--user", "alice", "water", "add", "750"])
        .assert()
        .success();

    on(data_dir, "2024-01-01")
        .args(["--user", "bob", "water", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 3000 ml"));

    on(data_dir, "2024-01-01")
        .args(["--user", "../evil", "water", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid user id"));
}

#[test]
fn test_memory_backend_writes_nothing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let config_dir = data_dir.join("config").join("fitlog");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[storage]\nbackend = \"memory\"\n\n[hydration]\ndaily_goal_ml = 2000.0\n",
    )
    .unwrap();

    on(data_dir, "2024-01-01")
        .args(["water", "add", "1000"])
        .assert()
        .success();
    on(data_dir, "2024-01-01")
        .args(["water", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 2000 ml"));

    assert!(!data_dir.join("users").exists());
}
