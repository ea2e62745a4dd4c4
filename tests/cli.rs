use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn habit_cmd(store: &Path, today: &str) -> Command {
    habit_cmd_as(store, today, "tester")
}

fn habit_cmd_as(store: &Path, today: &str, user: &str) -> Command {
    let mut cmd = Command::cargo_bin("habit").expect("binary habit is built");
    cmd.env_remove("HABIT_STORE_PATH")
        .env_remove("HABIT_TODAY")
        .env_remove("HABIT_USER")
        .env_remove("HABIT_LOG")
        .args([
            "--store",
            store.to_str().unwrap(),
            "--today",
            today,
            "--user",
            user,
            "--no-color",
        ]);
    cmd
}

fn json_of(store: &Path, today: &str, args: &[&str]) -> Value {
    json_of_as(store, today, "tester", args)
}

fn json_of_as(store: &Path, today: &str, user: &str, args: &[&str]) -> Value {
    let out = habit_cmd_as(store, today, user)
        .args(["--format", "json"])
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).expect("valid json")
}

#[test]
fn add_list_show_flow_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    let v = json_of(
        &store,
        "2026-01-26",
        &["add", "Stretch", "--days", "mon,wed,fri", "--reminder", "07:30"],
    );
    assert_eq!(v["habit"]["name"], "Stretch");
    assert_eq!(v["habit"]["reminder_time"], "07:30");
    assert_eq!(
        v["habit"]["active_days"],
        serde_json::json!([true, false, true, false, true, false, false])
    );
    assert_eq!(v["habit"]["creation_date"], "2026-01-26");
    let stretch_id = v["habit"]["id"].as_str().unwrap().to_string();

    json_of(&store, "2026-01-26", &["add", "Read"]);

    let v = json_of(&store, "2026-01-26", &["list"]);
    let names: Vec<&str> = v["habits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Read", "Stretch"]);

    let v = json_of(&store, "2026-01-26", &["show", "str"]);
    assert_eq!(v["habit"]["id"], stretch_id.as_str());
    assert_eq!(v["summary"]["state"], "due_not_done");
}

#[test]
fn completion_is_idempotent_and_missed_day_resets_streak() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(&store, "2026-01-26", &["add", "Stretch", "--days", "mon,wed,fri"]);

    let v = json_of(&store, "2026-01-26", &["done", "stretch"]);
    assert_eq!(v["already_done"], false);
    assert_eq!(v["habit"]["streak_count"], 1);
    assert_eq!(v["habit"]["total_completions"], 1);
    assert_eq!(v["habit"]["completion_dates"], serde_json::json!(["2026-01-26"]));

    let v = json_of(&store, "2026-01-26", &["done", "stretch"]);
    assert_eq!(v["already_done"], true);
    assert_eq!(v["habit"]["total_completions"], 1);

    // Opened again on Thursday: Wednesday passed without completion.
    let v = json_of(&store, "2026-01-29", &["show", "stretch"]);
    assert_eq!(v["habit"]["streak_count"], 0);
    assert_eq!(v["habit"]["longest_streak"], 1);
    assert_eq!(v["habit"]["total_attempts"], 2);
    assert_eq!(v["habit"]["is_done_today"], false);
    assert_eq!(v["habit"]["progress"], 0.0);
    assert_eq!(v["summary"]["state"], "not_due_today");

    // Same day again: nothing more is counted.
    let v = json_of(&store, "2026-01-29", &["show", "stretch"]);
    assert_eq!(v["habit"]["total_attempts"], 2);

    // Friday becomes due and counts as an attempt.
    let v = json_of(&store, "2026-01-30", &["done", "stretch"]);
    assert_eq!(v["habit"]["total_attempts"], 3);
    assert_eq!(v["habit"]["streak_count"], 1);
}

#[test]
fn today_lists_only_scheduled_habits() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(&store, "2026-01-26", &["add", "Stretch", "--days", "weekdays"]);
    json_of(&store, "2026-01-26", &["add", "Yoga", "--days", "weekends"]);

    let v = json_of(&store, "2026-01-31", &["today"]);
    assert_eq!(v["day_index"], 5);
    let habits = v["habits"].as_array().unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0]["name"], "Yoga");
    assert_eq!(v["progress"]["due"], 1);
    assert_eq!(v["progress"]["done"], 0);

    json_of(&store, "2026-01-31", &["done", "yoga"]);
    let v = json_of(&store, "2026-01-31", &["today"]);
    assert_eq!(v["habits"][0]["state"], "due_done");
    assert_eq!(v["progress"]["progress"], 1.0);
}

#[test]
fn day_flag_shows_another_day_of_the_week() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(&store, "2026-01-26", &["add", "Stretch", "--days", "mon,wed,fri"]);
    json_of(&store, "2026-01-26", &["add", "Yoga", "--days", "weekends"]);
    json_of(&store, "2026-01-26", &["done", "stretch"]);

    // Viewed on Wednesday, Monday is read from the completion history.
    let v = json_of(&store, "2026-01-28", &["today", "--day", "mon"]);
    assert_eq!(v["date"], "2026-01-26");
    assert_eq!(v["day_index"], 0);
    assert_eq!(v["habits"][0]["name"], "Stretch");
    assert_eq!(v["habits"][0]["state"], "due_done");

    let v = json_of(&store, "2026-01-28", &["today", "--day", "6"]);
    assert_eq!(v["date"], "2026-02-01");
    let names: Vec<&str> = v["habits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Yoga"]);
    assert_eq!(v["progress"]["due"], 1);

    habit_cmd(&store, "2026-01-28")
        .args(["today", "--day", "7"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid day index: 7"));

    habit_cmd(&store, "2026-01-28")
        .args(["today", "--day", "someday"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn today_table_output() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    habit_cmd(&store, "2026-01-26")
        .args(["add", "Stretch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Stretch"));

    habit_cmd(&store, "2026-01-26")
        .args(["today"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-01-26 (mon)").and(predicate::str::contains("Stretch")));
}

#[test]
fn calendar_and_stats_reflect_completion_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(&store, "2026-01-30", &["add", "Read"]);
    json_of(&store, "2026-01-30", &["done", "read"]);
    json_of(&store, "2026-01-31", &["done", "read"]);
    json_of(&store, "2026-02-01", &["done", "read"]);

    let v = json_of(&store, "2026-02-01", &["calendar", "read", "--month", "2026-01"]);
    assert_eq!(v["calendar"]["number_of_days"], 31);
    assert_eq!(v["calendar"]["first_day_index"], 3);
    assert_eq!(v["calendar"]["days_done"], 2);
    assert_eq!(v["calendar"]["days"][29]["completed"], true);

    let v = json_of(&store, "2026-02-01", &["stats"]);
    let row = &v["stats"][0];
    assert_eq!(row["current_streak"], 3);
    assert_eq!(row["longest_streak"], 3);
    assert_eq!(row["total_completions"], 3);
    assert_eq!(row["total_attempts"], 3);
    assert_eq!(row["completion_rate"], 1.0);
    assert_eq!(row["days_done_in_month"], 1);
}

#[test]
fn week_starts_on_monday() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    let v = json_of(&store, "2026-01-31", &["week"]);
    let week = v["week"].as_array().unwrap();
    assert_eq!(week.len(), 7);
    assert_eq!(week[0]["date"], "2026-01-26");
    assert_eq!(week[0]["day"], "mon");
    assert_eq!(week[5]["is_today"], true);
    assert_eq!(week[6]["date"], "2026-02-01");
}

#[test]
fn reminders_follow_habit_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(
        &store,
        "2026-01-26",
        &["add", "Stretch", "--days", "mon,wed,sun", "--reminder", "21:15"],
    );

    let v = json_of(&store, "2026-01-26", &["reminders"]);
    let reminders = v["reminders"].as_array().unwrap();
    let ids: Vec<&str> = reminders
        .iter()
        .map(|r| r["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["Stretch_0", "Stretch_2", "Stretch_6"]);
    assert_eq!(reminders[2]["weekday"], 1);
    assert_eq!(reminders[0]["time"], "21:15");

    json_of(&store, "2026-01-26", &["delete", "stretch"]);
    let v = json_of(&store, "2026-01-26", &["reminders"]);
    assert!(v["reminders"].as_array().unwrap().is_empty());
    let v = json_of(&store, "2026-01-26", &["list"]);
    assert!(v["habits"].as_array().unwrap().is_empty());
}

#[test]
fn users_do_not_share_habits() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(&store, "2026-01-26", &["add", "Stretch"]);

    let v = json_of_as(&store, "2026-01-26", "someone-else", &["list"]);
    assert!(v["habits"].as_array().unwrap().is_empty());
}

#[test]
fn users_keep_their_own_reminders() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(&store, "2026-01-26", &["add", "Read", "--reminder", "07:00"]);
    json_of_as(&store, "2026-01-26", "other", &["add", "Read", "--days", "weekends"]);

    let mine = json_of(&store, "2026-01-26", &["reminders"]);
    assert_eq!(mine["reminders"].as_array().unwrap().len(), 7);
    assert_eq!(mine["reminders"][0]["time"], "07:00");
    let theirs = json_of_as(&store, "2026-01-26", "other", &["reminders"]);
    assert_eq!(theirs["reminders"].as_array().unwrap().len(), 2);

    json_of(&store, "2026-01-26", &["delete", "read"]);
    let mine = json_of(&store, "2026-01-26", &["reminders"]);
    assert!(mine["reminders"].as_array().unwrap().is_empty());
    let theirs = json_of_as(&store, "2026-01-26", "other", &["reminders"]);
    let ids: Vec<&str> = theirs["reminders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["Read_5", "Read_6"]);
}

#[test]
fn ambiguous_selector_exit_code_4() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    for name in ["Stretch", "Strength"] {
        habit_cmd(&store, "2026-01-26").args(["add", name]).assert().success();
    }

    habit_cmd(&store, "2026-01-26")
        .args(["done", "str"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("Ambiguous").and(predicate::str::contains("Candidates")));
}

#[test]
fn not_found_exit_code_3() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    habit_cmd(&store, "2026-01-26")
        .args(["done", "nothing"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Habit not found"));
}

#[test]
fn validation_errors_exit_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    habit_cmd(&store, "2026-01-26")
        .args(["add", "   "])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Habit name is required"));

    habit_cmd(&store, "2026-01-26")
        .args(["add", "Read", "--days", "someday"])
        .assert()
        .failure()
        .code(2);

    habit_cmd(&store, "2026-01-26")
        .args(["add", "Read", "--reminder", "25:00"])
        .assert()
        .failure()
        .code(2);

    habit_cmd(&store, "2026-02-30")
        .args(["list"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid today"));

    let v = json_of(&store, "2026-01-26", &["list"]);
    assert!(v["habits"].as_array().unwrap().is_empty());
}

#[test]
fn blank_user_is_not_authenticated() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    habit_cmd_as(&store, "2026-01-26", " ")
        .args(["list"])
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("Not authenticated"));
}

#[test]
fn corrupted_store_exit_code_5() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");
    fs::write(&store, "{ not json").unwrap();

    habit_cmd(&store, "2026-01-26")
        .args(["list"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("Store corrupted"));
}

#[test]
fn store_file_is_stable_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    json_of(&store, "2026-01-26", &["add", "Stretch"]);

    let txt = fs::read_to_string(&store).unwrap();
    let v: Value = serde_json::from_str(&txt).unwrap();
    assert_eq!(v["version"], 1);
    assert_eq!(v["users"]["tester"]["last_known_day"], "2026-01-26");
    assert_eq!(v["users"]["tester"]["reminders"].as_array().unwrap().len(), 7);
    assert!(txt.ends_with('\n'));
    assert!(txt.find("\"last_known_day\"").unwrap() < txt.find("\"reminders\"").unwrap());
}
