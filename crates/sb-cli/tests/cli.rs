//! CLI command integration tests.
//! Each test uses a temp directory via SB_DATA_DIR for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sb_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("sb").unwrap();
    cmd.env("SB_DATA_DIR", data_dir.path());
    cmd
}

fn stat_value(output: &str, key: &str) -> String {
    output
        .lines()
        .find(|l| l.starts_with(key))
        .and_then(|l| l.split_whitespace().last())
        .unwrap_or("")
        .to_string()
}

#[test]
fn list_fresh_profile() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("(no skills yet)"));

    assert!(dir.path().join("profiles/default.db").exists());
}

#[test]
fn add_then_list() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["add", "Read", "--icon", "magic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added daily skill 'Read'"));
    sb_cmd(&dir)
        .args(["add", "Code", "--timed", "--icon", "13"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added timed skill 'Code'"));

    sb_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Read"))
        .stdout(predicate::str::contains("not done"))
        .stdout(predicate::str::contains("0:00 today"))
        .stdout(predicate::str::contains("total level: 2"));
}

#[test]
fn add_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["add", "Sail", "--icon", "sailing"])
        .assert()
        .failure();
    sb_cmd(&dir)
        .args(["add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn complete_once_per_day() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Read"]).assert().success();

    sb_cmd(&dir)
        .args(["complete", "read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+60 XP to Read"));

    sb_cmd(&dir)
        .args(["complete", "Read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already completed today"));

    sb_cmd(&dir)
        .args(["show", "Read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+60 xp"));
}

#[test]
fn complete_timed_skill_fails() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Code", "--timed"]).assert().success();

    sb_cmd(&dir)
        .args(["complete", "Code"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a daily skill"));
}

#[test]
fn unknown_skill_fails() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["complete", "Nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no skill matches 'Nothing'"));
}

#[test]
fn level_up_message() {
    let dir = TempDir::new().unwrap();
    let legacy = dir.path().join("habits-data.json");
    std::fs::write(
        &legacy,
        r#"[{"id": 1760868000000, "name": "Fishing", "icon": "19", "type": "daily", "xp": 80}]"#,
    )
    .unwrap();

    sb_cmd(&dir)
        .arg("import")
        .arg(&legacy)
        .assert()
        .success()
        .stdout(predicate::str::contains("skills=1"));

    sb_cmd(&dir)
        .args(["complete", "Fishing"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Congratulations, you just advanced a Fishing level.",
        ));
}

#[test]
fn timer_start_status_stop() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Code", "--timed"]).assert().success();

    sb_cmd(&dir)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no timers running"));

    sb_cmd(&dir)
        .args(["start", "Code"])
        .assert()
        .success()
        .stdout(predicate::str::contains("started Code timer"));

    sb_cmd(&dir)
        .args(["start", "Code"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timer already running"));

    sb_cmd(&dir)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Code: 0:0"))
        .stdout(predicate::str::contains("+0 xp pending"));

    sb_cmd(&dir)
        .args(["stop", "Code"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopped Code timer"))
        .stdout(predicate::str::contains("not enough time"));

    sb_cmd(&dir)
        .args(["stop", "Code"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timer not running"));
}

#[test]
fn toggle_flips_timer() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Code", "--timed"]).assert().success();

    sb_cmd(&dir)
        .args(["toggle", "Code"])
        .assert()
        .success()
        .stdout(predicate::str::contains("started"));
    sb_cmd(&dir)
        .args(["toggle", "Code"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopped"));
}

#[test]
fn delete_skill() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Read"]).assert().success();
    sb_cmd(&dir)
        .args(["delete", "Read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted 'Read'"));
    sb_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("(no skills yet)"));
}

#[test]
fn focus_add_list_remove() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Read"]).assert().success();
    sb_cmd(&dir).args(["add", "Walk"]).assert().success();

    sb_cmd(&dir)
        .args(["focus", "add", "Walk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("focused 'Walk'"));

    let output = sb_cmd(&dir).args(["focus", "list"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Walk"));
    assert!(!stdout.contains("Read"));

    sb_cmd(&dir)
        .args(["focus", "remove", "Walk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unfocused 'Walk'"));
    sb_cmd(&dir)
        .args(["focus", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(focus list is empty)"));
}

#[test]
fn stats_after_activity() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Read"]).assert().success();
    sb_cmd(&dir).args(["add", "Walk"]).assert().success();
    sb_cmd(&dir).args(["complete", "Read"]).assert().success();

    let output = sb_cmd(&dir).arg("stats").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stat_value(&stdout, "profile:"), "default");
    assert_eq!(stat_value(&stdout, "skills:"), "2");
    assert_eq!(stat_value(&stdout, "total level:"), "2");
    assert_eq!(stat_value(&stdout, "total xp:"), "60");
    assert_eq!(stat_value(&stdout, "best streak:"), "1");
    assert_eq!(stat_value(&stdout, "history:"), "1");
}

#[test]
fn heatmap_shows_today() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Read"]).assert().success();
    sb_cmd(&dir).args(["complete", "Read"]).assert().success();

    sb_cmd(&dir)
        .args(["heatmap", "--weeks", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("█"))
        .stdout(predicate::str::contains("1 active days"));
}

#[test]
fn heatmap_caps_huge_week_counts() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Read"]).assert().success();
    sb_cmd(&dir).args(["complete", "Read"]).assert().success();

    sb_cmd(&dir)
        .args(["heatmap", "--weeks", "100000000"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 active days"));
}

#[test]
fn export_import_roundtrip() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["add", "Read", "--profile", "a"])
        .assert()
        .success();
    sb_cmd(&dir)
        .args(["complete", "Read", "--profile", "a"])
        .assert()
        .success();

    let export_path = dir.path().join("export.json");
    sb_cmd(&dir)
        .args(["export", "--profile", "a"])
        .arg(&export_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported to"));
    assert!(export_path.exists());

    sb_cmd(&dir)
        .args(["import", "--profile", "b"])
        .arg(&export_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported from"));

    let stats_a = sb_cmd(&dir).args(["stats", "--profile", "a"]).output().unwrap();
    let stats_b = sb_cmd(&dir).args(["stats", "--profile", "b"]).output().unwrap();
    let a = String::from_utf8_lossy(&stats_a.stdout);
    let b = String::from_utf8_lossy(&stats_b.stdout);
    assert_eq!(stat_value(&a, "total xp:"), stat_value(&b, "total xp:"));
    assert_eq!(stat_value(&a, "history:"), stat_value(&b, "history:"));
}

#[test]
fn import_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["import", "/nonexistent/export.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to import"));
}

#[test]
fn profiles_are_isolated() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["add", "Read", "--profile", "main"])
        .assert()
        .success();
    sb_cmd(&dir)
        .args(["list", "--profile", "alt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no skills yet)"));
}

#[test]
fn reset_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir).args(["add", "Read"]).assert().success();

    sb_cmd(&dir)
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    sb_cmd(&dir)
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 skills"));
}

#[test]
fn login_whoami_logout() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("not signed in"));

    sb_cmd(&dir)
        .args(["login", "--provider", "discord", "zezima"])
        .assert()
        .success()
        .stdout(predicate::str::contains("signed in as zezima via discord"));

    sb_cmd(&dir)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("zezima via discord"));

    sb_cmd(&dir).arg("logout").assert().success();
    sb_cmd(&dir)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("not signed in"));
}

#[test]
fn login_rejects_unknown_provider() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["login", "--provider", "myspace", "zezima"])
        .assert()
        .failure();
}

#[test]
fn config_show_and_set() {
    let dir = TempDir::new().unwrap();
    sb_cmd(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sound_enabled = true"))
        .stdout(predicate::str::contains("heatmap_weeks = 26"));

    sb_cmd(&dir)
        .args(["config", "set", "sound_enabled", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sound_enabled = false"));
    assert!(dir.path().join("config.toml").exists());

    sb_cmd(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sound_enabled = false"));

    sb_cmd(&dir)
        .args(["config", "set", "volume", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown setting"));
}
