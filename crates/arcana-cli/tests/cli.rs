//! CLI command integration tests.
//! Each test uses a temp directory via ARCANA_DATA_DIR for full isolation
//! and pins the calendar day with --date so results are reproducible.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn arcana_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("arcana").unwrap();
    cmd.env("ARCANA_DATA_DIR", data_dir.path());
    cmd
}

const D1: &str = "2026-02-21";
const D2: &str = "2026-02-22";

#[test]
fn stats_fresh_db() {
    let dir = TempDir::new().unwrap();
    arcana_cmd(&dir)
        .args(["stats", "--user", "fresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user:       fresh"))
        .stdout(predicate::str::contains("balance:    0"))
        .stdout(predicate::str::contains("state:      (fresh)"));
}

#[test]
fn today_is_repeatable_and_unrevealed() {
    let dir = TempDir::new().unwrap();

    let first = arcana_cmd(&dir)
        .args(["today", "--user", "alice", "--date", D1])
        .output()
        .unwrap();
    assert!(first.status.success());
    let first_out = String::from_utf8_lossy(&first.stdout).to_string();
    assert!(first_out.contains("revealed:     not yet"));
    assert!(first_out.contains("tarot card:   #"));

    // Calling again changes nothing
    let second = arcana_cmd(&dir)
        .args(["today", "--user", "alice", "--date", D1])
        .output()
        .unwrap();
    assert_eq!(first_out, String::from_utf8_lossy(&second.stdout));
}

#[test]
fn reveal_then_reveal_shows_fixed_result() {
    let dir = TempDir::new().unwrap();

    let first = arcana_cmd(&dir)
        .args(["reveal", "card-2", "--user", "alice", "--date", D1])
        .output()
        .unwrap();
    assert!(first.status.success());
    let first_out = String::from_utf8_lossy(&first.stdout).to_string();
    let card_line = first_out
        .lines()
        .find(|l| l.starts_with("tarot card:"))
        .unwrap()
        .to_string();

    // Second reveal the same day is a soft path with the identical card
    let second = arcana_cmd(&dir)
        .args(["reveal", "card-7", "--user", "alice", "--date", D1])
        .output()
        .unwrap();
    assert!(second.status.success());
    let second_out = String::from_utf8_lossy(&second.stdout).to_string();
    assert!(second_out.contains("already revealed today"));
    assert!(second_out.contains(&card_line), "card changed on re-reveal");

    // Today reports the committed item
    arcana_cmd(&dir)
        .args(["today", "--user", "alice", "--date", D1])
        .assert()
        .success()
        .stdout(predicate::str::contains("revealed:     yes (card-2)"));
}

#[test]
fn reveal_resets_across_midnight() {
    let dir = TempDir::new().unwrap();

    arcana_cmd(&dir)
        .args(["reveal", "card-1", "--user", "alice", "--date", D1])
        .assert()
        .success();

    arcana_cmd(&dir)
        .args(["today", "--user", "alice", "--date", D2])
        .assert()
        .success()
        .stdout(predicate::str::contains("revealed:     not yet"));

    // And the next day's reveal is allowed again
    arcana_cmd(&dir)
        .args(["reveal", "card-4", "--user", "alice", "--date", D2])
        .assert()
        .success()
        .stdout(predicate::str::contains("tarot card:   #"));
}

#[test]
fn stale_state_is_surfaced_not_reset() {
    let dir = TempDir::new().unwrap();

    arcana_cmd(&dir)
        .args(["reveal", "card-1", "--user", "alice", "--date", D2])
        .assert()
        .success();

    // Clock "moved backwards": today resolves before the stored state
    arcana_cmd(&dir)
        .args(["today", "--user", "alice", "--date", D1])
        .assert()
        .failure()
        .stderr(predicate::str::contains("clock may have moved backwards"));

    // Nothing was reset
    arcana_cmd(&dir)
        .args(["today", "--user", "alice", "--date", D2])
        .assert()
        .success()
        .stdout(predicate::str::contains("revealed:     yes (card-1)"));
}

#[test]
fn credit_spend_balance_arithmetic() {
    let dir = TempDir::new().unwrap();

    arcana_cmd(&dir)
        .args(["credit", "100", "daily_checkin", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance: 100"));

    arcana_cmd(&dir)
        .args(["spend", "30", "reading", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance: 70"));

    arcana_cmd(&dir)
        .args(["balance", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance:   70"))
        .stdout(predicate::str::contains("lifetime:  100"));

    arcana_cmd(&dir)
        .args(["history", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("daily_checkin"))
        .stdout(predicate::str::contains("-30"));
}

#[test]
fn overspend_fails_and_leaves_balance() {
    let dir = TempDir::new().unwrap();

    arcana_cmd(&dir)
        .args(["credit", "10", "seed", "--user", "bob"])
        .assert()
        .success();

    arcana_cmd(&dir)
        .args(["spend", "50", "reading", "--user", "bob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient points"));

    arcana_cmd(&dir)
        .args(["balance", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance:   10"));
}

#[test]
fn invalid_credit_amount_rejected() {
    let dir = TempDir::new().unwrap();
    arcana_cmd(&dir)
        .args(["credit", "0", "nope", "--user", "bob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be positive"));
}

#[test]
fn locked_reveal_quota_then_points_then_blocked() {
    let dir = TempDir::new().unwrap();

    arcana_cmd(&dir)
        .args(["quota", "--user", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "premium_reveal: 1 free use(s) left, then 50 points each",
        ));

    // Day 1: the free use covers it
    arcana_cmd(&dir)
        .args(["reveal", "premium-1", "--locked", "--user", "carol", "--date", D1])
        .assert()
        .success()
        .stdout(predicate::str::contains("gating:       free use consumed"));

    // Day 2: no free uses, no points → blocked with nothing mutated
    arcana_cmd(&dir)
        .args(["reveal", "premium-2", "--locked", "--user", "carol", "--date", D2])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs 50 points"));

    arcana_cmd(&dir)
        .args(["today", "--user", "carol", "--date", D2])
        .assert()
        .success()
        .stdout(predicate::str::contains("revealed:     not yet"));

    // With points credited the same reveal goes through as a spend
    arcana_cmd(&dir)
        .args(["credit", "60", "promo", "--user", "carol"])
        .assert()
        .success();

    arcana_cmd(&dir)
        .args(["reveal", "premium-2", "--locked", "--user", "carol", "--date", D2])
        .assert()
        .success()
        .stdout(predicate::str::contains("gating:       50 points spent"));

    arcana_cmd(&dir)
        .args(["balance", "--user", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance:   10"));
}

#[test]
fn shuffle_limit_enforced() {
    let dir = TempDir::new().unwrap();

    for expected in ["shuffles:     1/2", "shuffles:     2/2"] {
        arcana_cmd(&dir)
            .args(["shuffle", "--user", "alice", "--date", D1])
            .assert()
            .success()
            .stdout(predicate::str::contains(expected));
    }

    arcana_cmd(&dir)
        .args(["shuffle", "--user", "alice", "--date", D1])
        .assert()
        .failure()
        .stderr(predicate::str::contains("shuffle limit"));

    // Fresh allowance the next day
    arcana_cmd(&dir)
        .args(["shuffle", "--user", "alice", "--date", D2])
        .assert()
        .success()
        .stdout(predicate::str::contains("shuffles:     1/2"));
}

#[test]
fn profile_birth_date_drives_numerology() {
    let dir = TempDir::new().unwrap();

    // Without a birth date the numerology value is flagged as fallback
    arcana_cmd(&dir)
        .args(["today", "--user", "dana", "--date", D1])
        .assert()
        .success()
        .stdout(predicate::str::contains("(fallback)"));

    arcana_cmd(&dir)
        .args(["profile", "--birth-date", "1990-05-15", "--user", "dana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("birth date set to 1990-05-15"));

    // Life path for 1990-05-15 is 3, and no fallback marker
    let out = arcana_cmd(&dir)
        .args(["today", "--user", "dana", "--date", D1])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("numerology:   3"));
    assert!(!stdout.contains("(fallback)"));
}

#[test]
fn export_import_roundtrip() {
    let dir = TempDir::new().unwrap();

    arcana_cmd(&dir)
        .args(["credit", "100", "promo", "--user", "erin"])
        .assert()
        .success();
    arcana_cmd(&dir)
        .args(["reveal", "card-3", "--user", "erin", "--date", D1])
        .assert()
        .success();

    let export_path = dir.path().join("erin.json");
    arcana_cmd(&dir)
        .args(["export", "--user", "erin"])
        .arg(&export_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported to"));

    // Restore into a different user's store
    arcana_cmd(&dir)
        .args(["import", "--user", "erin-restored"])
        .arg(&export_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("entries=1, balance=100"));

    arcana_cmd(&dir)
        .args(["today", "--user", "erin-restored", "--date", D1])
        .assert()
        .success()
        .stdout(predicate::str::contains("revealed:     yes (card-3)"));
}

#[test]
fn users_are_isolated() {
    let dir = TempDir::new().unwrap();

    arcana_cmd(&dir)
        .args(["credit", "100", "promo", "--user", "alice"])
        .assert()
        .success();

    arcana_cmd(&dir)
        .args(["balance", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance:   0"));
}

#[test]
fn invalid_date_flag_rejected() {
    let dir = TempDir::new().unwrap();
    arcana_cmd(&dir)
        .args(["today", "--user", "alice", "--date", "2026-13-40"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --date"));
}
