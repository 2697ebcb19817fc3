use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

const SEED: &str = r#"{"users":[
{"id":"user_amani","lastname":"Kabila","firstname":"Amani","gender":"F","country":"RD Congo","phone":"+243990000001","email":"amani@example.com","password":"secret1","refCode":"ref_amani","balanceUSD":0,"balanceCDF":0,"bonusUSD":0,"createdAt":"2026-10-19T08:00:00.000Z"},
{"id":"user_paul","lastname":"Ilunga","firstname":"Paul","gender":"M","country":"RD Congo","phone":"+243990000002","email":"paul@example.com","password":"secret2","sponsorCode":"ref_amani","refCode":"ref_paul","balanceUSD":0,"balanceCDF":0,"bonusUSD":0,"createdAt":"2026-10-19T08:05:00.000Z"}
],"sessions":{"currentUserId":null},"investments":[],"referrals":[]}"#;

fn seeded_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("s_money_db_v1.json"), SEED).unwrap();
    dir
}

fn run(data_dir: &Path, fixture: Option<&str>) -> (String, String, bool) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_smoney"));
    command.arg(data_dir).env("RUST_LOG", "warn");
    if let Some(fixture) = fixture {
        command.arg(format!("tests/fixtures/{fixture}"));
    }
    let output = command.output().expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn imports_entries_and_reports_balances() {
    let dir = seeded_dir();
    let (stdout, stderr, success) = run(dir.path(), Some("entries.csv"));

    assert!(success);
    assert!(stderr.is_empty(), "{stderr}");

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "user,email,usd,cdf,bonus,eligible");
    assert_eq!(lines[1], "user_amani,amani@example.com,17.5,5000,5,true");
    assert_eq!(lines[2], "user_paul,paul@example.com,0,30000,0,true");
}

#[test]
fn imported_entries_are_persisted() {
    let dir = seeded_dir();
    let (_, _, success) = run(dir.path(), Some("entries.csv"));
    assert!(success);

    // second run without entries reads the saved document
    let (stdout, _, success) = run(dir.path(), None);
    assert!(success);
    assert!(stdout.contains("user_amani,amani@example.com,17.5,5000,5,true"));
}

#[test]
fn errors_warn_but_do_not_block() {
    let dir = seeded_dir();
    let (stdout, stderr, success) = run(dir.path(), Some("with_errors.csv"));

    assert!(success);
    assert!(stderr.contains("unrecognized entry type"));
    assert!(stderr.contains("missing amount"));
    assert!(stderr.contains("unsupported currency"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[1], "user_amani,amani@example.com,5,0,0,false");
}

#[test]
fn empty_data_dir_reports_no_users() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, success) = run(dir.path(), None);

    assert!(success);
    assert!(stdout.is_empty());
}
