use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn state_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("asset-registry-cli-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(state: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_asset-registry"))
        .arg("--state")
        .arg(state)
        .args(args)
        .env_remove("ASSET_REGISTRY_STATE")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn init_ledger_exits_zero_and_writes_snapshot() {
    let dir = state_dir("init");
    let state = dir.join("ledger.json");

    let output = run(&state, &["invoke", "initLedger"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(state.exists());

    let output = run(&state, &["invoke", "queryAsset", "Asset0"]);
    assert_eq!(output.status.code(), Some(0));
    let asset: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(asset["Title"], "Test1");
    assert_eq!(asset["ApprovalStatus"], "Pending approval");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn read_only_invocation_on_fresh_ledger_creates_no_snapshot() {
    let dir = state_dir("fresh");
    let state = dir.join("ledger.json");

    let output = run(&state, &["invoke", "queryAsset", "ghost"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
    assert!(!state.exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rejected_invocation_exits_one_and_leaves_snapshot_alone() {
    let dir = state_dir("rejected");
    let state = dir.join("ledger.json");
    assert_eq!(run(&state, &["invoke", "initLedger"]).status.code(), Some(0));
    let before = fs::read(&state).unwrap();

    for args in [
        &["invoke", "changeAssetGrade", "Asset0"][..],
        &["invoke", "putAsset", "A1", "H"][..],
        &["invoke", "changeAssetGrade", "ghost", "Approved"][..],
        &["invoke", "burnAsset"][..],
    ] {
        let output = run(&state, args);
        assert_eq!(output.status.code(), Some(1), "{args:?}");
        assert_eq!(fs::read(&state).unwrap(), before, "{args:?}");
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rejection_is_reported_once_on_stderr() {
    let dir = state_dir("stderr");
    let state = dir.join("ledger.json");

    let output = run(&state, &["invoke", "changeAssetGrade", "Asset0"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert_eq!(
        err.trim(),
        "error: Incorrect number of arguments for changeAssetGrade. Expecting 2, got 1"
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unreadable_snapshot_exits_two() {
    let dir = state_dir("garbage");
    let state = dir.join("ledger.json");
    fs::write(&state, b"this is not a snapshot").unwrap();

    let output = run(&state, &["invoke", "queryAllAsset"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("malformed ledger snapshot"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn tampered_snapshot_exits_two() {
    let dir = state_dir("tampered");
    let state = dir.join("ledger.json");
    assert_eq!(run(&state, &["invoke", "initLedger"]).status.code(), Some(0));

    let mut snapshot: serde_json::Value =
        serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    snapshot["meta"]["state_root"] = serde_json::Value::String("00".repeat(32));
    fs::write(&state, serde_json::to_vec_pretty(&snapshot).unwrap()).unwrap();

    let output = run(&state, &["root"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("does not match entries"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn root_prints_height_and_state_root() {
    let dir = state_dir("root");
    let state = dir.join("ledger.json");

    let output = run(&state, &["root"]);
    assert_eq!(output.status.code(), Some(0));
    let empty_root = stdout(&output);
    assert!(empty_root.starts_with("height 0\n"), "{empty_root}");

    run(&state, &["invoke", "initLedger"]);
    run(
        &state,
        &["invoke", "putAsset", "A1", "H", "R", "T", "1", "d", "Au", "Pending", ""],
    );
    run(&state, &["invoke", "changeAssetGrade", "A1", "Approved"]);

    let output = run(&state, &["root"]);
    assert_eq!(output.status.code(), Some(0));
    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(lines[0], "height 3");

    let snapshot: serde_json::Value =
        serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    let root = snapshot["meta"]["state_root"].as_str().unwrap();
    assert_eq!(lines[1], format!("root   {root}"));
    assert_ne!(stdout(&output), empty_root);

    fs::remove_dir_all(&dir).unwrap();
}
