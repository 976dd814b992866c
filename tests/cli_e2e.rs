mod support;

use bridge::codec::key_value_get;
use predicates::str::contains;
use support::bridge_harness::{assert_outcome_envelope, BridgeHarness};

fn field(line: &str, key: &str) -> Option<String> {
    key_value_get(key, line)
}

#[test]
fn add_command_over_stdin_reports_success() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    let lines = harness.run_text(&[
        "command,at,group,builders,sender,alice,identifier,r1,action,add,time,2030-01-01T09:00:00,data,wake up",
    ]);

    assert_eq!(lines.len(), 1);
    assert_eq!(field(&lines[0], "command").as_deref(), Some("at"));
    assert_eq!(field(&lines[0], "identifier").as_deref(), Some("r1"));
    assert_eq!(field(&lines[0], "success").as_deref(), Some("true"));
    Ok(())
}

#[test]
fn every_stdin_line_gets_exactly_one_outcome() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    let lines = harness.run_text(&[
        "command,at,group,guests,identifier,denied,action,list",
        "",
        "command,tleport,group,builders,identifier,unknown",
        "command,at,group,builders,identifier,listed,action,list",
    ]);

    assert_eq!(lines.len(), 3);
    let outcome = |id: &str| {
        lines
            .iter()
            .find(|line| field(line, "identifier").as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| format!("no outcome for {id} in {lines:?}"))
    };
    assert_eq!(
        field(&outcome("denied")?, "error").as_deref(),
        Some("PERMISSION_DENIED")
    );
    assert_eq!(
        field(&outcome("unknown")?, "error").as_deref(),
        Some("UNKNOWN_COMMAND")
    );
    assert_eq!(
        field(&outcome("listed")?, "success").as_deref(),
        Some("true")
    );
    Ok(())
}

#[test]
fn concurrent_adds_beyond_the_group_maximum_are_rejected_once() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    let lines = harness.run_text(&[
        "command,at,group,builders,identifier,a1,action,add,time,2030-01-01,data,one",
        "command,at,group,builders,identifier,a2,action,add,time,2030-01-02,data,two",
        "command,at,group,builders,identifier,a3,action,add,time,2030-01-03,data,three",
    ]);

    let rejected = lines
        .iter()
        .filter(|line| field(line, "error").as_deref() == Some("QUOTA_EXCEEDED"))
        .count();
    assert_eq!(lines.len(), 3);
    assert_eq!(rejected, 1);
    Ok(())
}

#[test]
fn empty_stdin_reports_missing_parameter() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    let lines = harness.run_text(&[]);

    assert_eq!(lines.len(), 1);
    assert_eq!(
        field(&lines[0], "error").as_deref(),
        Some("MISSING_PARAMETER")
    );
    Ok(())
}

#[test]
fn json_flag_renders_outcome_envelopes() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    let json = harness.run_json("command,at,group,builders,identifier,j1,action,get,index,7")?;

    assert_outcome_envelope(&json)?;
    assert_eq!(json["ok"], false);
    assert_eq!(json["cmd"], "at");
    assert_eq!(json["rid"], "j1");
    assert_eq!(json["err"]["code"], "NOT_FOUND");
    assert!(json["fix"].is_string());
    Ok(())
}

#[test]
fn line_flag_runs_one_command_and_reflects_failure_in_exit_code() -> Result<(), String> {
    let harness = BridgeHarness::new()?;

    harness
        .command()
        .args(["--line", "command,at,group,builders,action,list"])
        .assert()
        .success()
        .stdout(contains("success,true"));

    harness
        .command()
        .args(["--line", "command,at,group,builders,action,dance"])
        .assert()
        .failure()
        .stdout(contains("UNKNOWN_ACTION"));
    Ok(())
}

#[test]
fn help_lists_flags_and_error_codes() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    harness
        .command()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--line"))
        .stdout(contains("QUOTA_EXCEEDED"));
    Ok(())
}

#[test]
fn version_flag_prints_the_package_version() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    harness
        .command()
        .arg("-v")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn misspelled_flag_is_rejected_with_a_suggestion() -> Result<(), String> {
    let harness = BridgeHarness::new()?;
    harness
        .command()
        .arg("--jsno")
        .assert()
        .code(64)
        .stderr(contains("did you mean --json?"));
    Ok(())
}

#[test]
fn unknown_permission_in_config_fails_startup() -> Result<(), String> {
    use std::io::Write;

    let mut config = tempfile::NamedTempFile::new().map_err(|err| err.to_string())?;
    config
        .write_all(b"group.builders.permissions = schedule, teleport\n")
        .map_err(|err| err.to_string())?;

    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("bridge"))
        .arg("--config")
        .arg(config.path())
        .write_stdin("command,at,group,builders,action,list\n")
        .assert()
        .code(2)
        .stderr(contains("failed to load configuration"));
    Ok(())
}
