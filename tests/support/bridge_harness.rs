use assert_cmd::Command;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

pub const CONFIG: &str = "\
# test groups
services_timeout_ms = 500
workers = 4
group.builders.permissions = schedule, talk
group.builders.schedules = 2
group.guests.permissions = talk
";

#[derive(Debug)]
pub struct BridgeHarness {
    binary_path: PathBuf,
    config: NamedTempFile,
}

impl BridgeHarness {
    pub fn new() -> Result<Self, String> {
        let mut config = NamedTempFile::new().map_err(|err| err.to_string())?;
        config
            .write_all(CONFIG.as_bytes())
            .map_err(|err| err.to_string())?;
        Ok(Self {
            binary_path: PathBuf::from(assert_cmd::cargo::cargo_bin!("bridge")),
            config,
        })
    }

    #[must_use]
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("--config")
            .arg(self.config.path())
            .env_remove("BRIDGE_WORKERS")
            .env_remove("BRIDGE_SERVICES_TIMEOUT_MS")
            .env("RUST_LOG", "warn");
        command
    }

    /// Runs the protocol loop over `lines` and returns stdout split by line.
    pub fn run_text(&self, lines: &[&str]) -> Vec<String> {
        let assert = self
            .command()
            .write_stdin(format!("{}\n", lines.join("\n")))
            .assert()
            .success();
        String::from_utf8_lossy(&assert.get_output().stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn run_json(&self, line: &str) -> Result<Value, String> {
        let assert = self
            .command()
            .arg("--json")
            .write_stdin(format!("{line}\n"))
            .assert()
            .success();

        let raw = String::from_utf8_lossy(&assert.get_output().stdout)
            .trim()
            .to_string();
        serde_json::from_str::<Value>(&raw)
            .map_err(|err| format!("expected JSON outcome envelope, got '{raw}': {err}"))
    }
}

pub fn assert_outcome_envelope(output: &Value) -> Result<(), String> {
    match (output.get("ok"), output.get("t"), output.get("ms")) {
        (Some(ok), Some(timestamp), Some(duration))
            if ok.is_boolean() && timestamp.is_number() && duration.is_number() =>
        {
            Ok(())
        }
        _ => Err(format!(
            "missing or invalid outcome envelope fields in response: {output}"
        )),
    }
}
