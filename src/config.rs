#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::error::{BridgeError, Result};
use crate::gate::GroupDirectory;
use crate::types::{GroupId, Permission, PermissionMask};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = ".bridge/config.toml";
pub const DEFAULT_SERVICES_TIMEOUT_MS: u64 = 5_000;
pub const MIN_SERVICES_TIMEOUT_MS: u64 = 100;
pub const MAX_SERVICES_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_SENSOR_RANGE: f32 = 64.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub services_timeout: Duration,
    pub workers: usize,
    pub sensor_range: f32,
    groups: HashMap<String, GroupConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    pub name: GroupId,
    pub permissions: PermissionMask,
    pub schedules: usize,
}

impl GroupConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: GroupId::new(name),
            permissions: PermissionMask::empty(),
            schedules: 0,
        }
    }

    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions = self.permissions.with(permission);
        self
    }

    #[must_use]
    pub fn with_schedules(mut self, schedules: usize) -> Self {
        self.schedules = schedules;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            services_timeout: Duration::from_millis(DEFAULT_SERVICES_TIMEOUT_MS),
            workers: DEFAULT_WORKERS,
            sensor_range: DEFAULT_SENSOR_RANGE,
            groups: HashMap::new(),
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn with_group(mut self, group: GroupConfig) -> Self {
        self.groups.insert(group.name.normalized(), group);
        self
    }

    #[must_use]
    pub fn group(&self, group: &GroupId) -> Option<&GroupConfig> {
        self.groups.get(&group.normalized())
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupConfig> {
        self.groups.values()
    }

    fn group_entry(&mut self, name: &str) -> &mut GroupConfig {
        self.groups
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| GroupConfig::new(name))
    }

    /// Applies `BRIDGE_SERVICES_TIMEOUT_MS` and `BRIDGE_WORKERS` when set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(raw) = non_empty_env_var("BRIDGE_SERVICES_TIMEOUT_MS") {
            self.services_timeout = Duration::from_millis(parse_services_timeout_ms(
                Some(&raw),
                duration_ms(self.services_timeout),
            ));
        }
        if let Some(workers) = non_empty_env_var("BRIDGE_WORKERS")
            .and_then(|raw| raw.parse::<usize>().ok())
        {
            self.workers = workers.max(1);
        }
        self
    }
}

impl GroupDirectory for BridgeConfig {
    fn group_capabilities(&self, group: &GroupId) -> PermissionMask {
        self.group(group)
            .map_or_else(PermissionMask::empty, |config| config.permissions)
    }

    fn schedule_limit(&self, group: &GroupId) -> usize {
        self.group(group).map_or(0, |config| config.schedules)
    }
}

/// Loads the config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns `BridgeError::ConfigError` if the file cannot be read or contains
/// an invalid value.
pub async fn load_config(path: Option<PathBuf>) -> Result<BridgeConfig> {
    let config_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if !config_path.exists() {
        return Ok(BridgeConfig::default().with_env_overrides());
    }

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|e| BridgeError::ConfigError(format!("Failed to read config: {e}")))?;

    parse_config_content(&content).map(BridgeConfig::with_env_overrides)
}

/// # Errors
///
/// Returns `BridgeError::ConfigError` on an unparseable number or an unknown
/// permission name.
pub fn parse_config_content(content: &str) -> Result<BridgeConfig> {
    let mut config = BridgeConfig::default();

    for line in content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
    {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        let value = expand_env_vars(value);

        match key {
            "services_timeout_ms" => {
                config.services_timeout = Duration::from_millis(parse_services_timeout_ms(
                    Some(&value),
                    DEFAULT_SERVICES_TIMEOUT_MS,
                ));
            }
            "workers" => config.workers = parse_number::<usize>(key, &value)?.max(1),
            "sensor_range" => config.sensor_range = parse_number::<f32>(key, &value)?,
            other => {
                if let Some((name, field)) = other
                    .strip_prefix("group.")
                    .and_then(|rest| rest.rsplit_once('.'))
                {
                    apply_group_setting(&mut config, name, field, &value)?;
                }
            }
        }
    }

    Ok(config)
}

fn apply_group_setting(
    config: &mut BridgeConfig,
    name: &str,
    field: &str,
    value: &str,
) -> Result<()> {
    match field {
        "permissions" => {
            let permissions = parse_permissions(value)?;
            config.group_entry(name).permissions = permissions;
        }
        "schedules" => {
            let schedules = parse_number::<usize>(&format!("group.{name}.schedules"), value)?;
            config.group_entry(name).schedules = schedules;
        }
        _ => {}
    }
    Ok(())
}

/// Parses a comma-separated list of permission names into a mask.
///
/// # Errors
///
/// Returns `BridgeError::ConfigError` naming the first unknown permission.
pub fn parse_permissions(value: &str) -> Result<PermissionMask> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Permission::try_from(name).map_err(BridgeError::ConfigError))
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| BridgeError::ConfigError(format!("Invalid value for {key}: {value}")))
}

pub fn parse_services_timeout_ms(raw: Option<&str>, default_timeout_ms: u64) -> u64 {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<u64>().ok())
        .map_or(default_timeout_ms, |value| {
            value.clamp(MIN_SERVICES_TIMEOUT_MS, MAX_SERVICES_TIMEOUT_MS)
        })
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Expands `${VAR}` and `${VAR:-default}`. Substituted values are not
/// rescanned.
fn expand_env_vars(input: &str) -> String {
    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        expanded.push_str(&rest[..start]);
        let var_part = &rest[start + 2..start + end];
        let (var_name, default) = var_part.split_once(":-").unwrap_or((var_part, ""));
        expanded.push_str(&std::env::var(var_name).unwrap_or_else(|_| default.to_string()));
        rest = &rest[start + end + 1..];
    }
    expanded.push_str(rest);
    expanded
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once('=')
        .map(|(lhs, rhs)| (lhs.trim(), rhs.trim().trim_matches('"')))
}

fn non_empty_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
