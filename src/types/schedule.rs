#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::identifiers::{GroupId, RequestId, SenderId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rendering used for due times in result payloads.
pub const DUE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A deferred command owned by the schedule store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    group: GroupId,
    due: DateTime<Utc>,
    sender: SenderId,
    request_id: RequestId,
    payload: String,
}

impl ScheduledEntry {
    #[must_use]
    pub fn new(
        group: GroupId,
        due: DateTime<Utc>,
        sender: SenderId,
        request_id: RequestId,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            group,
            due,
            sender,
            request_id,
            payload: payload.into(),
        }
    }

    #[must_use]
    pub const fn group(&self) -> &GroupId {
        &self.group
    }

    #[must_use]
    pub const fn due(&self) -> DateTime<Utc> {
        self.due
    }

    #[must_use]
    pub const fn sender(&self) -> &SenderId {
        &self.sender
    }

    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Flat field sequence: sender, request identifier, due time, payload.
    #[must_use]
    pub fn fields(&self) -> [String; 4] {
        [
            self.sender.value().to_string(),
            self.request_id.value().to_string(),
            format_due_time(self.due),
            self.payload.clone(),
        ]
    }
}

#[must_use]
pub fn format_due_time(due: DateTime<Utc>) -> String {
    due.format(DUE_TIME_FORMAT).to_string()
}

/// Parses an absolute timestamp; values without an offset are taken as UTC.
#[must_use]
pub fn parse_due_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Actions understood by the schedule command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleAction {
    Add,
    Get,
    Remove,
    List,
}

const SCHEDULE_ACTION_NAMES: &[(ScheduleAction, &str)] = &[
    (ScheduleAction::Add, "add"),
    (ScheduleAction::Get, "get"),
    (ScheduleAction::Remove, "remove"),
    (ScheduleAction::List, "list"),
];

impl ScheduleAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Get => "get",
            Self::Remove => "remove",
            Self::List => "list",
        }
    }
}

impl TryFrom<&str> for ScheduleAction {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        SCHEDULE_ACTION_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(value.trim()))
            .map(|(action, _)| *action)
            .ok_or_else(|| format!("Unknown schedule action: {value}"))
    }
}
