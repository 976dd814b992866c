#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON rendering of one command outcome, one object per output line.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProtocolEnvelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    pub t: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Box<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<Box<ProtocolError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProtocolError {
    pub code: String,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Box<Value>>,
}

impl ProtocolEnvelope {
    #[must_use]
    pub fn success(cmd: Option<String>, rid: Option<String>, data: Value) -> Self {
        Self {
            ok: true,
            cmd,
            rid,
            t: Utc::now().timestamp_millis(),
            ms: None,
            d: Some(Box::new(data)),
            err: None,
            fix: None,
        }
    }

    #[must_use]
    pub fn error(cmd: Option<String>, rid: Option<String>, code: String, msg: String) -> Self {
        Self {
            ok: false,
            cmd,
            rid,
            t: Utc::now().timestamp_millis(),
            ms: None,
            d: None,
            err: Some(Box::new(ProtocolError {
                code,
                msg,
                ctx: None,
            })),
            fix: None,
        }
    }

    #[must_use]
    pub fn with_ms(mut self, ms: u64) -> Self {
        self.ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_fix(mut self, fix: String) -> Self {
        self.fix = Some(fix);
        self
    }

    #[must_use]
    pub fn with_ctx(mut self, ctx: Value) -> Self {
        if let Some(ref mut err) = self.err {
            err.ctx = Some(Box::new(ctx));
        }
        self
    }
}
