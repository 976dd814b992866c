use crate::codec;
use crate::error::{get_error_info, BridgeError, ErrorKind};
use crate::protocol_envelope::ProtocolEnvelope;
use crate::types::{RequestId, ResultSet};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&BridgeError> for OutcomeError {
    fn from(error: &BridgeError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success(ResultSet),
    Failure(OutcomeError),
}

/// What the dispatcher reports back for one command.
///
/// A failure never carries result entries; whatever the handler wrote before
/// failing is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    command: String,
    request_id: RequestId,
    status: OutcomeStatus,
    elapsed_ms: u64,
}

impl CommandOutcome {
    #[must_use]
    pub fn success(command: impl Into<String>, request_id: RequestId, result: ResultSet) -> Self {
        Self {
            command: command.into(),
            request_id,
            status: OutcomeStatus::Success(result),
            elapsed_ms: 0,
        }
    }

    #[must_use]
    pub fn failure(command: impl Into<String>, request_id: RequestId, error: &BridgeError) -> Self {
        Self {
            command: command.into(),
            request_id,
            status: OutcomeStatus::Failure(OutcomeError::from(error)),
            elapsed_ms: 0,
        }
    }

    #[must_use]
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success(_))
    }

    #[must_use]
    pub const fn result(&self) -> Option<&ResultSet> {
        match &self.status {
            OutcomeStatus::Success(result) => Some(result),
            OutcomeStatus::Failure(_) => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&OutcomeError> {
        match &self.status {
            OutcomeStatus::Success(_) => None,
            OutcomeStatus::Failure(error) => Some(error),
        }
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|error| error.kind)
    }

    /// Text rendering: `command,<name>,identifier,<rid>,success,<bool>,...`.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut pairs = vec![
            ("command", self.command.as_str()),
            ("identifier", self.request_id.value()),
        ];
        match &self.status {
            OutcomeStatus::Success(result) => {
                pairs.push(("success", "true"));
                pairs.extend(result.iter());
            }
            OutcomeStatus::Failure(error) => {
                pairs.push(("success", "false"));
                pairs.push(("error", error.kind.as_str()));
                pairs.push(("message", error.message.as_str()));
            }
        }
        codec::encode_key_value(pairs)
    }

    #[must_use]
    pub fn to_envelope(&self) -> ProtocolEnvelope {
        let command = Some(self.command.clone()).filter(|name| !name.is_empty());
        let rid = Some(self.request_id.value().to_string()).filter(|rid| !rid.is_empty());

        let envelope = match &self.status {
            OutcomeStatus::Success(result) => {
                let data = result
                    .iter()
                    .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                    .collect::<Map<_, _>>();
                ProtocolEnvelope::success(command, rid, Value::Object(data))
            }
            OutcomeStatus::Failure(error) => {
                let code = error.kind.as_str();
                let envelope =
                    ProtocolEnvelope::error(command, rid, code.to_string(), error.message.clone());
                match get_error_info(code) {
                    Some((description, fix)) => envelope
                        .with_fix(fix.to_string())
                        .with_ctx(json!({ "description": description })),
                    None => envelope,
                }
            }
        };
        envelope.with_ms(self.elapsed_ms)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn given_success_when_encoding_then_result_pairs_follow_the_header() {
        let mut result = ResultSet::new();
        result.insert("data", "alice,r1");
        let outcome = CommandOutcome::success("at", RequestId::new("r1"), result);

        assert_eq!(
            outcome.encode(),
            "command,at,identifier,r1,success,true,data,\"alice,r1\""
        );
    }

    #[test]
    fn given_failure_when_encoding_then_kind_and_message_are_reported() {
        let error = BridgeError::NotFound("no scheduled entry at index 3".to_string());
        let outcome = CommandOutcome::failure("at", RequestId::new("r2"), &error);

        let decoded = codec::decode_key_value(&outcome.encode());

        assert_eq!(
            decoded,
            vec![
                ("command".to_string(), "at".to_string()),
                ("identifier".to_string(), "r2".to_string()),
                ("success".to_string(), "false".to_string()),
                ("error".to_string(), "NOT_FOUND".to_string()),
                (
                    "message".to_string(),
                    "Not found: no scheduled entry at index 3".to_string()
                ),
            ]
        );
        assert!(outcome.result().is_none());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn given_failure_when_rendering_envelope_then_fix_hint_is_attached() {
        let error = BridgeError::QuotaExceeded("full".to_string());
        let outcome = CommandOutcome::failure("at", RequestId::new("r3"), &error).with_elapsed_ms(7);

        let rendered = serde_json::to_value(outcome.to_envelope()).unwrap();

        assert_eq!(rendered["ok"], json!(false));
        assert_eq!(rendered["rid"], json!("r3"));
        assert_eq!(rendered["ms"], json!(7));
        assert_eq!(rendered["err"]["code"], json!("QUOTA_EXCEEDED"));
        assert!(rendered["fix"].as_str().unwrap().contains("schedules"));
        assert_eq!(
            rendered["err"]["ctx"]["description"],
            json!(get_error_info("QUOTA_EXCEEDED").unwrap().0)
        );
    }

    #[test]
    fn given_success_when_rendering_envelope_then_result_becomes_data_object() {
        let mut result = ResultSet::new();
        result.insert("data", "x");
        let outcome = CommandOutcome::success("at", RequestId::default(), result);

        let rendered = serde_json::to_value(outcome.to_envelope()).unwrap();

        assert_eq!(rendered["d"], json!({"data": "x"}));
        assert!(rendered.get("rid").is_none());
    }
}
