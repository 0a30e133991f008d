//! Wire-level envelopes.
//!
//! [`Envelope`] is the generic hub message (telemetry, replies) with the
//! four required fields `Type`, `Channel`, `Payload` and `Timestamp`.
//! [`OutboundEnvelope`] is the shape the dashboard sends to address a
//! command or a note to a specific service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::{Command, MessageId};
use crate::codec::envelope_validator;
use crate::error::ValidationError;

/// Schema tag carried in `Meta` of command envelopes.
pub const COMMAND_SCHEMA: &str = "sensor-command:v1";

/// Generic hub message envelope.
///
/// `Payload` is opaque: any JSON value is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    /// Message type.
    #[serde(rename = "Type")]
    pub msg_type: String,
    /// Logical channel.
    pub channel: String,
    /// Opaque payload.
    pub payload: Value,
    /// Numeric timestamp as sent by the producer.
    pub timestamp: Number,
    /// Recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Message identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Identifier of the message this one relates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Envelope {
    /// Validates `value` and builds a typed envelope from it.
    ///
    /// Optional string fields holding a non-string are dropped; only the
    /// four required fields are type-checked.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the required fields are missing or
    /// have the wrong type.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        envelope_validator::validate_envelope(value)?;
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::new("input", "Message must be an object"))?;

        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        let msg_type = text("Type")
            .ok_or_else(|| ValidationError::new("Type", "Type must be a string"))?;
        let channel = text("Channel")
            .ok_or_else(|| ValidationError::new("Channel", "Channel must be a string"))?;
        let timestamp = match obj.get("Timestamp") {
            Some(Value::Number(n)) => n.clone(),
            _ => return Err(ValidationError::new("Timestamp", "Timestamp must be a number")),
        };

        Ok(Self {
            msg_type,
            channel,
            payload: obj.get("Payload").cloned().unwrap_or(Value::Null),
            timestamp,
            to: text("To"),
            from: text("From"),
            topic: text("Topic"),
            meta: obj.get("Meta").filter(|m| !m.is_null()).cloned(),
            id: text("Id"),
            correlation_id: text("CorrelationId"),
        })
    }

    /// Finds the measurement whose `Key` equals `key` exactly in
    /// `Payload.Measurements`.
    #[must_use]
    pub fn measurement(&self, key: &str) -> Option<&Map<String, Value>> {
        self.measurements()?
            .iter()
            .filter_map(Value::as_object)
            .find(|m| m.get("Key").and_then(Value::as_str) == Some(key))
    }

    /// `Payload.Measurements` if the payload follows the sensor shape.
    #[must_use]
    pub fn measurements(&self) -> Option<&Vec<Value>> {
        self.payload.get("Measurements")?.as_array()
    }
}

/// Envelope the dashboard sends to a named recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundEnvelope {
    /// `Command`, `Information`, ...
    #[serde(rename = "Type")]
    pub msg_type: String,
    /// Recipient service or sensor.
    pub to: String,
    /// Sending dashboard.
    pub from: String,
    /// Message identifier.
    pub id: String,
    /// Correlation identifier for replies.
    pub correlation_id: String,
    /// Schema metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Message body.
    pub payload: Value,
}

impl OutboundEnvelope {
    /// Wraps a validated command addressed to `to`.
    ///
    /// `Id` is the command's own id when it has one.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the command cannot be encoded.
    pub fn command(
        command: &Command,
        to: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            msg_type: "Command".to_string(),
            to: to.into(),
            from: from.into(),
            id: command.id_or_generate(),
            correlation_id: MessageId::generate("corr").into_string(),
            meta: Some(serde_json::json!({ "schema": COMMAND_SCHEMA })),
            payload: serde_json::to_value(command)?,
        })
    }

    /// A plain-text note for a service: `Payload = { "Information": text }`.
    #[must_use]
    pub fn information(to: impl Into<String>, from: impl Into<String>, text: &str) -> Self {
        Self {
            msg_type: "Information".to_string(),
            to: to.into(),
            from: from.into(),
            id: MessageId::generate("cmd").into_string(),
            correlation_id: MessageId::generate("corr").into_string(),
            meta: None,
            payload: serde_json::json!({ "Information": text }),
        }
    }

    /// A dashboard-to-dashboard note: `Type = "generic"`, schema `Meta`,
    /// `Payload = { "Information": text }`.
    #[must_use]
    pub fn generic(to: impl Into<String>, from: impl Into<String>, text: &str) -> Self {
        Self {
            msg_type: "generic".to_string(),
            meta: Some(serde_json::json!({ "schema": COMMAND_SCHEMA })),
            ..Self::information(to, from, text)
        }
    }
}
