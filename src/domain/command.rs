//! Canonical sensor command.
//!
//! A [`Command`] is what the codec produces after normalization and
//! schema validation. It serializes with the PascalCase keys the hub
//! expects; absent fields are omitted.

use serde::{Deserialize, Serialize, Serializer};

use super::CommandKind;
use super::MessageId;

/// A validated instruction for a sensor/actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Command {
    /// Command kind.
    #[serde(rename = "Type")]
    pub kind: CommandKind,
    /// Target pin (floored integer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<i64>,
    /// Numeric value; constrained per kind.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_value"
    )]
    pub value: Option<f64>,
    /// Text for serial commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Caller-supplied or generated identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-form pin mode (`INPUT`, `OUTPUT`, `INPUT_PULLUP`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_mode: Option<String>,
}

impl Command {
    /// Creates a command of the given kind with every optional field unset.
    #[must_use]
    pub const fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            pin: None,
            value: None,
            message: None,
            id: None,
            pin_mode: None,
        }
    }

    /// A `Custom` command carrying raw text.
    #[must_use]
    pub fn custom_text(text: impl Into<String>) -> Self {
        Self::new(CommandKind::Custom).with_message(text)
    }

    /// Sets `Pin`.
    #[must_use]
    pub const fn with_pin(mut self, pin: i64) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Sets `Value`.
    #[must_use]
    pub const fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets `Message`.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets `Id`.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets `PinMode`.
    #[must_use]
    pub fn with_pin_mode(mut self, pin_mode: impl Into<String>) -> Self {
        self.pin_mode = Some(pin_mode.into());
        self
    }

    /// Returns the command's `Id`, generating a `cmd-...` one if unset.
    #[must_use]
    pub fn id_or_generate(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| MessageId::generate("cmd").into_string())
    }
}

/// Integral values go out as JSON integers (`1`, not `1.0`).
#[allow(clippy::ref_option)]
fn serialize_value<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    const I64_LIMIT: f64 = 9_007_199_254_740_992.0;
    match *value {
        #[allow(clippy::cast_possible_truncation)]
        Some(v) if v.fract() == 0.0 && v.abs() < I64_LIMIT => serializer.serialize_i64(v as i64),
        Some(v) => serializer.serialize_f64(v),
        None => serializer.serialize_none(),
    }
}
