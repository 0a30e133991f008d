//! Sensor command codec: loosely shaped input in, canonical [`Command`] out.
//!
//! Accepts a JSON object or a string. Keys are read in PascalCase or
//! camelCase (PascalCase wins), numeric strings are coerced, and `Type` is
//! mapped to its canonical spelling before [`schema::validate`] runs.

use serde_json::{Map, Value};

use super::schema::{self, CommandDraft};
use crate::domain::{Command, CommandKind, MessageId};
use crate::error::ValidationError;

/// Builds a canonical command from a JSON object or string.
///
/// # Errors
///
/// Returns a [`ValidationError`] if a field cannot be coerced, the schema
/// rejects the command, or `input` is neither an object nor a string.
pub fn build(input: &Value) -> Result<Command, ValidationError> {
    match input {
        Value::String(text) => build_text(text),
        Value::Object(obj) => build_object(obj),
        _ => Err(ValidationError::new(
            "input",
            "Unsupported sensor command input",
        )),
    }
}

/// Builds a command from text.
///
/// Text holding a JSON object is built like an object. Anything else
/// becomes a `Custom` command whose `Message` is the raw text; that
/// fallback cannot fail.
///
/// # Errors
///
/// Returns a [`ValidationError`] only when the text is a JSON object that
/// fails coercion or validation.
pub fn build_text(text: &str) -> Result<Command, ValidationError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => build_object(&obj),
        _ => Ok(Command::custom_text(text)),
    }
}

/// Builds a command from a JSON object.
///
/// # Errors
///
/// Returns a [`ValidationError`] on coercion or schema failure.
pub fn build_object(obj: &Map<String, Value>) -> Result<Command, ValidationError> {
    let type_name = match type_field(obj) {
        None => CommandKind::Custom.as_str().to_string(),
        Some(Value::String(name)) => canonical_type(name),
        Some(_) => {
            return Err(ValidationError::new(
                "Type",
                "SensorCommand.Type is required and must be a string",
            ));
        }
    };

    let pin = field(obj, "Pin", "pin")
        .map(|v| coerce_number("Pin", v).and_then(floor_pin))
        .transpose()?;
    let value = field(obj, "Value", "value")
        .map(|v| coerce_number("Value", v))
        .transpose()?;

    let draft = CommandDraft {
        type_name,
        pin,
        value,
        message: string_field(obj, "Message", "message")?,
        id: string_field(obj, "Id", "id")?,
        pin_mode: string_field(obj, "PinMode", "pinMode")?,
    };
    schema::validate(draft)
}

/// Returns one illustrative, schema-valid command for `kind` with a fresh
/// `Id`. Unknown kinds yield the `Custom` sample.
#[must_use]
pub fn create_sample(kind: &str) -> Command {
    let kind = CommandKind::from_name_ignore_case(kind).unwrap_or(CommandKind::Custom);
    sample_for(kind)
}

/// Sample command for a known kind.
#[must_use]
pub fn sample_for(kind: CommandKind) -> Command {
    let base = Command::new(kind).with_id(MessageId::generate(kind.id_prefix()));
    match kind {
        CommandKind::Matrix => base.with_value(1.0),
        CommandKind::PinWrite => base.with_pin(13).with_value(1.0).with_pin_mode("OUTPUT"),
        CommandKind::PinRead => base.with_pin(7).with_pin_mode("INPUT_PULLUP"),
        CommandKind::PwmWrite => base.with_pin(5).with_value(128.0),
        CommandKind::SerialPrint => base.with_message("Hello"),
        CommandKind::SerialLog => base.with_message("Log entry"),
        CommandKind::Custom => base.with_message("custom"),
    }
}

/// Known kinds map to their PascalCase form; anything else passes through.
fn canonical_type(name: &str) -> String {
    CommandKind::from_name_ignore_case(name)
        .map_or_else(|| name.to_string(), |kind| kind.as_str().to_string())
}

/// Reads `Type`, falling back to `type`. An empty string counts as absent.
fn type_field(obj: &Map<String, Value>) -> Option<&Value> {
    let present = |v: &&Value| !v.is_null() && v.as_str() != Some("");
    obj.get("Type")
        .filter(present)
        .or_else(|| obj.get("type").filter(present))
}

/// Reads `pascal`, falling back to `camel`. `null` counts as absent.
fn field<'a>(obj: &'a Map<String, Value>, pascal: &str, camel: &str) -> Option<&'a Value> {
    obj.get(pascal)
        .filter(|v| !v.is_null())
        .or_else(|| obj.get(camel).filter(|v| !v.is_null()))
}

fn string_field(
    obj: &Map<String, Value>,
    pascal: &'static str,
    camel: &str,
) -> Result<Option<String>, ValidationError> {
    match field(obj, pascal, camel) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::new(
            pascal,
            format!("SensorCommand.{pascal} must be a string"),
        )),
    }
}

/// Numbers and numeric strings; NaN and infinities are rejected.
fn coerce_number(name: &'static str, value: &Value) -> Result<f64, ValidationError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError::new(name, format!("SensorCommand.{name} must be a number")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn floor_pin(n: f64) -> Result<i64, ValidationError> {
    let floored = n.floor();
    if floored < i64::MIN as f64 || floored >= i64::MAX as f64 {
        return Err(ValidationError::new(
            "Pin",
            "SensorCommand.Pin is out of range",
        ));
    }
    Ok(floored as i64)
}
