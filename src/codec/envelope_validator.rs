//! Minimal structural check for message envelopes.
//!
//! Only the four required fields are inspected. `Payload` may hold any
//! JSON value, including `null`.

use serde_json::Value;

use crate::error::ValidationError;

/// Required envelope keys, checked in this order.
pub const REQUIRED_FIELDS: [&str; 4] = ["Type", "Channel", "Payload", "Timestamp"];

/// Validates the envelope shape of `value`.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `value` is not an object, a required
/// key is absent, `Type`/`Channel` is not a string, or `Timestamp` is not a
/// number.
pub fn validate_envelope(value: &Value) -> Result<(), ValidationError> {
    let Some(obj) = value.as_object() else {
        return Err(ValidationError::new("input", "Message must be an object"));
    };

    if let Some(missing) = REQUIRED_FIELDS.into_iter().find(|k| !obj.contains_key(*k)) {
        return Err(ValidationError::new(
            missing,
            format!("Missing required property: {missing}"),
        ));
    }

    if !obj.get("Type").is_some_and(Value::is_string) {
        return Err(ValidationError::new("Type", "Type must be a string"));
    }
    if !obj.get("Channel").is_some_and(Value::is_string) {
        return Err(ValidationError::new("Channel", "Channel must be a string"));
    }
    if !obj.get("Timestamp").is_some_and(Value::is_number) {
        return Err(ValidationError::new(
            "Timestamp",
            "Timestamp must be a number",
        ));
    }
    Ok(())
}
