//! Sensor command schema: supported kinds and per-kind field rules.
//!
//! | Kind                   | Required                         |
//! |------------------------|----------------------------------|
//! | `Matrix`               | `Value` ∈ {0, 1}                 |
//! | `PinWrite`             | `Pin`, `Value` ∈ {0, 1}          |
//! | `PinRead`              | `Pin`                            |
//! | `PwmWrite`             | `Pin`, `Value` ∈ [0, 255]        |
//! | `SerialPrint`/`SerialLog` | `Message`                     |
//! | `Custom`               | nothing                          |

use crate::domain::{Command, CommandKind};
use crate::error::ValidationError;

/// Normalized but not yet validated command fields.
///
/// Produced by the codec; `type_name` is still a free string so that an
/// unsupported kind can be reported with its original spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandDraft {
    /// Canonicalized `Type` (or the input unchanged if unknown).
    pub type_name: String,
    /// Floored pin number.
    pub pin: Option<i64>,
    /// Numeric value.
    pub value: Option<f64>,
    /// Text for serial commands.
    pub message: Option<String>,
    /// Caller-supplied identifier.
    pub id: Option<String>,
    /// Free-form pin mode.
    pub pin_mode: Option<String>,
}

/// Supported kind names in display order.
#[must_use]
pub fn supported_kinds() -> [&'static str; 7] {
    CommandKind::ALL.map(CommandKind::as_str)
}

/// Validates a draft and converts it into a canonical [`Command`].
///
/// `Type` matching is case-sensitive here; casing is normalized upstream
/// by the codec.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the offending field when `Type` is
/// empty or unsupported, or when a per-kind rule is violated.
pub fn validate(draft: CommandDraft) -> Result<Command, ValidationError> {
    if draft.type_name.is_empty() {
        return Err(ValidationError::new(
            "Type",
            "SensorCommand.Type is required and must be a string",
        ));
    }
    let kind: CommandKind = draft.type_name.parse().map_err(|_| {
        ValidationError::new(
            "Type",
            format!("Unsupported SensorCommand.Type: {}", draft.type_name),
        )
    })?;

    let command = Command {
        kind,
        pin: draft.pin,
        value: draft.value,
        message: draft.message,
        id: draft.id,
        pin_mode: draft.pin_mode,
    };
    check(&command)?;
    Ok(command)
}

/// Checks an already typed command against its kind's rules.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `Value` is not finite or a per-kind
/// rule is violated.
pub fn check(command: &Command) -> Result<(), ValidationError> {
    if let Some(value) = command.value
        && !value.is_finite()
    {
        return Err(ValidationError::new(
            "Value",
            "SensorCommand.Value must be a finite number",
        ));
    }

    let kind = command.kind;
    match kind {
        CommandKind::Matrix => require_binary(kind, command.value),
        CommandKind::PinWrite => {
            require_pin(kind, command.pin)?;
            require_binary(kind, command.value)
        }
        CommandKind::PinRead => require_pin(kind, command.pin),
        CommandKind::PwmWrite => {
            require_pin(kind, command.pin)?;
            match command.value {
                Some(v) if (0.0..=255.0).contains(&v) => Ok(()),
                _ => Err(ValidationError::new(
                    "Value",
                    "PwmWrite.Value must be between 0 and 255",
                )),
            }
        }
        CommandKind::SerialPrint | CommandKind::SerialLog => match command.message {
            Some(_) => Ok(()),
            None => Err(ValidationError::new(
                "Message",
                format!("{kind} requires Message"),
            )),
        },
        CommandKind::Custom => Ok(()),
    }
}

fn require_pin(kind: CommandKind, pin: Option<i64>) -> Result<(), ValidationError> {
    pin.map(|_| ())
        .ok_or_else(|| ValidationError::new("Pin", format!("{kind} requires Pin")))
}

fn require_binary(kind: CommandKind, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v == 0.0 || v == 1.0 => Ok(()),
        _ => Err(ValidationError::new(
            "Value",
            format!("{kind}.Value must be 0 or 1"),
        )),
    }
}
