//! The closed set of sensor command kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of a sensor command (`Type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Toggle an LED matrix on (1) or off (0).
    Matrix,
    /// Digital write of 0/1 to a pin.
    PinWrite,
    /// Digital read of a pin.
    PinRead,
    /// PWM duty cycle (0–255) on a pin.
    PwmWrite,
    /// Print a message on the device's serial port.
    SerialPrint,
    /// Append a message to the device's serial log.
    SerialLog,
    /// Free-form command, no field constraints.
    Custom,
}

impl CommandKind {
    /// All kinds in the order shown to users.
    pub const ALL: [Self; 7] = [
        Self::Matrix,
        Self::PinWrite,
        Self::PinRead,
        Self::PwmWrite,
        Self::SerialPrint,
        Self::SerialLog,
        Self::Custom,
    ];

    /// Canonical PascalCase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matrix => "Matrix",
            Self::PinWrite => "PinWrite",
            Self::PinRead => "PinRead",
            Self::PwmWrite => "PwmWrite",
            Self::SerialPrint => "SerialPrint",
            Self::SerialLog => "SerialLog",
            Self::Custom => "Custom",
        }
    }

    /// Maps any casing of a kind name to its canonical form.
    ///
    /// Returns `None` for names outside the supported set.
    #[must_use]
    pub fn from_name_ignore_case(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_ascii_lowercase() == lowered)
    }

    /// Prefix used for generated sample identifiers.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Matrix => "m",
            Self::PinWrite => "p",
            Self::PinRead => "r",
            Self::PwmWrite => "w",
            Self::SerialPrint => "s",
            Self::SerialLog => "l",
            Self::Custom => "c",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = String;

    /// Case-sensitive parse of the canonical name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unsupported command kind: {s}"))
    }
}
