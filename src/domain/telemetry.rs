//! Sensor telemetry extracted from envelopes.
//!
//! Telemetry producers put `{Key, Value}` pairs in `Payload.Measurements`.
//! Keys are matched case-insensitively; this is a consumer convention, the
//! envelope validator does not enforce it.

use serde_json::Value;

use super::Envelope;

/// The readings the dashboard displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    /// `temperature` measurement.
    pub temperature: Option<Value>,
    /// `humidity` measurement.
    pub humidity: Option<Value>,
    /// `pressure` measurement.
    pub pressure: Option<Value>,
}

impl Telemetry {
    /// Extracts the known readings. Returns `None` when the payload has no
    /// measurement list or none of the known keys.
    #[must_use]
    pub fn from_envelope(envelope: &Envelope) -> Option<Self> {
        let measurements = envelope.measurements()?;
        let find = |key: &str| {
            measurements
                .iter()
                .filter_map(Value::as_object)
                .find(|m| {
                    m.get("Key")
                        .map(key_text)
                        .is_some_and(|k| k.eq_ignore_ascii_case(key))
                })
                .and_then(|m| m.get("Value").cloned())
        };
        let telemetry = Self {
            temperature: find("temperature"),
            humidity: find("humidity"),
            pressure: find("pressure"),
        };
        telemetry.has_readings().then_some(telemetry)
    }

    /// `true` if at least one reading is present.
    #[must_use]
    pub const fn has_readings(&self) -> bool {
        self.temperature.is_some() || self.humidity.is_some() || self.pressure.is_some()
    }

    /// One-line summary, e.g. `T: 21.5 | H: 40`.
    #[must_use]
    pub fn summary(&self) -> String {
        [
            ("T", &self.temperature),
            ("H", &self.humidity),
            ("P", &self.pressure),
        ]
        .into_iter()
        .filter_map(|(label, reading)| {
            reading
                .as_ref()
                .map(|v| format!("{label}: {}", key_text(v)))
        })
        .collect::<Vec<_>>()
        .join(" | ")
    }
}

/// Strings without quotes, everything else as JSON text.
fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
