//! Classification of received frames.

use serde_json::Value;

use super::Envelope;

/// A received text frame, classified before any field extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// JSON object satisfying the envelope rules.
    Envelope(Envelope),
    /// Well-formed JSON that is not an envelope.
    Unrecognized(Value),
    /// Frame that is not JSON at all; delivered as received.
    Raw(String),
}

impl Inbound {
    /// Parses and classifies a raw frame. Never fails: malformed JSON
    /// becomes [`Inbound::Raw`].
    #[must_use]
    pub fn classify(frame: &str) -> Self {
        match serde_json::from_str::<Value>(frame) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::Raw(frame.to_string()),
        }
    }

    /// Classifies an already parsed JSON value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match Envelope::from_value(&value) {
            Ok(envelope) => Self::Envelope(envelope),
            Err(_) => Self::Unrecognized(value),
        }
    }

    /// Returns the envelope, if this frame is one.
    #[must_use]
    pub const fn as_envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Renders the frame as text for logs and consoles.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Envelope(envelope) => serde_json::to_string(envelope).unwrap_or_default(),
            Self::Unrecognized(value) => value.to_string(),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_is_raw() {
        assert_eq!(
            Inbound::classify("{not json"),
            Inbound::Raw("{not json".to_string())
        );
    }

    #[test]
    fn envelope_is_recognized() {
        let frame = r#"{"Type":"x","Channel":"c","Payload":{},"Timestamp":123}"#;
        let inbound = Inbound::classify(frame);
        let Some(env) = inbound.as_envelope() else {
            panic!("expected envelope, got {inbound:?}");
        };
        assert_eq!(env.channel, "c");
    }

    #[test]
    fn other_json_is_unrecognized() {
        let inbound = Inbound::classify(r#"{"hello":"world"}"#);
        assert!(matches!(inbound, Inbound::Unrecognized(_)));
        assert_eq!(inbound.to_text(), r#"{"hello":"world"}"#);

        let scalar = Inbound::classify("42");
        assert_eq!(scalar, Inbound::Unrecognized(serde_json::json!(42)));
    }
}
