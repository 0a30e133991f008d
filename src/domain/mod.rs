//! Domain layer: commands, envelopes, inbound frames and identifiers.
//!
//! Everything here is a plain value: constructed, serialized and dropped.
//! Validation rules live in [`crate::codec`].

pub mod command;
pub mod command_kind;
pub mod envelope;
pub mod inbound;
pub mod message_id;
pub mod telemetry;

pub use command::Command;
pub use command_kind::CommandKind;
pub use envelope::{COMMAND_SCHEMA, Envelope, OutboundEnvelope};
pub use inbound::Inbound;
pub use message_id::MessageId;
pub use telemetry::Telemetry;
