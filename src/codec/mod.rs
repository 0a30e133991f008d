//! Codec layer: command schema, command normalization and envelope checks.
//!
//! All functions here are pure; failures are [`crate::error::ValidationError`]
//! values returned to the caller.

pub mod command_codec;
pub mod envelope_validator;
pub mod schema;

pub use command_codec::{build, build_text, create_sample};
pub use envelope_validator::validate_envelope;
pub use schema::{CommandDraft, supported_kinds};
