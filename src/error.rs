//! Error types for inspection and field editing.
//!
//! None of these reach the host application: every error is recovered where
//! it occurs (a rejected edit restores the field, a vanished entity renders an
//! error label).

use bevy::prelude::Entity;
use thiserror::Error;

use crate::value::InputPattern;

/// A committed field text that could not be turned into a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldParseError {
    #[error("`{text}` does not match the {pattern} pattern")]
    Rejected { text: String, pattern: InputPattern },
    #[error("`{text}` is out of range for this field")]
    OutOfRange { text: String },
}

/// Failure to inspect a target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InspectError {
    #[error("entity {0} does not exist")]
    EntityNotFound(Entity),
}
