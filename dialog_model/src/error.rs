//! Validation failures raised before anything reaches persistence.

use thiserror::Error;

use crate::SpeakerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("script name {0:?} is not a valid script identifier")]
    InvalidScriptName(String),

    #[error("color {0:?} is not a #RRGGBB or #RRGGBBAA hex string")]
    InvalidColor(String),

    #[error("speaker {0} is not registered")]
    UnknownSpeaker(SpeakerId),

    #[error("label must not be empty")]
    EmptyLabel,

    #[error("label {0:?} already exists in this dialog")]
    DuplicateLabel(String),
}

/// Check that a required text field carries something other than whitespace.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

/// Script names end up as identifiers in generated scripts.
pub fn validate_script_name(value: &str) -> Result<(), ValidationError> {
    require_non_empty("script_name", value)?;

    let mut chars = value.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::InvalidScriptName(value.to_string()))
    }
}
