//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction or state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid state transition error.
    pub fn invalid_transition(from: impl std::fmt::Debug, to: impl std::fmt::Debug) -> Self {
        ValidationError::InvalidTransition {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_displays_correctly() {
        let err = ValidationError::empty_field("node_name");
        assert_eq!(format!("{}", err), "Field 'node_name' cannot be empty");
    }

    #[test]
    fn invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("base_url", "missing host");
        assert_eq!(
            format!("{}", err),
            "Field 'base_url' has invalid format: missing host"
        );
    }

    #[test]
    fn invalid_transition_uses_debug_names() {
        #[derive(Debug)]
        enum Light {
            Red,
            Green,
        }

        let err = ValidationError::invalid_transition(Light::Red, Light::Green);
        assert_eq!(format!("{}", err), "Invalid transition from Red to Green");
    }
}
