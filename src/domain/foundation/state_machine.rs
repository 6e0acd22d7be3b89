//! State machine trait for lifecycle enums.
//!
//! Gives lifecycle enums (currently the connection lifecycle) one shared
//! way to declare and check their legal transitions.

use super::ValidationError;

/// Trait for enums that represent a state machine.
///
/// Implementors declare the legal edges once and get checked
/// transitions for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for ConnectionState {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Idle => vec![Connecting],
///             Connecting => vec![Open, Closed, Idle],
///             // ... etc
///         }
///     }
/// }
///
/// let next = ConnectionState::Idle.transition_to(ConnectionState::Connecting)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from the current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if a transition from self to target is legal.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs a transition with validation, returning an error if illegal.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_transition(self, target))
        }
    }

    /// Checks if the current state has no outgoing transitions.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Shut,
        Ajar,
        Bricked,
    }

    impl StateMachine for Door {
        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Door::Shut => vec![Door::Ajar, Door::Bricked],
                Door::Ajar => vec![Door::Shut],
                Door::Bricked => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_listed_target() {
        assert_eq!(Door::Shut.transition_to(Door::Ajar), Ok(Door::Ajar));
    }

    #[test]
    fn transition_to_fails_for_unlisted_target() {
        let err = Door::Ajar.transition_to(Door::Bricked).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidTransition {
                from: "Ajar".to_string(),
                to: "Bricked".to_string(),
            }
        );
    }

    #[test]
    fn can_transition_to_defaults_to_valid_transitions() {
        assert!(Door::Shut.can_transition_to(&Door::Bricked));
        assert!(!Door::Bricked.can_transition_to(&Door::Shut));
    }

    #[test]
    fn is_terminal_only_without_outgoing_edges() {
        assert!(Door::Bricked.is_terminal());
        assert!(!Door::Shut.is_terminal());
    }
}
