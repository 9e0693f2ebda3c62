//! Widget phase state machine.
//!
//! Closed -> Open, Open <-> Minimized, Open/Minimized -> Closed.
//! Phase changes never touch the message log.

use campusbot_core::UiPhase;

use crate::error::ChatError;

/// Validate that a phase transition is allowed.
pub fn validate_transition(from: UiPhase, to: UiPhase) -> Result<(), ChatError> {
    if from.can_transition_to(&to) {
        Ok(())
    } else {
        Err(ChatError::InvalidTransition(from, to))
    }
}

/// Target of the minimize toggle from `from`, if the toggle applies.
pub fn toggle_target(from: UiPhase) -> Option<UiPhase> {
    match from {
        UiPhase::Open => Some(UiPhase::Minimized),
        UiPhase::Minimized => Some(UiPhase::Open),
        UiPhase::Closed => None,
    }
}
