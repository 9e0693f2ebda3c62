use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who authored a message in the conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Typed (or quick-action) input from the person using the widget.
    User,
    /// A reply produced by the response resolver.
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

impl std::str::FromStr for Sender {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            _ => Err(format!("Unknown sender: {}", s)),
        }
    }
}

/// Visibility of the floating assistant widget.
///
/// Never persisted: every session starts `Closed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiPhase {
    /// Only the launcher button is visible.
    #[default]
    Closed,
    /// The full chat window is visible.
    Open,
    /// The chat window is collapsed to its header bar.
    Minimized,
}

impl fmt::Display for UiPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiPhase::Closed => write!(f, "closed"),
            UiPhase::Open => write!(f, "open"),
            UiPhase::Minimized => write!(f, "minimized"),
        }
    }
}

impl UiPhase {
    /// Returns whether a transition from `self` to `target` is allowed.
    pub fn can_transition_to(&self, target: &UiPhase) -> bool {
        matches!(
            (self, target),
            (UiPhase::Closed, UiPhase::Open)
                | (UiPhase::Open, UiPhase::Minimized)
                | (UiPhase::Minimized, UiPhase::Open)
                | (UiPhase::Open, UiPhase::Closed)
                | (UiPhase::Minimized, UiPhase::Closed)
        )
    }
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Opaque, stable identifier of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// =============================================================================
// Message
// =============================================================================

/// One entry in the append-only conversation log.
///
/// `timestamp` is fixed at creation and serialized as RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Display text. Embedded newlines are preserved verbatim.
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }
}
