//! Canned questions offered as one-click shortcuts in the widget.

use crate::error::ChatError;

/// Shortcut questions, in display order.
pub const QUICK_ACTIONS: &[&str] = &[
    "How do I mark attendance?",
    "How do I enter marks?",
    "How do I view reports?",
    "How do I manage fees?",
];

/// Look up a quick action by its position.
pub fn quick_action(index: usize) -> Result<&'static str, ChatError> {
    QUICK_ACTIONS
        .get(index)
        .copied()
        .ok_or(ChatError::UnknownQuickAction(index))
}
