//! Error types for the assistant.

use campusbot_core::error::CampusbotError;
use campusbot_core::UiPhase;

/// Errors from the chat engine.
///
/// The submission path never returns these: persistence problems degrade
/// silently and empty input is ignored.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid phase transition: {0} -> {1}")]
    InvalidTransition(UiPhase, UiPhase),
    #[error("unknown quick action: {0}")]
    UnknownQuickAction(usize),
    #[error("knowledge base error: {0}")]
    KnowledgeBase(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<CampusbotError> for ChatError {
    fn from(err: CampusbotError) -> Self {
        match err {
            CampusbotError::KnowledgeBase(msg) => ChatError::KnowledgeBase(msg),
            other => ChatError::StorageError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::InvalidTransition(UiPhase::Closed, UiPhase::Minimized);
        assert_eq!(err.to_string(), "invalid phase transition: closed -> minimized");

        let err = ChatError::UnknownQuickAction(9);
        assert_eq!(err.to_string(), "unknown quick action: 9");

        let err = ChatError::KnowledgeBase("no entries".to_string());
        assert_eq!(err.to_string(), "knowledge base error: no entries");

        let err = ChatError::StorageError("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_from_core_knowledge_base_error() {
        let err: ChatError = CampusbotError::KnowledgeBase("entry 2 has no keywords".into()).into();
        assert!(matches!(err, ChatError::KnowledgeBase(_)));
        assert!(err.to_string().contains("entry 2"));
    }

    #[test]
    fn test_from_core_storage_error() {
        let err: ChatError = CampusbotError::Storage("connection lost".into()).into();
        assert!(matches!(err, ChatError::StorageError(_)));
        assert!(err.to_string().contains("connection lost"));
    }

    #[test]
    fn test_from_core_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ChatError = CampusbotError::Io(io).into();
        assert!(matches!(err, ChatError::StorageError(_)));
    }
}
