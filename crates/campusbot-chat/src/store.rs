//! Conversation persistence.
//!
//! The full message log is mirrored as a JSON array under one fixed key.
//! Both directions fail soft: unreadable history loads as `None` and write
//! failures are logged and dropped, leaving the in-memory log authoritative.

use campusbot_core::kv::KeyValueStore;
use campusbot_core::Message;
use tracing::warn;

/// Durable home for the conversation log.
pub trait ConversationStore: Send + Sync {
    /// Read the previously saved log, or `None` if absent or unreadable.
    fn load(&self) -> Option<Vec<Message>>;
    /// Overwrite the saved log with `messages`.
    fn save(&self, messages: &[Message]);
}

/// [`ConversationStore`] over any [`KeyValueStore`].
pub struct KeyValueConversationStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> KeyValueConversationStore<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}

impl<S: KeyValueStore> ConversationStore for KeyValueConversationStore<S> {
    fn load(&self) -> Option<Vec<Message>> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read conversation history");
                return None;
            }
        };

        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => Some(messages),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable conversation history");
                None
            }
        }
    }

    fn save(&self, messages: &[Message]) {
        let json = match serde_json::to_string(messages) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize conversation history");
                return;
            }
        };

        if let Err(e) = self.backend.set(&self.key, &json) {
            warn!(key = %self.key, error = %e, "Failed to persist conversation history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusbot_core::kv::MemoryKeyValueStore;
    use campusbot_core::Sender;
    use std::sync::Arc;

    const KEY: &str = "chatbot_messages";

    fn store() -> (Arc<MemoryKeyValueStore>, KeyValueConversationStore<Arc<MemoryKeyValueStore>>) {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let store = KeyValueConversationStore::new(Arc::clone(&backend), KEY);
        (backend, store)
    }

    #[test]
    fn test_load_absent() {
        let (_, store) = store();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load_preserves_everything() {
        let (_, store) = store();
        let messages = vec![
            Message::bot("Hello!"),
            Message::user("How do I mark attendance?"),
            Message::bot("Step 1\nStep 2"),
        ];
        store.save(&messages);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, messages);
    }

    #[test]
    fn test_save_of_load_is_idempotent() {
        let (backend, store) = store();
        store.save(&[Message::user("one"), Message::bot("two")]);
        let first = backend.get(KEY).unwrap().unwrap();

        let loaded = store.load().unwrap();
        store.save(&loaded);
        let second = backend.get(KEY).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(store.load().unwrap(), loaded);
    }

    #[test]
    fn test_save_overwrites() {
        let (_, store) = store();
        store.save(&[Message::user("a"), Message::bot("b")]);
        store.save(&[Message::user("c")]);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "c");
    }

    #[test]
    fn test_serialized_shape() {
        let (backend, store) = store();
        store.save(&[Message::user("hi")]);
        let raw = backend.get(KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value[0];
        assert_eq!(first["sender"], "user");
        assert_eq!(first["text"], "hi");
        assert!(first["id"].is_string());
        assert!(first["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_load_corrupt_json_is_absent() {
        let (backend, store) = store();
        backend.set(KEY, "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_wrong_shape_is_absent() {
        let (backend, store) = store();
        backend
            .set(KEY, r#"[{"id":"x","text":"hi","sender":"robot","timestamp":"yesterday"}]"#)
            .unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_handwritten_history() {
        let (backend, store) = store();
        backend
            .set(
                KEY,
                r#"[{"id":"550e8400-e29b-41d4-a716-446655440000","text":"hi","sender":"user","timestamp":"2024-03-01T10:15:30.250Z"}]"#,
            )
            .unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].sender, Sender::User);
        assert_eq!(loaded[0].timestamp.timestamp_millis(), 1_709_288_130_250);
    }

    #[test]
    fn test_save_failure_is_silent() {
        let (backend, store) = store();
        store.save(&[Message::user("kept")]);
        backend.set_fail_writes(true);

        store.save(&[Message::user("kept"), Message::bot("lost")]);

        backend.set_fail_writes(false);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "kept");
    }

    #[test]
    fn test_key_is_configurable() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let a = KeyValueConversationStore::new(Arc::clone(&backend), "a");
        let b = KeyValueConversationStore::new(Arc::clone(&backend), "b");
        a.save(&[Message::user("only in a")]);
        assert!(b.load().is_none());
        assert_eq!(a.key(), "a");
    }
}
