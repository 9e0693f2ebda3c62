//! Campus assistant chat engine.
//!
//! Rule-based response resolution over a curated knowledge base, persisted
//! conversation history, and the session controller that drives the floating
//! chat widget.

pub mod error;
pub mod knowledge;
pub mod phase;
pub mod quick_actions;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod store;

pub use error::ChatError;
pub use knowledge::{KnowledgeBase, KnowledgeEntry, FALLBACK_RESPONSE};
pub use quick_actions::{quick_action, QUICK_ACTIONS};
pub use resolver::{
    ChoiceSource, FixedChoice, Resolution, ResponseResolver, ThreadRngChoice, GRATITUDE_RESPONSE,
    GREETINGS,
};
pub use scheduler::{ManualScheduler, ReplyScheduler, ReplyTask, TaskId, TokioScheduler};
pub use session::{ConversationSnapshot, SessionController, DEFAULT_REPLY_DELAY};
pub use store::{ConversationStore, KeyValueConversationStore};
