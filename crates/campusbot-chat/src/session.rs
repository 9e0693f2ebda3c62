//! Session controller: owns the widget phase, the message log and pending
//! replies, and wires the resolver, store and scheduler together.
//!
//! Submission appends the user message immediately, then schedules the bot
//! reply after a single fixed delay. Every change to the log is mirrored to
//! the [`ConversationStore`] and published to subscribers as a
//! [`ConversationSnapshot`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use campusbot_core::{Message, UiPhase};

use crate::error::ChatError;
use crate::phase::{toggle_target, validate_transition};
use crate::quick_actions::quick_action;
use crate::resolver::{ResponseResolver, GREETINGS};
use crate::scheduler::{ReplyScheduler, ReplyTask, TaskId};
use crate::store::ConversationStore;

/// Delay before each bot reply unless configured otherwise.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(800);

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    pub phase: UiPhase,
    pub messages: Vec<Message>,
    /// True while at least one reply is scheduled but not yet appended.
    pub pending_reply: bool,
    /// Current contents of the input box.
    pub draft: String,
}

// =============================================================================
// Shared state
// =============================================================================

struct SessionState {
    phase: UiPhase,
    messages: Vec<Message>,
    draft: String,
    /// Outstanding replies keyed by ticket. The scheduler id is filled in
    /// once `schedule` returns.
    in_flight: HashMap<u64, Option<TaskId>>,
    next_ticket: u64,
    shut_down: bool,
}

impl SessionState {
    fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            phase: self.phase,
            messages: self.messages.clone(),
            pending_reply: !self.in_flight.is_empty(),
            draft: self.draft.clone(),
        }
    }
}

struct Shared {
    state: Mutex<SessionState>,
    resolver: ResponseResolver,
    store: Arc<dyn ConversationStore>,
    snapshots: watch::Sender<ConversationSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SessionState) {
        self.snapshots.send_replace(state.snapshot());
    }

    fn deliver_reply(&self, ticket: u64, input: &str) {
        let mut state = self.lock();
        if state.in_flight.remove(&ticket).is_none() {
            debug!(ticket, "Discarding reply for a torn-down session");
            return;
        }

        let reply = self.resolver.resolve(input);
        state.messages.push(Message::bot(reply));
        self.store.save(&state.messages);
        debug!(
            ticket,
            messages = state.messages.len(),
            pending = state.in_flight.len(),
            "Bot reply appended"
        );
        self.publish(&state);
    }
}

// =============================================================================
// SessionController
// =============================================================================

/// One widget lifetime, from mount (possibly rehydrated) to teardown.
///
/// Dropping the controller cancels every pending reply.
pub struct SessionController {
    shared: Arc<Shared>,
    scheduler: Arc<dyn ReplyScheduler>,
    reply_delay: Duration,
}

impl SessionController {
    /// Create a session, restoring history from `store` or seeding a greeting.
    ///
    /// The phase always starts `Closed`.
    pub fn new(
        resolver: ResponseResolver,
        store: Arc<dyn ConversationStore>,
        scheduler: Arc<dyn ReplyScheduler>,
        reply_delay: Duration,
    ) -> Self {
        let messages = match store.load() {
            Some(messages) if !messages.is_empty() => {
                info!(count = messages.len(), "Restored conversation history");
                messages
            }
            _ => {
                info!("Starting a fresh conversation");
                let seeded = vec![Message::bot(GREETINGS[0])];
                store.save(&seeded);
                seeded
            }
        };

        let state = SessionState {
            phase: UiPhase::Closed,
            messages,
            draft: String::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
            shut_down: false,
        };
        let (snapshots, _) = watch::channel(state.snapshot());

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                resolver,
                store,
                snapshots,
            }),
            scheduler,
            reply_delay,
        }
    }

    // -----------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------

    pub fn phase(&self) -> UiPhase {
        self.shared.lock().phase
    }

    pub fn messages(&self) -> Vec<Message> {
        self.shared.lock().messages.clone()
    }

    pub fn pending_reply(&self) -> bool {
        !self.shared.lock().in_flight.is_empty()
    }

    pub fn draft(&self) -> String {
        self.shared.lock().draft.clone()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.shared.lock().snapshot()
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn reply_delay(&self) -> Duration {
        self.reply_delay
    }

    // -----------------------------------------------------------------
    // Phase
    // -----------------------------------------------------------------

    /// Move to `target`, rejecting transitions the state machine forbids.
    pub fn transition(&self, target: UiPhase) -> Result<UiPhase, ChatError> {
        let mut state = self.shared.lock();
        validate_transition(state.phase, target)?;
        debug!("Widget phase: {} -> {}", state.phase, target);
        state.phase = target;
        self.shared.publish(&state);
        Ok(target)
    }

    /// Open the widget. No-op unless it is closed.
    pub fn open(&self) -> UiPhase {
        self.transition_or_stay(UiPhase::Open)
    }

    /// Switch between open and minimized. No-op while closed.
    pub fn toggle_minimize(&self) -> UiPhase {
        let current = self.phase();
        match toggle_target(current) {
            Some(target) => self.transition_or_stay(target),
            None => current,
        }
    }

    /// Close the widget from either open or minimized.
    pub fn close(&self) -> UiPhase {
        self.transition_or_stay(UiPhase::Closed)
    }

    fn transition_or_stay(&self, target: UiPhase) -> UiPhase {
        match self.transition(target) {
            Ok(phase) => phase,
            Err(e) => {
                debug!(error = %e, "Ignoring phase change");
                self.phase()
            }
        }
    }

    // -----------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------

    /// Replace the contents of the input box.
    pub fn set_draft(&self, text: impl Into<String>) {
        let mut state = self.shared.lock();
        state.draft = text.into();
        self.shared.publish(&state);
    }

    /// Submit whatever is in the input box.
    pub fn submit_draft(&self) -> bool {
        let draft = self.draft();
        self.submit(&draft)
    }

    /// Submit one of the canned quick-action questions.
    pub fn submit_quick_action(&self, index: usize) -> Result<bool, ChatError> {
        let question = quick_action(index)?;
        Ok(self.submit(question))
    }

    /// Submit user text.
    ///
    /// Blank input is ignored and returns `false`. Otherwise the user message
    /// is appended and persisted at once, the input box is cleared, and the
    /// bot reply is scheduled after the fixed delay. Submissions made while a
    /// reply is pending are accepted and get their own reply.
    pub fn submit(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let ticket = {
            let mut state = self.shared.lock();
            if state.shut_down {
                return false;
            }
            state.messages.push(Message::user(text));
            self.shared.store.save(&state.messages);
            state.draft.clear();

            let ticket = state.next_ticket;
            state.next_ticket += 1;
            state.in_flight.insert(ticket, None);
            self.shared.publish(&state);
            ticket
        };

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let input = text.to_string();
        let task: ReplyTask = Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.deliver_reply(ticket, &input);
            }
        });
        let task_id = self.scheduler.schedule(self.reply_delay, task);

        // The reply may already have run (zero delay on another thread).
        if let Some(slot) = self.shared.lock().in_flight.get_mut(&ticket) {
            *slot = Some(task_id);
        }
        true
    }

    // -----------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------

    /// Cancel every pending reply and stop accepting submissions.
    pub fn shutdown(&self) {
        let cancelled: Vec<TaskId> = {
            let mut state = self.shared.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            let ids = state.in_flight.drain().filter_map(|(_, id)| id).collect();
            self.shared.publish(&state);
            ids
        };

        for id in &cancelled {
            self.scheduler.cancel(*id);
        }
        if !cancelled.is_empty() {
            info!(count = cancelled.len(), "Cancelled pending replies on teardown");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
