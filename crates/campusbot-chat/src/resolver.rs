//! Rule-based response resolver.
//!
//! Maps raw user text to a reply by applying, in strict order: greeting,
//! gratitude, knowledge-base keyword search, fallback. The first rule that
//! matches wins; rules are never combined or ranked.

use std::sync::{Arc, LazyLock};

use rand::Rng;
use regex::Regex;

use crate::knowledge::KnowledgeBase;

/// Replies to a greeting. The first one also seeds every fresh conversation.
pub const GREETINGS: &[&str] = &[
    "Hello! I'm the campus assistant. How can I help you today?",
    "Hi there! Ask me anything about the college portal.",
    "Hey! I can help with attendance, marks, fees, admissions and more.",
];

/// Reply to any message that says thanks.
pub const GRATITUDE_RESPONSE: &str =
    "You're welcome! Is there anything else I can help you with?";

// Anchored at the start only; "history" counts as a greeting.
static GREETING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(hi|hello|hey|greetings)").unwrap());

static GRATITUDE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)thanks?").unwrap());

// =============================================================================
// ChoiceSource
// =============================================================================

/// Source of the index used to pick a greeting.
pub trait ChoiceSource: Send + Sync {
    /// Pick an index in `0..len`. `len` is never zero.
    fn choose(&self, len: usize) -> usize;
}

/// Uniform choice backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngChoice;

impl ChoiceSource for ThreadRngChoice {
    fn choose(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always picks the same index (wrapped into range). For tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub usize);

impl ChoiceSource for FixedChoice {
    fn choose(&self, len: usize) -> usize {
        self.0 % len
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Which rule produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Greeting,
    Gratitude,
    /// Index into [`KnowledgeBase::entries`].
    Keyword(usize),
    Fallback,
}

// =============================================================================
// ResponseResolver
// =============================================================================

/// Pure mapping from user input to reply text, apart from greeting choice.
pub struct ResponseResolver {
    knowledge: KnowledgeBase,
    chooser: Arc<dyn ChoiceSource>,
}

impl ResponseResolver {
    pub fn new(knowledge: KnowledgeBase, chooser: Arc<dyn ChoiceSource>) -> Self {
        Self { knowledge, chooser }
    }

    /// Resolver over the built-in catalog with random greetings.
    pub fn with_defaults() -> Self {
        Self::new(KnowledgeBase::builtin(), Arc::new(ThreadRngChoice))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Decide which rule applies to `input`.
    pub fn classify(&self, input: &str) -> Resolution {
        if GREETING_RE.is_match(input.trim()) {
            return Resolution::Greeting;
        }

        if GRATITUDE_RE.is_match(input) {
            return Resolution::Gratitude;
        }

        let lowered = input.to_lowercase();
        for (idx, entry) in self.knowledge.entries().iter().enumerate() {
            if entry.keywords.iter().any(|k| lowered.contains(k.as_str())) {
                return Resolution::Keyword(idx);
            }
        }

        Resolution::Fallback
    }

    /// Produce the reply text for `input`.
    pub fn resolve(&self, input: &str) -> String {
        let resolution = self.classify(input);
        tracing::debug!(?resolution, "Resolved chat input");

        match resolution {
            Resolution::Greeting => {
                let idx = self.chooser.choose(GREETINGS.len());
                GREETINGS[idx.min(GREETINGS.len() - 1)].to_string()
            }
            Resolution::Gratitude => GRATITUDE_RESPONSE.to_string(),
            Resolution::Keyword(idx) => self.knowledge.entries()[idx].answer.clone(),
            Resolution::Fallback => self.knowledge.fallback().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{KnowledgeEntry, FALLBACK_RESPONSE};

    fn resolver() -> ResponseResolver {
        ResponseResolver::new(KnowledgeBase::builtin(), Arc::new(FixedChoice(0)))
    }

    fn answer_for(question: &str) -> String {
        KnowledgeBase::builtin()
            .find_by_question(question)
            .unwrap()
            .answer
            .clone()
    }

    // =====================================================================
    // Greeting rule
    // =====================================================================

    #[test]
    fn test_greeting_variants() {
        let r = resolver();
        for input in ["hi", "Hello there", "HEY", "greetings, bot", "hey!"] {
            assert_eq!(r.classify(input), Resolution::Greeting, "{input}");
            assert!(GREETINGS.contains(&r.resolve(input).as_str()));
        }
    }

    #[test]
    fn test_greeting_ignores_leading_whitespace() {
        assert_eq!(resolver().classify("   hello"), Resolution::Greeting);
    }

    #[test]
    fn test_greeting_is_prefix_not_word() {
        // Prefix semantics: words starting with "hi" are greetings too.
        assert_eq!(resolver().classify("history of the college"), Resolution::Greeting);
    }

    #[test]
    fn test_greeting_must_be_at_start() {
        assert_ne!(resolver().classify("well hello"), Resolution::Greeting);
    }

    #[test]
    fn test_greeting_random_choice_is_member() {
        let r = ResponseResolver::with_defaults();
        for _ in 0..50 {
            assert!(GREETINGS.contains(&r.resolve("hello").as_str()));
        }
    }

    #[test]
    fn test_greeting_choice_is_injected() {
        let r = ResponseResolver::new(KnowledgeBase::builtin(), Arc::new(FixedChoice(2)));
        assert_eq!(r.resolve("hi"), GREETINGS[2]);

        let r = ResponseResolver::new(KnowledgeBase::builtin(), Arc::new(FixedChoice(4)));
        assert_eq!(r.resolve("hi"), GREETINGS[1]);
    }

    #[test]
    fn test_greeting_beats_gratitude_and_keywords() {
        assert_eq!(resolver().classify("hello, thanks for the marks"), Resolution::Greeting);
    }

    // =====================================================================
    // Gratitude rule
    // =====================================================================

    #[test]
    fn test_gratitude() {
        let r = resolver();
        for input in ["thanks", "Thank you!", "many THANKS", "ok thankyou"] {
            assert_eq!(r.resolve(input), GRATITUDE_RESPONSE, "{input}");
        }
    }

    #[test]
    fn test_gratitude_beats_keywords() {
        assert_eq!(
            resolver().resolve("thank you for explaining attendance"),
            GRATITUDE_RESPONSE
        );
    }

    // =====================================================================
    // Keyword rule
    // =====================================================================

    #[test]
    fn test_keyword_attendance() {
        assert_eq!(
            resolver().resolve("How do I mark attendance?"),
            answer_for("How do I mark attendance?")
        );
    }

    #[test]
    fn test_keyword_marks_scenario() {
        assert_eq!(
            resolver().resolve("please enter marks for exam"),
            answer_for("How do I enter marks?")
        );
    }

    #[test]
    fn test_keyword_case_insensitive() {
        assert_eq!(
            resolver().resolve("WHAT IS THE FEE STRUCTURE"),
            answer_for("How do I manage fees?")
        );
    }

    #[test]
    fn test_keyword_substring_inside_other_word() {
        // "exam" inside "example", "fee" inside "feedback".
        assert_eq!(
            resolver().resolve("give me an example"),
            answer_for("Where can I see the exam schedule?")
        );
        assert_eq!(
            resolver().resolve("I have feedback"),
            answer_for("How do I manage fees?")
        );
    }

    #[test]
    fn test_keyword_earlier_entry_wins() {
        // Both attendance (entry 0) and exam (entry 9) keywords present.
        assert_eq!(
            resolver().classify("exam attendance rules"),
            Resolution::Keyword(0)
        );
    }

    #[test]
    fn test_keyword_order_within_entry() {
        let kb = KnowledgeBase::new(
            vec![
                KnowledgeEntry {
                    question: "first".into(),
                    answer: "first answer".into(),
                    keywords: vec!["zzz".into()],
                },
                KnowledgeEntry {
                    question: "second".into(),
                    answer: "second answer".into(),
                    keywords: vec!["book".into(), "library".into()],
                },
            ],
            None,
        )
        .unwrap();
        let r = ResponseResolver::new(kb, Arc::new(FixedChoice(0)));
        assert_eq!(r.resolve("library book"), "second answer");
        assert_eq!(r.classify("library book"), Resolution::Keyword(1));
    }

    // =====================================================================
    // Fallback rule
    // =====================================================================

    #[test]
    fn test_fallback() {
        assert_eq!(resolver().resolve("what's the weather like"), FALLBACK_RESPONSE);
    }

    #[test]
    fn test_fallback_for_empty_and_whitespace() {
        let r = resolver();
        assert_eq!(r.classify(""), Resolution::Fallback);
        assert_eq!(r.classify("   \n\t"), Resolution::Fallback);
        assert_eq!(r.resolve(""), FALLBACK_RESPONSE);
    }

    #[test]
    fn test_fallback_lists_topics() {
        assert!(FALLBACK_RESPONSE.contains("Attendance"));
        assert!(FALLBACK_RESPONSE.contains("Fees"));
        assert!(FALLBACK_RESPONSE.lines().count() > 5);
    }

    #[test]
    fn test_custom_fallback() {
        let kb = KnowledgeBase::from_toml_str(
            "fallback = \"Only library questions.\"\n[[entries]]\nquestion = \"Q\"\nanswer = \"A\"\nkeywords = [\"library\"]\n",
        )
        .unwrap();
        let r = ResponseResolver::new(kb, Arc::new(FixedChoice(0)));
        assert_eq!(r.resolve("parking?"), "Only library questions.");
    }
}
