//! Curated knowledge base of portal topics.
//!
//! Each entry maps a set of trigger keywords to one canonical answer. The
//! catalog is loaded once at startup (built-in, or from a TOML file) and is
//! immutable afterwards. Entry order is significant: the resolver returns
//! the first entry with a matching keyword.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use campusbot_core::error::{CampusbotError, Result};

/// Reply used when no rule matches, listing what the assistant knows about.
pub const FALLBACK_RESPONSE: &str = "I'm not sure about that yet, but here is what I can help with:

• Attendance
• Marks and grades
• Student records
• Reports
• Fees and payments
• Courses and departments
• Admissions
• Contact details
• Login and passwords
• Exams and timetables

Try asking something like \"How do I mark attendance?\"";

// =============================================================================
// Built-in catalog
// =============================================================================

struct BuiltinEntry {
    question: &'static str,
    answer: &'static str,
    keywords: &'static [&'static str],
}

static BUILTIN_ENTRIES: &[BuiltinEntry] = &[
    BuiltinEntry {
        question: "How do I mark attendance?",
        answer: "To mark attendance:
1. Open the Attendance page from the admin sidebar.
2. Pick the class, section and date.
3. Tick Present or Absent for each student.
4. Click Save Attendance.

Students can review their own record under My Attendance in the student portal.",
        keywords: &["attendance", "present", "absent"],
    },
    BuiltinEntry {
        question: "How do I enter marks?",
        answer: "To enter marks:
1. Open the Marks page from the admin sidebar.
2. Select the exam, class and subject.
3. Type each student's score (out of the maximum marks shown).
4. Click Save Marks.

Grades are calculated automatically once marks are saved.",
        keywords: &["marks", "grade", "score", "result"],
    },
    BuiltinEntry {
        question: "How do I add a new student?",
        answer: "To add a student:
1. Open Students and click Add Student.
2. Fill in name, roll number, class, section and guardian details.
3. Click Create.

The student can then sign in to the portal with their roll number.",
        keywords: &["add student", "new student", "student record", "enroll"],
    },
    BuiltinEntry {
        question: "How do I view reports?",
        answer: "Reports live on the Dashboard:
• Attendance summary per class
• Marks distribution per exam
• Fee collection status

Use the filters at the top to narrow by class, section or date range.",
        keywords: &["report", "analytics", "statistics", "dashboard"],
    },
    BuiltinEntry {
        question: "How do I manage fees?",
        answer: "Fee management:
1. Open Fees from the admin sidebar.
2. Select a student to see dues and payment history.
3. Click Record Payment to log a new payment.

Students can see outstanding dues under My Fees.",
        keywords: &["fee", "payment", "dues", "tuition"],
    },
    BuiltinEntry {
        question: "What courses are offered?",
        answer: "The college offers undergraduate programs in:
• Computer Science
• Electronics and Communication
• Mechanical Engineering
• Civil Engineering
• Business Administration

See the Courses page on the main site for syllabus and intake details.",
        keywords: &["course", "program", "department", "branch"],
    },
    BuiltinEntry {
        question: "How do I apply for admission?",
        answer: "Admissions:
1. Visit the Admissions page on the main site.
2. Fill in the online application form.
3. Upload your mark sheets and ID proof.
4. Pay the application fee.

You will receive a confirmation email once your application is reviewed.",
        keywords: &["admission", "apply", "application"],
    },
    BuiltinEntry {
        question: "How do I contact the college?",
        answer: "You can reach the college office:
• Phone: +91 80 4000 1234
• Email: office@college.edu
• Hours: Monday to Saturday, 9:00 AM to 5:00 PM

The Contact page on the main site has a map and enquiry form.",
        keywords: &["contact", "phone", "email", "address"],
    },
    BuiltinEntry {
        question: "How do I reset my password?",
        answer: "To reset your password:
1. Click Forgot Password on the login page.
2. Enter your registered email.
3. Follow the link sent to your inbox.

If you don't receive the email, ask the admin office to reset it for you.",
        keywords: &["password", "login", "log in", "sign in"],
    },
    BuiltinEntry {
        question: "Where can I see the exam schedule?",
        answer: "Exam schedules are published under Exams in the student portal.
Each entry shows the subject, date, time and room.

Admins can create or edit schedules from Exams > Manage Schedule.",
        keywords: &["exam", "timetable", "schedule"],
    },
];

// =============================================================================
// KnowledgeEntry / KnowledgeBase
// =============================================================================

/// One topic: a display label, the verbatim answer, and its trigger keywords.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KnowledgeEntry {
    /// Human-readable label. Not used for matching.
    pub question: String,
    pub answer: String,
    /// Lowercase substrings; any one appearing in the lowercased input selects
    /// this entry.
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    fallback: Option<String>,
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

/// Ordered, immutable catalog of knowledge entries.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    fallback: String,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    /// The compiled-in campus portal catalog.
    pub fn builtin() -> Self {
        let entries = BUILTIN_ENTRIES
            .iter()
            .map(|e| KnowledgeEntry {
                question: e.question.to_string(),
                answer: e.answer.to_string(),
                keywords: e.keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();
        Self {
            entries,
            fallback: FALLBACK_RESPONSE.to_string(),
        }
    }

    /// Build a catalog from explicit entries, validating and normalizing them.
    pub fn new(entries: Vec<KnowledgeEntry>, fallback: Option<String>) -> Result<Self> {
        if entries.is_empty() {
            return Err(CampusbotError::KnowledgeBase(
                "knowledge base has no entries".to_string(),
            ));
        }

        let mut normalized = Vec::with_capacity(entries.len());
        for (idx, mut entry) in entries.into_iter().enumerate() {
            if entry.answer.trim().is_empty() {
                return Err(CampusbotError::KnowledgeBase(format!(
                    "entry {} ({:?}) has an empty answer",
                    idx, entry.question
                )));
            }
            if entry.keywords.is_empty() {
                return Err(CampusbotError::KnowledgeBase(format!(
                    "entry {} ({:?}) has no keywords",
                    idx, entry.question
                )));
            }
            if entry.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(CampusbotError::KnowledgeBase(format!(
                    "entry {} ({:?}) has a blank keyword",
                    idx, entry.question
                )));
            }
            // Matching runs against lowercased input.
            entry.keywords = entry.keywords.iter().map(|k| k.to_lowercase()).collect();
            normalized.push(entry);
        }

        let fallback = fallback
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_RESPONSE.to_string());

        Ok(Self {
            entries: normalized,
            fallback,
        })
    }

    /// Parse a catalog from TOML.
    ///
    /// ```toml
    /// fallback = "optional replacement for the built-in fallback"
    ///
    /// [[entries]]
    /// question = "How do I mark attendance?"
    /// answer = "Open the Attendance page..."
    /// keywords = ["attendance", "present"]
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: KnowledgeFile = toml::from_str(content)?;
        Self::new(file.entries, file.fallback)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let kb = Self::from_toml_str(&content)?;
        info!(
            entries = kb.entries.len(),
            "Knowledge base loaded from {}",
            path.display()
        );
        Ok(kb)
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its display label (exact match).
    pub fn find_by_question(&self, question: &str) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|e| e.question == question)
    }
}
