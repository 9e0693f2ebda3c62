//! Terminal rendering of the chat widget.
//!
//! Turns [`ConversationSnapshot`]s into terminal output and parses the slash
//! commands typed at the prompt. Messages are only drawn while the widget is
//! open; anything that arrives while minimized or closed is caught up on the
//! next open.

use std::io::{self, Write};

use chrono::Local;

use campusbot_chat::{ConversationSnapshot, QUICK_ACTIONS};
use campusbot_core::{Message, Sender, UiPhase};

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetCommand {
    Open,
    Minimize,
    Close,
    /// `/quick` lists the shortcuts, `/quick <n>` sends shortcut `n` (1-based).
    Quick(Option<usize>),
    History,
    Help,
    Quit,
    Say(String),
    Unknown(String),
    Empty,
}

pub fn parse_command(line: &str) -> WidgetCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return WidgetCommand::Empty;
    }
    if !trimmed.starts_with('/') {
        return WidgetCommand::Say(line.trim_end_matches(['\r', '\n']).to_string());
    }

    let mut parts = trimmed.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    match cmd {
        "/open" => WidgetCommand::Open,
        "/min" | "/minimize" => WidgetCommand::Minimize,
        "/close" => WidgetCommand::Close,
        "/history" => WidgetCommand::History,
        "/help" => WidgetCommand::Help,
        "/quit" | "/exit" => WidgetCommand::Quit,
        "/quick" => match parts.next() {
            None => WidgetCommand::Quick(None),
            Some(n) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => WidgetCommand::Quick(Some(n - 1)),
                _ => WidgetCommand::Unknown(trimmed.to_string()),
            },
        },
        _ => WidgetCommand::Unknown(trimmed.to_string()),
    }
}

/// Format one message: a header line, then the text verbatim.
pub fn render_message(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Bot => "Assistant",
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    format!("{} ({}):\n{}\n", who, time, message.text)
}

pub const HELP_TEXT: &str = "Commands:
  /open          open the chat window
  /min           minimize or restore the chat window
  /close         close the chat window
  /quick         list quick questions, /quick <n> to ask one
  /history       print the whole conversation
  /quit          leave
Anything else is sent to the assistant.";

/// Incremental renderer over a writer.
pub struct TerminalWidget<W: Write> {
    out: W,
    shown: usize,
    phase: UiPhase,
    typing: bool,
}

impl<W: Write> TerminalWidget<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: 0,
            phase: UiPhase::Closed,
            typing: false,
        }
    }

    /// Draw whatever changed since the previous snapshot.
    pub fn render(&mut self, snap: &ConversationSnapshot) -> io::Result<()> {
        if snap.phase != self.phase {
            let banner = match snap.phase {
                UiPhase::Open => "--- chat open ---",
                UiPhase::Minimized => "--- chat minimized (/min to restore) ---",
                UiPhase::Closed => "--- chat closed (/open to reopen) ---",
            };
            writeln!(self.out, "{}", banner)?;
            self.phase = snap.phase;
        }

        if snap.phase == UiPhase::Open {
            for message in snap.messages.iter().skip(self.shown) {
                writeln!(self.out, "{}", render_message(message))?;
            }
            self.shown = snap.messages.len();

            if snap.pending_reply && !self.typing {
                writeln!(self.out, "Assistant is typing...")?;
            }
        }
        self.typing = snap.pending_reply;
        self.out.flush()
    }

    pub fn print_history(&mut self, messages: &[Message]) -> io::Result<()> {
        for message in messages {
            writeln!(self.out, "{}", render_message(message))?;
        }
        self.out.flush()
    }

    pub fn print_quick_actions(&mut self) -> io::Result<()> {
        writeln!(self.out, "Quick questions:")?;
        for (idx, question) in QUICK_ACTIONS.iter().enumerate() {
            writeln!(self.out, "  {}. {}", idx + 1, question)?;
        }
        self.out.flush()
    }

    pub fn print_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
