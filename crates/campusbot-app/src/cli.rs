//! CLI argument definitions for the campusbot binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Campusbot: the college portal assistant, in your terminal.
#[derive(Parser, Debug)]
#[command(name = "campusbot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory holding the conversation database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Simulated reply delay in milliseconds.
    #[arg(long = "reply-delay-ms")]
    pub reply_delay_ms: Option<u64>,

    /// Keep the conversation in memory only.
    #[arg(long = "ephemeral")]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Open the interactive chat widget (default).
    Chat,
    /// Resolve a single question and print the answer.
    Ask {
        /// The question to ask.
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Print the saved conversation history.
    History,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CAMPUSBOT_CONFIG env var > ~/.campusbot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CAMPUSBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > CAMPUSBOT_DATA_DIR env var > config file value.
    pub fn resolve_data_dir(&self, config_dir: &str) -> PathBuf {
        if let Some(ref p) = self.data_dir {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CAMPUSBOT_DATA_DIR") {
            return PathBuf::from(p);
        }
        expand_home(config_dir)
    }

    /// Resolve the log level. Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the reply delay. Priority: --reply-delay-ms flag > config file value.
    pub fn resolve_reply_delay_ms(&self, config_delay_ms: u64) -> u64 {
        self.reply_delay_ms.unwrap_or(config_delay_ms)
    }

    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Chat)
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".campusbot").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("campusbot").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults_to_chat() {
        let args = parse(&[]);
        assert_eq!(args.command(), &Command::Chat);
        assert!(!args.ephemeral);
    }

    #[test]
    fn test_ask_collects_words() {
        let args = parse(&["ask", "how", "do", "I", "pay", "fees"]);
        match args.command() {
            Command::Ask { question } => assert_eq!(question.join(" "), "how do I pay fees"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        let result = CliArgs::try_parse_from(["campusbot", "ask"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_overrides() {
        let args = parse(&[
            "--config",
            "/tmp/cb.toml",
            "--data-dir",
            "/tmp/cb",
            "--log-level",
            "debug",
            "--reply-delay-ms",
            "50",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/cb.toml"));
        assert_eq!(args.resolve_data_dir("~/.campusbot"), PathBuf::from("/tmp/cb"));
        assert_eq!(args.resolve_log_level("warn"), "debug");
        assert_eq!(args.resolve_reply_delay_ms(800), 50);
    }

    #[test]
    fn test_config_values_used_without_flags() {
        let args = parse(&[]);
        assert_eq!(args.resolve_log_level("info"), "info");
        assert_eq!(args.resolve_reply_delay_ms(800), 800);
    }

    #[test]
    fn test_expand_home_plain_path() {
        assert_eq!(expand_home("/var/lib/campusbot"), PathBuf::from("/var/lib/campusbot"));
        assert_eq!(expand_home("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_expand_home_tilde() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_home("~/.campusbot"), home.join(".campusbot"));
        }
    }
}
