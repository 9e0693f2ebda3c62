//! Campusbot binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Open the conversation store (SQLite, or memory with --ephemeral)
//! 3. Build the resolver over the built-in or configured knowledge base
//! 4. Run the requested command: interactive chat, one-shot ask, or history

mod cli;
mod widget;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use campusbot_chat::{
    ChatError, ConversationStore, KeyValueConversationStore, KnowledgeBase, ResponseResolver,
    SessionController, ThreadRngChoice, TokioScheduler,
};
use campusbot_core::config::CampusbotConfig;
use campusbot_core::kv::MemoryKeyValueStore;
use campusbot_core::UiPhase;
use campusbot_storage::SqliteKeyValueStore;

use cli::{CliArgs, Command};
use widget::{parse_command, TerminalWidget, WidgetCommand, HELP_TEXT};

/// Open the conversation store selected by the CLI and config.
fn open_store(
    args: &CliArgs,
    config: &CampusbotConfig,
) -> Result<Arc<dyn ConversationStore>, ChatError> {
    let key = config.chat.storage_key.clone();
    if args.ephemeral {
        tracing::info!("Using in-memory conversation store");
        return Ok(Arc::new(KeyValueConversationStore::new(
            MemoryKeyValueStore::new(),
            key,
        )));
    }

    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    let db_path = data_dir.join(&config.storage.database_file);
    let backend = SqliteKeyValueStore::open(&db_path)?;
    tracing::info!(path = %db_path.display(), key = %key, "Conversation store opened");
    Ok(Arc::new(KeyValueConversationStore::new(backend, key)))
}

/// Build the resolver over the configured knowledge base.
fn build_resolver(config: &CampusbotConfig) -> Result<ResponseResolver, ChatError> {
    let knowledge = if config.chat.knowledge_base.is_empty() {
        KnowledgeBase::builtin()
    } else {
        KnowledgeBase::load(Path::new(&config.chat.knowledge_base))?
    };
    Ok(ResponseResolver::new(knowledge, Arc::new(ThreadRngChoice)))
}

/// Interactive loop: stdin lines drive the controller, snapshots drive output.
async fn run_chat(controller: SessionController) -> std::io::Result<()> {
    let mut snapshots = controller.subscribe();
    let mut widget = TerminalWidget::new(std::io::stdout());

    widget.print_line("Campus assistant. Type /open to start, /help for commands.")?;
    let initial = snapshots.borrow_and_update().clone();
    widget.render(&initial)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    WidgetCommand::Quit => break,
                    WidgetCommand::Open => {
                        controller.open();
                    }
                    WidgetCommand::Minimize => {
                        controller.toggle_minimize();
                    }
                    WidgetCommand::Close => {
                        controller.close();
                    }
                    WidgetCommand::Quick(None) => widget.print_quick_actions()?,
                    WidgetCommand::Quick(Some(index)) => {
                        if controller.phase() == UiPhase::Closed {
                            controller.open();
                        }
                        if let Err(e) = controller.submit_quick_action(index) {
                            widget.print_line(&e.to_string())?;
                        }
                    }
                    WidgetCommand::History => widget.print_history(&controller.messages())?,
                    WidgetCommand::Help => widget.print_line(HELP_TEXT)?,
                    WidgetCommand::Say(text) => {
                        // Typing into the launcher opens the window first.
                        if controller.phase() == UiPhase::Closed {
                            controller.open();
                        }
                        controller.set_draft(text);
                        controller.submit_draft();
                    }
                    WidgetCommand::Unknown(cmd) => {
                        widget.print_line(&format!("Unknown command {}. Try /help.", cmd))?;
                    }
                    WidgetCommand::Empty => {}
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                widget.render(&snap)?;
            }
        }
    }

    controller.shutdown();
    Ok(())
}

fn resolve_config(args: &CliArgs) -> (PathBuf, CampusbotConfig) {
    let config_file = args.resolve_config_path();
    let mut config = CampusbotConfig::load_or_default(&config_file);
    config.chat.reply_delay_ms = args.resolve_reply_delay_ms(config.chat.reply_delay_ms);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);
    (config_file, config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let (config_file, config) = resolve_config(&args);

    // Tracing goes to stderr so the conversation on stdout stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting campusbot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    match args.command() {
        Command::Ask { question } => {
            let resolver = build_resolver(&config)?;
            println!("{}", resolver.resolve(&question.join(" ")));
        }
        Command::History => {
            let store = open_store(&args, &config)?;
            let messages = store.load().unwrap_or_default();
            let mut widget = TerminalWidget::new(std::io::stdout());
            if messages.is_empty() {
                widget.print_line("No saved conversation.")?;
            } else {
                widget.print_history(&messages)?;
            }
        }
        Command::Chat => {
            let store = open_store(&args, &config)?;
            let resolver = build_resolver(&config)?;
            let scheduler = Arc::new(TokioScheduler::new(tokio::runtime::Handle::current()));
            let controller =
                SessionController::new(resolver, store, scheduler, config.chat.reply_delay());
            run_chat(controller).await?;
        }
    }

    Ok(())
}
