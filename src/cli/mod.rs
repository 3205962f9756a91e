//! Command-line interface parsing and handling
//!
//! Each invocation opens the persisted session, applies one command, and
//! exits. Turns are streamed to stdout; status lines go to stderr.

pub mod chat_list;
pub mod model_list;
pub mod panes;
pub mod provider_list;
pub mod say;
pub mod setup;


use std::error::Error;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::chat_list::{list_chats, show_chat};
use crate::cli::model_list::{list_models, pull_model};
use crate::cli::panes::apply_action;
use crate::cli::provider_list::list_providers;
use crate::cli::say::{run_regenerate, run_say};
use crate::cli::setup::run_setup;
use crate::core::chat::ChatConfigPatch;
use crate::core::config::Config;
use crate::core::orchestrator::Orchestrator;
use crate::core::session::{Pane, SessionAction, SessionState, SessionStore};
use crate::utils::logging;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_SHA"),
    "\ndescribe: ",
    env!("VERGEN_GIT_DESCRIBE"),
    "\nbuilt: ",
    env!("VERGEN_BUILD_DATE"),
);

#[derive(Parser)]
#[command(name = "splitchat")]
#[command(about = "Split-pane chat with local and cloud LLMs")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    long_about = "Splitchat keeps a list of chats, shows up to two of them side by side, \
and sends each turn to a local Ollama daemon or a hosted API.\n\n\
The 'auto' provider prefers the local daemon early in a conversation, sends \
coding questions to a coding model, and walks a list of free hosted models \
when one fails.\n\n\
Environment Variables:\n\
  SPLITCHAT_LOG     Log filter for diagnostics (falls back to RUST_LOG)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which side of the split a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaneArg {
    #[value(alias = "left")]
    Primary,
    #[value(alias = "right")]
    Secondary,
}

impl From<PaneArg> for Pane {
    fn from(pane: PaneArg) -> Self {
        match pane {
            PaneArg::Primary => Pane::Primary,
            PaneArg::Secondary => Pane::Secondary,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List chats and the pane layout, or print one chat's transcript
    Chats {
        /// Chat to print with message indices
        chat_id: Option<String>,
    },
    /// Send a message in a pane and stream the reply
    Say {
        /// Pane whose chat receives the message
        #[arg(long, value_enum, default_value = "primary")]
        pane: PaneArg,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Start an empty chat in the primary pane
    New,
    /// Select a chat as if picked from the sidebar
    Select { chat_id: String },
    /// Open a chat in the secondary pane
    Split { chat_id: String },
    /// Close the split view
    Unsplit,
    /// Keep only one pane's chat on screen
    Maximize {
        #[arg(value_enum)]
        pane: PaneArg,
    },
    /// Make a pane the active one
    Focus {
        #[arg(value_enum)]
        pane: PaneArg,
    },
    /// Delete a chat
    Delete { chat_id: String },
    /// Replace a message, drop everything after it, and answer again
    Regenerate {
        #[arg(long, value_enum, default_value = "primary")]
        pane: PaneArg,
        /// Index of the message to replace, as shown by `chats <id>`
        index: usize,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        content: Vec<String>,
    },
    /// Choose a provider and model for first use
    Setup {
        provider: String,
        #[arg(short = 'm', long)]
        model: Option<String>,
        #[arg(short = 'k', long = "api-key")]
        api_key: Option<String>,
    },
    /// Set session values: provider, model, api-key, chat-model, chat-provider
    Set {
        key: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// List built-in providers and their credential status
    Providers,
    /// List models offered by a provider
    Models {
        /// Provider to query (defaults to the session provider)
        provider: Option<String>,
    },
    /// Download a model into the local daemon
    Pull {
        /// Model to pull (defaults to the configured local model)
        model: Option<String>,
    },
    /// Show the current configuration
    Config,
    /// Forget every chat, credential, and setting
    Reset,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::load()?;
    logging::init(config.log_level());
    let mut store = SessionStore::open_default()?;

    match args.command.unwrap_or(Commands::Chats { chat_id: None }) {
        Commands::Chats { chat_id: None } => {
            list_chats(store.state());
            Ok(())
        }
        Commands::Chats {
            chat_id: Some(chat_id),
        } => show_chat(store.state(), &chat_id),
        Commands::Say { pane, prompt } => {
            let mut orchestrator = Orchestrator::from_config(store, config);
            run_say(&mut orchestrator, pane.into(), prompt).await
        }
        Commands::New => {
            require_setup(store.state());
            let mut orchestrator = Orchestrator::from_config(store, config);
            let chat_id = orchestrator.new_chat()?;
            println!("✅ Started chat {chat_id}");
            Ok(())
        }
        Commands::Select { chat_id } => apply_action(&mut store, SessionAction::SelectChat(chat_id)),
        Commands::Split { chat_id } => {
            apply_action(&mut store, SessionAction::EnableSplitView(chat_id))
        }
        Commands::Unsplit => apply_action(&mut store, SessionAction::CloseSplitView),
        Commands::Maximize { pane } => {
            apply_action(&mut store, SessionAction::MaximizePane(pane.into()))
        }
        Commands::Focus { pane } => {
            apply_action(&mut store, SessionAction::SetActivePane(pane.into()))
        }
        Commands::Delete { chat_id } => apply_action(&mut store, SessionAction::DeleteChat(chat_id)),
        Commands::Regenerate {
            pane,
            index,
            content,
        } => {
            let mut orchestrator = Orchestrator::from_config(store, config);
            run_regenerate(&mut orchestrator, pane.into(), index, content).await
        }
        Commands::Setup {
            provider,
            model,
            api_key,
        } => run_setup(&mut store, &config, provider, model, api_key).await,
        Commands::Set { key, value } if key == "base-url" => {
            let [provider, url] = value.as_slice() else {
                eprintln!("❌ Usage: splitchat set base-url <provider> <url>");
                std::process::exit(1);
            };
            let mut config = config;
            config.set_base_url(provider, url.clone());
            config.save()?;
            println!("✅ Set base-url for {provider} to: {url}");
            Ok(())
        }
        Commands::Set { key, value } => {
            let action = match set_action(store.state(), &key, &value) {
                Ok(action) => action,
                Err(message) => {
                    eprintln!("❌ {message}");
                    std::process::exit(1);
                }
            };
            store.dispatch(action)?;
            println!("✅ Updated {key}");
            Ok(())
        }
        Commands::Providers => {
            list_providers(&config, store.state());
            Ok(())
        }
        Commands::Models { provider } => list_models(&config, store.state(), provider).await,
        Commands::Pull { model } => pull_model(&config, model).await,
        Commands::Config => {
            config.print_all();
            println!("  config-file: {}", Config::get_config_path().display());
            println!("  session-file: {}", SessionStore::default_path().display());
            Ok(())
        }
        Commands::Reset => {
            store.dispatch(SessionAction::Reset)?;
            println!("✅ Session reset");
            Ok(())
        }
    }
}

/// Turns are refused until a provider has been chosen.
pub(crate) fn require_setup(state: &SessionState) {
    if !state.has_completed_setup {
        eprintln!("⚠️  No provider chosen yet.");
        eprintln!("Run 'splitchat setup <provider>' first, e.g. 'splitchat setup ollama -m deepseek-r1:1.5b'.");
        std::process::exit(1);
    }
}

/// Map a `set` invocation onto a session action.
fn set_action(state: &SessionState, key: &str, value: &[String]) -> Result<SessionAction, String> {
    let joined = value.join(" ");
    if joined.trim().is_empty() {
        return Err(format!("Missing value for {key}"));
    }
    let current_chat = || {
        state
            .current_chat_id
            .clone()
            .ok_or_else(|| "No chat is selected".to_string())
    };

    match key {
        "provider" => Ok(SessionAction::SetProvider(joined)),
        "model" => Ok(SessionAction::SetModel(joined)),
        "api-key" => match value {
            [provider, key] => Ok(SessionAction::SetApiKey {
                provider: provider.clone(),
                key: key.clone(),
            }),
            _ => Err("Usage: splitchat set api-key <provider> <key>".to_string()),
        },
        "chat-model" => Ok(SessionAction::UpdateChatConfig {
            chat_id: current_chat()?,
            patch: ChatConfigPatch::model(joined),
        }),
        "chat-provider" => Ok(SessionAction::UpdateChatConfig {
            chat_id: current_chat()?,
            patch: ChatConfigPatch::provider(joined),
        }),
        _ => Err(format!("Unknown key: {key}")),
    }
}
