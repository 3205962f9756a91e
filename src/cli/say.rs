//! Send a turn from the command line and stream the reply

use std::error::Error;
use std::io::{self, Write};

use crate::cli::require_setup;
use crate::core::orchestrator::{Applied, Orchestrator};
use crate::core::session::Pane;

pub async fn run_say(
    orchestrator: &mut Orchestrator,
    pane: Pane,
    prompt: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: splitchat say [--pane <PANE>] <prompt>");
        std::process::exit(1);
    }
    require_setup(orchestrator.state());

    orchestrator.send_message(pane, &prompt)?;
    stream_turn(orchestrator).await
}

pub async fn run_regenerate(
    orchestrator: &mut Orchestrator,
    pane: Pane,
    index: usize,
    content: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let content = content.join(" ");
    if content.trim().is_empty() {
        eprintln!("Usage: splitchat regenerate [--pane <PANE>] <index> <content>");
        std::process::exit(1);
    }
    require_setup(orchestrator.state());

    orchestrator.regenerate_from(pane, index, &content)?;
    stream_turn(orchestrator).await
}

/// Print tokens as they arrive and wait for the reply and any title request.
async fn stream_turn(orchestrator: &mut Orchestrator) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    let mut reasoning_shown = false;
    let mut failure = None;

    while orchestrator.has_pending_work() {
        let Some(event) = orchestrator.next_event().await else {
            break;
        };
        let Some(applied) = orchestrator.handle_event(event) else {
            continue;
        };
        match applied {
            Applied::Routed {
                provider, model, ..
            } => eprintln!("🤖 {provider} · {model}"),
            Applied::Attempt { model, attempt, .. } if attempt > 1 => {
                println!();
                eprintln!("↻ Retrying with {model}");
                reasoning_shown = false;
            }
            Applied::Reasoning { .. } if !reasoning_shown => {
                eprintln!("💭 Reasoning...");
                reasoning_shown = true;
            }
            Applied::Token { text, .. } => {
                print!("{text}");
                stdout.flush()?;
            }
            Applied::Committed {
                chat_id,
                failed: true,
                ..
            } => {
                failure = orchestrator
                    .state()
                    .chat(&chat_id)
                    .and_then(|chat| chat.messages.last())
                    .map(|message| message.content.clone());
            }
            Applied::Committed { .. } => println!(),
            Applied::Titled { title, .. } => eprintln!("📝 {title}"),
            _ => {}
        }
    }

    if let Some(message) = failure {
        eprintln!("\n❌ {message}");
        std::process::exit(1);
    }
    Ok(())
}
