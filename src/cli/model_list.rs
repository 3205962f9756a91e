//! Model listing and local model downloads

use std::error::Error;
use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::api::{ModelInfo, OllamaModel, OllamaPullProgress};
use crate::core::backends::{OllamaClient, OpenAiCompatClient};
use crate::core::builtin_providers::{
    find_builtin_provider, ProviderMode, CLOUD_AGGREGATOR_ID, LOCAL_PROVIDER_ID,
};
use crate::core::config::Config;
use crate::core::session::SessionState;

pub async fn list_models(
    config: &Config,
    state: &SessionState,
    provider: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let provider_id = provider.unwrap_or_else(|| state.provider.clone()).to_lowercase();
    let provider = find_builtin_provider(&provider_id)
        .ok_or_else(|| format!("Unknown provider '{provider_id}'. Run 'splitchat providers' to list them."))?;
    let http = reqwest::Client::new();

    match provider.mode {
        ProviderMode::Ollama => list_local(config, http).await,
        ProviderMode::Auto => {
            // Auto draws from both sides; an offline daemon is not an error here.
            if let Err(err) = list_local(config, http.clone()).await {
                eprintln!("⚠️  Local models unavailable: {err}");
            }
            println!();
            list_cloud(config, state, http, CLOUD_AGGREGATOR_ID).await
        }
        ProviderMode::OpenAi | ProviderMode::Anthropic => {
            list_cloud(config, state, http, &provider.id).await
        }
    }
}

async fn list_local(config: &Config, http: reqwest::Client) -> Result<(), Box<dyn Error>> {
    let client = OllamaClient::new(http, config.base_url_for(LOCAL_PROVIDER_ID));
    let models = client
        .list_models()
        .await
        .map_err(|err| err as Box<dyn Error>)?;

    println!("🤖 Local Models ({})", client.base_url());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if models.is_empty() {
        println!("No models installed. Try 'splitchat pull {}'.", config.routing.local_model());
    }
    for model in &models {
        println!("{}", local_model_line(model));
    }
    Ok(())
}

async fn list_cloud(
    config: &Config,
    state: &SessionState,
    http: reqwest::Client,
    provider_id: &str,
) -> Result<(), Box<dyn Error>> {
    let client = OpenAiCompatClient::new(http, provider_id, config.base_url_for(provider_id));
    let models = client
        .list_models(&state.api_key(provider_id))
        .await
        .map_err(|err| err as Box<dyn Error>)?;

    println!("🤖 Available Models for {provider_id}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for model in &models {
        println!("{}", cloud_model_line(model));
    }
    println!();
    println!("{} models", models.len());
    Ok(())
}

fn local_model_line(model: &OllamaModel) -> String {
    let size = model.size.map(format_size).unwrap_or_default();
    match model.modified_at.as_deref().and_then(short_date) {
        Some(date) => format!("  • {} {size} (modified {date})", model.name),
        None => format!("  • {} {size}", model.name),
    }
}

fn cloud_model_line(model: &ModelInfo) -> String {
    let mut line = format!("  • {}", model.id);
    if let Some(name) = model.name.as_deref().filter(|name| *name != model.id) {
        line.push_str(&format!(" ({name})"));
    }
    if let Some(created) = model
        .created
        .and_then(|secs| DateTime::<Utc>::from_timestamp(i64::try_from(secs).ok()?, 0))
    {
        line.push_str(&format!(" [{}]", created.format("%Y-%m-%d")));
    }
    line
}

fn short_date(timestamp: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

pub fn format_size(bytes: u64) -> String {
    const GB: f64 = 1_000_000_000.0;
    const MB: f64 = 1_000_000.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.0} MB", bytes / MB)
    }
}

pub fn progress_line(progress: &OllamaPullProgress) -> String {
    match (progress.completed, progress.total) {
        (Some(completed), Some(total)) if total > 0 => {
            let percent = completed.saturating_mul(100) / total;
            format!("{} {percent}% of {}", progress.status, format_size(total))
        }
        _ => progress.status.clone(),
    }
}

pub async fn pull_model(config: &Config, model: Option<String>) -> Result<(), Box<dyn Error>> {
    let model = model.unwrap_or_else(|| config.routing.local_model());
    let client = OllamaClient::new(reqwest::Client::new(), config.base_url_for(LOCAL_PROVIDER_ID));

    if !client.probe(config.routing.probe_timeout()).await {
        eprintln!("❌ Ollama is not reachable at {}", client.base_url());
        eprintln!("Start it with 'ollama serve' and try again.");
        std::process::exit(1);
    }

    println!("⬇️  Pulling {model}");
    let mut stdout = io::stdout();
    let mut last = String::new();
    client
        .pull_model(&model, |progress| {
            let line = progress_line(progress);
            if line != last {
                print!("\r\x1b[2K{line}");
                let _ = stdout.flush();
                last = line;
            }
        })
        .await?;
    println!();
    println!("✅ {model} is ready");
    Ok(())
}
