//! First-run provider setup

use std::error::Error;

use crate::core::backends::OllamaClient;
use crate::core::builtin_providers::LOCAL_PROVIDER_ID;
use crate::core::config::Config;
use crate::core::session::{SessionStore, SetupChoice, SetupError};

pub async fn run_setup(
    store: &mut SessionStore,
    config: &Config,
    provider: String,
    model: Option<String>,
    api_key: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let choice = SetupChoice {
        provider: provider.to_lowercase(),
        model,
        api_key,
    };

    match store.complete_setup(choice) {
        Ok(()) => {
            let state = store.state();
            println!("✅ Using {} with model {}", state.provider, state.default_config().model);
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ Setup failed: {err}");
            let fixes = quick_fixes(&err, config).await;
            if !fixes.is_empty() {
                eprintln!();
                eprintln!("💡 Quick fixes:");
                for fix in fixes {
                    eprintln!("  • {fix}");
                }
            }
            std::process::exit(1);
        }
    }
}

async fn quick_fixes(err: &SetupError, config: &Config) -> Vec<String> {
    match err {
        SetupError::UnknownProvider(_) => {
            vec!["Run 'splitchat providers' to see the available providers".to_string()]
        }
        SetupError::MissingApiKey(id) => {
            vec![format!("Pass a key: splitchat setup {id} --api-key <KEY>")]
        }
        SetupError::MissingModel(_) => {
            let client = OllamaClient::new(
                reqwest::Client::new(),
                config.base_url_for(LOCAL_PROVIDER_ID),
            );
            let installed = client.list_models().await.unwrap_or_default();
            let mut fixes: Vec<String> = installed
                .into_iter()
                .map(|model| format!("splitchat setup ollama --model {}", model.name))
                .collect();
            if fixes.is_empty() {
                let model = config.routing.local_model();
                fixes.push(format!("Download a model first: splitchat pull {model}"));
                fixes.push(format!("Then: splitchat setup ollama --model {model}"));
            }
            fixes
        }
    }
}
