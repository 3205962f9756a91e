use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::builtin_providers::{default_model_for, find_builtin_provider, LOCAL_PROVIDER_ID};

pub const DEFAULT_SYSTEM_PROMPT: &str = "When writing math equations, use $$ ... $$ for display math and $ ... $ for inline math. For example: $$E = mc^2$$ or $x^2$. Do not use [ ] brackets for math.";

pub const DEFAULT_CODING_MODEL: &str = "qwen/qwen-2.5-coder-32b-instruct:free";
pub const DEFAULT_GENERAL_MODEL: &str = "google/gemini-2.0-flash-exp:free";

fn default_fallback_models() -> Vec<String> {
    [
        "meta-llama/llama-3.3-70b-instruct:free",
        "deepseek/deepseek-chat-v3-0324:free",
        "mistralai/mistral-7b-instruct:free",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Knobs for the blended local/cloud router.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RoutingConfig {
    /// Liveness probe timeout for the local daemon
    pub probe_timeout_secs: u64,
    /// Upper bound on the intent classification call
    pub classify_timeout_secs: u64,
    /// Upper bound on the background title request
    pub title_timeout_secs: u64,
    /// Local model used by auto routing (defaults to the Ollama built-in)
    pub local_model: Option<String>,
    pub coding_model: String,
    pub general_model: String,
    /// Tried in order after the routed cloud model fails
    pub fallback_models: Vec<String>,
    /// Conversations up to this many messages stay local when possible
    pub early_session_limit: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 3,
            classify_timeout_secs: 10,
            title_timeout_secs: 30,
            local_model: None,
            coding_model: DEFAULT_CODING_MODEL.to_string(),
            general_model: DEFAULT_GENERAL_MODEL.to_string(),
            fallback_models: default_fallback_models(),
            early_session_limit: 5,
        }
    }
}

impl RoutingConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    pub fn title_timeout(&self) -> Duration {
        Duration::from_secs(self.title_timeout_secs)
    }

    pub fn local_model(&self) -> String {
        self.local_model
            .clone()
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| default_model_for(LOCAL_PROVIDER_ID))
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL overrides keyed by provider id (e.g. a remote Ollama host)
    #[serde(default)]
    pub base_urls: HashMap<String, String>,
    /// Instruction sent ahead of every conversation; an empty string disables it
    pub system_prompt: Option<String>,
    /// Default tracing filter when no environment filter is set
    pub log_level: Option<String>,
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// Configured override, else the built-in endpoint, else empty.
    pub fn base_url_for(&self, provider: &str) -> String {
        self.base_urls
            .get(&provider.to_lowercase())
            .cloned()
            .or_else(|| find_builtin_provider(provider).map(|p| p.base_url))
            .unwrap_or_default()
    }

    pub fn set_base_url(&mut self, provider: &str, base_url: String) {
        self.base_urls.insert(provider.to_lowercase(), base_url);
    }

    pub fn system_prompt(&self) -> Option<String> {
        match self.system_prompt.as_deref() {
            Some("") => None,
            Some(prompt) => Some(prompt.to_string()),
            None => Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        if self.base_urls.is_empty() {
            println!("  base-urls: (built-in)");
        } else {
            println!("  base-urls:");
            let mut entries: Vec<_> = self.base_urls.iter().collect();
            entries.sort_by_key(|(k, _)| *k);
            for (provider, url) in entries {
                println!("    {provider}: {url}");
            }
        }
        match self.system_prompt() {
            Some(_) if self.system_prompt.is_none() => println!("  system-prompt: (default)"),
            Some(prompt) => println!("  system-prompt: {prompt}"),
            None => println!("  system-prompt: (disabled)"),
        }
        println!("  log-level: {}", self.log_level());
        let routing = &self.routing;
        println!("  routing:");
        println!("    local-model: {}", routing.local_model());
        println!("    coding-model: {}", routing.coding_model);
        println!("    general-model: {}", routing.general_model);
        println!(
            "    fallback-models: {}",
            routing.fallback_models.join(", ")
        );
        println!("    probe-timeout: {}s", routing.probe_timeout_secs);
    }
}
