use crate::core::builtin_providers::{load_builtin_providers, BuiltinProvider, ProviderMode};
use crate::core::config::Config;
use crate::core::session::SessionState;

pub fn list_providers(config: &Config, state: &SessionState) {
    println!("🔌 Providers");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for provider in load_builtin_providers() {
        println!("{}", provider_line(config, state, &provider));
    }
    println!();
    println!("* = session provider");
}

pub fn provider_line(config: &Config, state: &SessionState, provider: &BuiltinProvider) -> String {
    let marker = if state.provider.eq_ignore_ascii_case(&provider.id) {
        "*"
    } else {
        " "
    };
    let credential = match provider.mode {
        ProviderMode::Ollama => "local",
        ProviderMode::Auto => "routed",
        _ if !state.api_key(&provider.id).is_empty() => "✅",
        _ if provider.requires_key => "❌",
        _ => "optional",
    };
    let base_url = config.base_url_for(&provider.id);
    let endpoint = if base_url.is_empty() {
        "-".to_string()
    } else {
        base_url
    };
    format!(
        "{marker}{:<12} {:<22} {:<40} {credential}",
        provider.id, provider.display_name, endpoint
    )
}
