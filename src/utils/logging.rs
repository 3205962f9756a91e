//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "SPLITCHAT_LOG";

/// Pick the filter directive: `SPLITCHAT_LOG`, then `RUST_LOG`, then `default_level`.
pub fn resolve_filter(
    app_env: Option<String>,
    rust_env: Option<String>,
    default_level: &str,
) -> String {
    app_env
        .filter(|value| !value.trim().is_empty())
        .or_else(|| rust_env.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| default_level.to_string())
}

/// Install the stderr subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(default_level: &str) {
    let directive = resolve_filter(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        default_level,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_variable_wins() {
        assert_eq!(
            resolve_filter(Some("debug".into()), Some("info".into()), "warn"),
            "debug"
        );
    }

    #[test]
    fn falls_back_through_rust_log_to_default() {
        assert_eq!(resolve_filter(None, Some("info".into()), "warn"), "info");
        assert_eq!(resolve_filter(Some("  ".into()), None, "warn"), "warn");
    }
}
