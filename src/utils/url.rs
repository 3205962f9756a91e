//! Endpoint URL joining.

/// Strip trailing slashes so endpoint joins never produce `//`.
///
/// ```
/// use splitchat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a provider base URL and an endpoint path.
///
/// ```
/// use splitchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://openrouter.ai/api/v1/", "/chat/completions"),
///     "https://openrouter.ai/api/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim_start_matches('/');
    let base = normalize_base_url(base_url);
    if endpoint.is_empty() {
        return format!("{base}/");
    }
    format!("{base}/{endpoint}")
}
