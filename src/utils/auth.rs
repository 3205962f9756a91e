//! Provider credential headers.

use crate::core::builtin_providers::find_builtin_provider;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Attach the credential in the scheme the provider expects.
///
/// Anthropic wants `x-api-key` plus a pinned `anthropic-version`; every other
/// provider takes a bearer token. An empty key sends no credential at all,
/// which is what the local daemon and keyless providers expect.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    provider_name: &str,
    api_key: &str,
) -> reqwest::RequestBuilder {
    if api_key.is_empty() {
        return request;
    }

    let anthropic = find_builtin_provider(provider_name)
        .map(|provider| provider.is_anthropic_mode())
        .unwrap_or(false);

    if anthropic {
        request
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    } else {
        request.header("Authorization", format!("Bearer {api_key}"))
    }
}
