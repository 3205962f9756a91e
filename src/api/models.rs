use crate::api::{ModelInfo, ModelsResponse, OllamaModel, OllamaTagsResponse};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

async fn read_failure(response: reqwest::Response) -> FetchError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    format!("API request failed with status {status}: {error_text}").into()
}

/// List the catalog of an OpenAI-compatible provider, sorted by id.
pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    provider_name: &str,
) -> Result<Vec<ModelInfo>, FetchError> {
    let models_url = construct_api_url(base_url, "models");
    let request = client
        .get(models_url)
        .header("Content-Type", "application/json");
    let request = add_auth_headers(request, provider_name, api_key);

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(read_failure(response).await);
    }

    let mut models = response.json::<ModelsResponse>().await?.data;
    sort_models(&mut models);
    Ok(models)
}

/// List models installed on the local daemon.
pub async fn fetch_local_models(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<Vec<OllamaModel>, FetchError> {
    let response = client
        .get(construct_api_url(base_url, "api/tags"))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(read_failure(response).await);
    }

    let mut models = response.json::<OllamaTagsResponse>().await?.models;
    models.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(models)
}

pub fn sort_models(models: &mut [ModelInfo]) {
    models.sort_by(|a, b| a.id.cmp(&b.id));
}
