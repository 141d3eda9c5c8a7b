//! Stable provider construction surface for facade consumers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::{CredentialPool, ModelProvider, ProviderError, RotatingEmbedder};

pub fn default_http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))
}

#[cfg(feature = "provider-gemini")]
pub fn build_gemini_provider(
    client: Client,
    pool: Arc<CredentialPool>,
    model: impl Into<String>,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    Ok(Arc::new(rprovider::gemini::GeminiProvider::new(
        client, pool, model,
    )))
}

#[cfg(not(feature = "provider-gemini"))]
pub fn build_gemini_provider(
    _client: Client,
    _pool: Arc<CredentialPool>,
    _model: impl Into<String>,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-gemini feature is not enabled on remedy",
    ))
}

#[cfg(feature = "provider-gemini")]
pub fn gemini_embedder_factory(
    client: Client,
    model: impl Into<String>,
) -> Arc<dyn crate::EmbedderFactory> {
    let model = model.into();
    Arc::new(move |api_key: &str| {
        Arc::new(rprovider::gemini::GeminiEmbedder::new(
            client.clone(),
            model.clone(),
            api_key,
        )) as Arc<dyn crate::Embedder>
    })
}

#[cfg(feature = "provider-gemini")]
pub fn build_rotating_embedder(
    client: Client,
    pool: Arc<CredentialPool>,
    model: impl Into<String>,
) -> Result<RotatingEmbedder, ProviderError> {
    RotatingEmbedder::new(pool, gemini_embedder_factory(client, model))
}

#[cfg(not(feature = "provider-gemini"))]
pub fn build_rotating_embedder(
    _client: Client,
    _pool: Arc<CredentialPool>,
    _model: impl Into<String>,
) -> Result<RotatingEmbedder, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-gemini feature is not enabled on remedy",
    ))
}
