//! Shared HTTP plumbing for provider clients

use docsum_common::{DocsumError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::types::ProviderId;

/// Build the transport used for model calls
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DocsumError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, mapping non-2xx replies to LLM errors
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: ProviderId,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| DocsumError::network(format!("Failed to send {} request: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("{} API rejected request - Status: {}", provider, status);
        return Err(DocsumError::llm(format!(
            "{} API error ({}): {}",
            provider,
            status.as_u16(),
            body.trim()
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| DocsumError::llm(format!("Failed to parse {} response: {}", provider, e)))
}

/// Send a request and report whether it was accepted
pub(crate) async fn probe(request: RequestBuilder, provider: ProviderId) -> Result<bool> {
    let response = request
        .send()
        .await
        .map_err(|e| DocsumError::network(format!("Failed to connect to {}: {}", provider, e)))?;
    Ok(response.status().is_success())
}
