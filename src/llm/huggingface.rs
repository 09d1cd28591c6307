//! Hosted text-generation endpoint (Hugging Face Inference API shape)

use super::types::{GeneratedText, LlmRequest, LlmResponse};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Inference API service implementation
pub struct HuggingFaceService {
    client: Client,
    api_token: String,
    url: String,
    model_id: String,
}

impl HuggingFaceService {
    pub fn new(
        api_token: String,
        base_url: &str,
        model_id: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_token,
            url: format!("{}/models/{model_id}", base_url.trim_end_matches('/')),
            model_id: model_id.to_string(),
        })
    }

    #[cfg(test)]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn normalize_response(body: &str) -> Result<LlmResponse, LlmError> {
        let parsed: Vec<GeneratedText> = serde_json::from_str(body)
            .map_err(|e| LlmError::malformed(format!("Unexpected response shape: {e}")))?;

        parsed
            .into_iter()
            .next()
            .map(|g| LlmResponse::new(g.generated_text))
            .ok_or_else(|| LlmError::malformed("Response contained no generations"))
    }
}

#[async_trait]
impl LlmService for HuggingFaceService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &body));
        }

        Self::normalize_response(&body)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
