//! Cohere generate adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderAdapter, http_client};
use crate::error::QueryError;
use crate::types::{CredentialPolicy, ProviderIdentity};

pub const DEFAULT_ENDPOINT: &str = "https://api.cohere.ai";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

pub struct CohereAdapter {
    identity: ProviderIdentity,
    client: Client,
    base_url: String,
}

impl CohereAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            identity: ProviderIdentity {
                name: "cohere".to_string(),
                display_name: "Cohere".to_string(),
                credential: CredentialPolicy::Required,
                models: vec!["command".to_string()],
                endpoint: base_url.clone(),
            },
            client: http_client(),
            base_url,
        }
    }
}

impl Default for CohereAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Deserialize)]
struct Generation {
    text: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

fn classify_error(status: reqwest::StatusCode, body: &str) -> QueryError {
    if let Ok(parsed) = serde_json::from_str::<ApiError>(body) {
        return QueryError::from_status(status, parsed.message);
    }
    QueryError::from_status(status, body.to_string())
}

#[async_trait]
impl ProviderAdapter for CohereAdapter {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn attempt(
        &self,
        question: &str,
        credential: Option<&str>,
        model: &str,
    ) -> Result<String, QueryError> {
        let request = GenerateRequest {
            model,
            prompt: question,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!(model = %model, "Cohere generate request");

        let response = self
            .client
            .post(format!("{}/v1/generate", self.base_url))
            .bearer_auth(credential.unwrap_or_default())
            .json(&request)
            .send()
            .await
            .map_err(QueryError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| QueryError::Upstream {
                status: status.as_u16(),
                detail: format!("malformed response: {e}"),
            })?;

        parsed
            .generations
            .into_iter()
            .next()
            .map(|g| g.text)
            .ok_or_else(|| QueryError::Upstream {
                status: status.as_u16(),
                detail: "response contained no generations".to_string(),
            })
    }

    async fn probe(&self, credential: Option<&str>) -> bool {
        let result = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(credential.unwrap_or_default())
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
