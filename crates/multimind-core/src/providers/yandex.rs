//! YandexGPT foundation-models adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderAdapter, http_client};
use crate::error::QueryError;
use crate::types::{CredentialPolicy, ProviderIdentity};

pub const DEFAULT_ENDPOINT: &str = "https://llm.api.cloud.yandex.net";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.6;

/// YandexGPT accepts exactly one model path, addressed through the
/// credential-scoped model URI, so the fallback cascade never applies.
pub struct YandexAdapter {
    identity: ProviderIdentity,
    client: Client,
    base_url: String,
}

impl YandexAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            identity: ProviderIdentity {
                name: "yandex".to_string(),
                display_name: "YandexGPT".to_string(),
                credential: CredentialPolicy::Required,
                models: vec!["yandexgpt/latest".to_string()],
                endpoint: base_url.clone(),
            },
            client: http_client(),
            base_url,
        }
    }
}

impl Default for YandexAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    text: String,
}

#[async_trait]
impl ProviderAdapter for YandexAdapter {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn attempt(
        &self,
        question: &str,
        credential: Option<&str>,
        model: &str,
    ) -> Result<String, QueryError> {
        let key = credential.unwrap_or_default();
        let request = CompletionRequest {
            // The folder identifier doubles as the model URI scope.
            model_uri: format!("gpt://{key}/{model}"),
            completion_options: CompletionOptions {
                stream: false,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            },
            messages: vec![Message {
                role: "user",
                text: question,
            }],
        };

        debug!(model = %model, "YandexGPT completion request");

        let response = self
            .client
            .post(format!(
                "{}/foundationModels/v1/completion",
                self.base_url
            ))
            .header("Authorization", format!("Api-Key {key}"))
            .json(&request)
            .send()
            .await
            .map_err(QueryError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::from_status(status, body));
        }

        let parsed: CompletionResponse =
            response.json().await.map_err(|e| QueryError::Upstream {
                status: status.as_u16(),
                detail: format!("malformed response: {e}"),
            })?;

        parsed
            .result
            .alternatives
            .into_iter()
            .next()
            .map(|a| a.message.text)
            .ok_or_else(|| QueryError::Upstream {
                status: status.as_u16(),
                detail: "response contained no alternatives".to_string(),
            })
    }

    /// Yandex exposes no cheap list-models call on this host; a GET against
    /// the completion endpoint still reveals whether the host answers and
    /// whether the key is rejected outright.
    async fn probe(&self, credential: Option<&str>) -> bool {
        let result = self
            .client
            .get(format!(
                "{}/foundationModels/v1/completion",
                self.base_url
            ))
            .header(
                "Authorization",
                format!("Api-Key {}", credential.unwrap_or_default()),
            )
            .send()
            .await;

        match result {
            Ok(response) => !matches!(response.status().as_u16(), 401 | 403),
            Err(_) => false,
        }
    }
}
