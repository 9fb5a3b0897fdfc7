//! Ollama adapter — the credential-optional local inference endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderAdapter, http_client};
use crate::error::QueryError;
use crate::types::{CredentialPolicy, ProviderIdentity};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama runs without authentication, so this is the one provider that is
/// queried and probed even when no credential is configured.
pub struct OllamaAdapter {
    identity: ProviderIdentity,
    client: Client,
    base_url: String,
}

impl OllamaAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            identity: ProviderIdentity {
                name: "ollama".to_string(),
                display_name: "Ollama".to_string(),
                credential: CredentialPolicy::Optional,
                models: vec!["llama3".to_string()],
                endpoint: base_url.clone(),
            },
            client: http_client(),
            base_url,
        }
    }
}

impl Default for OllamaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn attempt(
        &self,
        question: &str,
        _credential: Option<&str>,
        model: &str,
    ) -> Result<String, QueryError> {
        let request = GenerateRequest {
            model,
            prompt: question,
            stream: false,
        };

        debug!(model = %model, "Ollama generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(QueryError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::from_status(status, body));
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| QueryError::Upstream {
                status: status.as_u16(),
                detail: format!("malformed response: {e}"),
            })?;

        Ok(parsed.response)
    }

    async fn probe(&self, _credential: Option<&str>) -> bool {
        let result = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_serialization_disables_streaming() {
        let request = GenerateRequest {
            model: "llama3",
            prompt: "question",
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn test_attempt_without_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3",
                "response": "Local answer.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = OllamaAdapter::with_base_url(server.uri());
        let result = adapter.attempt("question", None, "llama3").await;
        assert_eq!(result.unwrap(), "Local answer.");
    }

    #[tokio::test]
    async fn test_query_allows_missing_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Answer."
            })))
            .mount(&server)
            .await;

        let adapter = OllamaAdapter::with_base_url(server.uri());
        // Credential-optional: query must not fail validation without a key
        let result = adapter.query("question", None, None).await;
        assert_eq!(result.unwrap(), "Answer.");
    }

    #[tokio::test]
    async fn test_probe_without_credential_issues_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "models": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let adapter = OllamaAdapter::with_base_url(server.uri());
        assert!(adapter.probe(None).await);
    }

    #[tokio::test]
    async fn test_probe_false_when_daemon_down() {
        // Connecting to a closed port must classify as unreachable
        let adapter = OllamaAdapter::with_base_url("http://127.0.0.1:1".to_string());
        assert!(!adapter.probe(None).await);
    }
}
