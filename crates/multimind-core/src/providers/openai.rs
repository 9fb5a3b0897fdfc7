//! OpenAI chat-completions adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderAdapter, http_client};
use crate::error::QueryError;
use crate::types::{CredentialPolicy, ProviderIdentity};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Fixed system preamble sent with every question.
const SYSTEM_PREAMBLE: &str = "Вы - полезный ассистент.";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

pub struct OpenAiAdapter {
    identity: ProviderIdentity,
    client: Client,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT.to_string())
    }

    /// Point the adapter at a different endpoint (used by tests).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            identity: ProviderIdentity {
                name: "openai".to_string(),
                display_name: "OpenAI GPT".to_string(),
                credential: CredentialPolicy::Required,
                models: vec!["gpt-4o-mini".to_string(), "gpt-3.5-turbo".to_string()],
                endpoint: base_url.clone(),
            },
            client: http_client(),
            base_url,
        }
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Prefer the structured error body over the bare status line. The `code`
/// field distinguishes a rejected model id from other client errors.
fn classify_error(status: reqwest::StatusCode, body: &str) -> QueryError {
    if let Ok(parsed) = serde_json::from_str::<ApiError>(body) {
        if parsed.error.code.as_deref() == Some("model_not_found") {
            return QueryError::ModelUnavailable(parsed.error.message);
        }
        return QueryError::from_status(status, parsed.error.message);
    }
    QueryError::from_status(status, body.to_string())
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn attempt(
        &self,
        question: &str,
        credential: Option<&str>,
        model: &str,
    ) -> Result<String, QueryError> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PREAMBLE,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!(model = %model, "OpenAI chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
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

        let parsed: ChatResponse = response.json().await.map_err(|e| QueryError::Upstream {
            status: status.as_u16(),
            detail: format!("malformed response: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| QueryError::Upstream {
                status: status.as_u16(),
                detail: "response contained no choices".to_string(),
            })
    }

    async fn probe(&self, credential: Option<&str>) -> bool {
        let result = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(credential.unwrap_or_default())
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
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PREAMBLE,
                },
                ChatMessage {
                    role: "user",
                    content: "Сколько будет 2+2?",
                },
            ],
            max_tokens: 1000,
            temperature: 0.7,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], SYSTEM_PREAMBLE);
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_response_deserialization() {
        let json = serde_json::json!({
            "id": "chatcmpl-123",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Four." } }
            ]
        });
        let parsed: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Four.");
    }

    #[test]
    fn test_classify_structured_model_error() {
        let body = r#"{"error":{"message":"The model `gpt-9` does not exist","type":"invalid_request_error","code":"model_not_found"}}"#;
        let err = classify_error(reqwest::StatusCode::NOT_FOUND, body);
        assert!(matches!(err, QueryError::ModelUnavailable(_)));
    }

    #[test]
    fn test_classify_unstructured_body_falls_back_to_status() {
        let err = classify_error(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(
            err,
            QueryError::Upstream {
                status: 502,
                detail: "<html>oops</html>".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_attempt_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "Answer." } } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(server.uri());
        let result = adapter.attempt("question", Some("sk-test"), "gpt-4o-mini").await;
        assert_eq!(result.unwrap(), "Answer.");
    }

    #[tokio::test]
    async fn test_attempt_classifies_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(server.uri());
        let err = adapter
            .attempt("question", Some("bad"), "gpt-4o-mini")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_attempt_classifies_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached", "type": "rate_limit_error" }
            })))
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(server.uri());
        let err = adapter
            .attempt("question", Some("sk-test"), "gpt-4o-mini")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_query_cascades_to_second_model() {
        let server = MockServer::start().await;
        // First candidate is rejected as an unknown model, second succeeds.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({"model": "gpt-4o-mini"}),
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "message": "model not found", "code": "model_not_found" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({"model": "gpt-3.5-turbo"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "fallback answer" } } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(server.uri());
        let result = adapter.query("question", Some("sk-test"), None).await;
        assert_eq!(result.unwrap(), "fallback answer");
    }

    #[tokio::test]
    async fn test_probe_checks_models_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(bearer_token("sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(server.uri());
        assert!(adapter.probe(Some("sk-test")).await);
    }

    #[tokio::test]
    async fn test_probe_false_on_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(server.uri());
        assert!(!adapter.probe(Some("bad")).await);
    }
}
