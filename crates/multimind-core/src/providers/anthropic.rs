//! Anthropic messages adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderAdapter, http_client};
use crate::error::QueryError;
use crate::types::{CredentialPolicy, ProviderIdentity};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;

pub struct AnthropicAdapter {
    identity: ProviderIdentity,
    client: Client,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            identity: ProviderIdentity {
                name: "anthropic".to_string(),
                display_name: "Anthropic Claude".to_string(),
                credential: CredentialPolicy::Required,
                models: vec![
                    "claude-3-5-haiku-latest".to_string(),
                    "claude-3-haiku-20240307".to_string(),
                ],
                endpoint: base_url.clone(),
            },
            client: http_client(),
            base_url,
        }
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: String,
}

fn classify_error(status: reqwest::StatusCode, body: &str) -> QueryError {
    if let Ok(parsed) = serde_json::from_str::<ApiError>(body) {
        if parsed.error.kind.as_deref() == Some("not_found_error") {
            return QueryError::ModelUnavailable(parsed.error.message);
        }
        return QueryError::from_status(status, parsed.error.message);
    }
    QueryError::from_status(status, body.to_string())
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn attempt(
        &self,
        question: &str,
        credential: Option<&str>,
        model: &str,
    ) -> Result<String, QueryError> {
        let request = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: question,
            }],
        };

        debug!(model = %model, "Anthropic messages request");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", credential.unwrap_or_default())
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(QueryError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| QueryError::Upstream {
                status: status.as_u16(),
                detail: format!("malformed response: {e}"),
            })?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| QueryError::Upstream {
                status: status.as_u16(),
                detail: "response contained no text block".to_string(),
            })
    }

    async fn probe(&self, credential: Option<&str>) -> bool {
        let result = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .header("x-api-key", credential.unwrap_or_default())
            .header("anthropic-version", API_VERSION)
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
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: "claude-3-5-haiku-latest",
            max_tokens: 1000,
            messages: vec![Message {
                role: "user",
                content: "question",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-5-haiku-latest");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_takes_first_text_block() {
        let json = serde_json::json!({
            "content": [
                { "type": "text", "text": "Hello." }
            ],
            "stop_reason": "end_turn"
        });
        let parsed: MessagesResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.content[0].text.as_deref(), Some("Hello."));
    }

    #[test]
    fn test_classify_not_found_error_type() {
        let body = r#"{"type":"error","error":{"type":"not_found_error","message":"model: claude-9"}}"#;
        let err = classify_error(reqwest::StatusCode::NOT_FOUND, body);
        assert!(matches!(err, QueryError::ModelUnavailable(_)));
    }

    #[test]
    fn test_classify_authentication_error() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err = classify_error(reqwest::StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err,
            QueryError::Authentication("invalid x-api-key".to_string())
        );
    }

    #[tokio::test]
    async fn test_attempt_sends_version_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [ { "type": "text", "text": "Answer." } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = AnthropicAdapter::with_base_url(server.uri());
        let result = adapter
            .attempt("question", Some("sk-ant-test"), "claude-3-5-haiku-latest")
            .await;
        assert_eq!(result.unwrap(), "Answer.");
    }

    #[tokio::test]
    async fn test_probe_uses_models_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = AnthropicAdapter::with_base_url(server.uri());
        assert!(adapter.probe(Some("sk-ant-test")).await);
    }
}
