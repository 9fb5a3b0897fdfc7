//! Google Gemini generateContent adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ProviderAdapter, http_client};
use crate::error::QueryError;
use crate::types::{CredentialPolicy, ProviderIdentity};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

pub struct GoogleAdapter {
    identity: ProviderIdentity,
    client: Client,
    base_url: String,
}

impl GoogleAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            identity: ProviderIdentity {
                name: "google".to_string(),
                display_name: "Google Gemini".to_string(),
                credential: CredentialPolicy::Required,
                models: vec![
                    "gemini-1.5-flash".to_string(),
                    "gemini-1.5-pro".to_string(),
                    "gemini-pro".to_string(),
                ],
                endpoint: base_url.clone(),
            },
            client: http_client(),
            base_url,
        }
    }
}

impl Default for GoogleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
    /// Canonical gRPC status name, e.g. "NOT_FOUND" or "PERMISSION_DENIED".
    #[serde(default)]
    status: Option<String>,
}

fn classify_error(status: reqwest::StatusCode, body: &str) -> QueryError {
    if let Ok(parsed) = serde_json::from_str::<ApiError>(body) {
        match parsed.error.status.as_deref() {
            Some("NOT_FOUND") => return QueryError::ModelUnavailable(parsed.error.message),
            Some("RESOURCE_EXHAUSTED") => return QueryError::RateLimited(parsed.error.message),
            _ => return QueryError::from_status(status, parsed.error.message),
        }
    }
    QueryError::from_status(status, body.to_string())
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
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
            contents: vec![Content {
                parts: vec![Part { text: question }],
            }],
        };

        debug!(model = %model, "Gemini generateContent request");

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .query(&[("key", credential.unwrap_or_default())])
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
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| QueryError::Upstream {
                status: status.as_u16(),
                detail: "response contained no candidates".to_string(),
            })
    }

    async fn probe(&self, credential: Option<&str>) -> bool {
        let result = self
            .client
            .get(format!("{}/v1beta/models", self.base_url))
            .query(&[("key", credential.unwrap_or_default())])
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
