//! Multi-provider adapter layer
//!
//! One adapter per remote backend: OpenAI, Anthropic, Google Gemini,
//! YandexGPT, Cohere, and Ollama (the credential-optional local endpoint).
//! Adapters implement the [`ProviderAdapter`] trait and are looked up by
//! key in a [`ProviderRegistry`] rather than dispatched through a chain of
//! string comparisons.

pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod ollama;
pub mod openai;
pub mod yandex;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cascade::run_cascade;
use crate::error::QueryError;
use crate::types::{CredentialPolicy, ProviderIdentity};

pub use anthropic::AnthropicAdapter;
pub use cohere::CohereAdapter;
pub use google::GoogleAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use yandex::YandexAdapter;

/// Bounded wait for every individual HTTP call an adapter makes.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the shared HTTP client adapters use. Each individual call carries
/// the 30 s attempt bound; cascades over several candidates get a longer
/// overall budget simply by making several bounded calls.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(ATTEMPT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
}

/// Trait that all provider adapters implement.
///
/// Adapters are stateless beyond their identity and HTTP client: they
/// perform a network call and return a classified result. Connection-status
/// caching belongs to the probe, not the adapter.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Immutable descriptor for this provider.
    fn identity(&self) -> &ProviderIdentity;

    /// One raw generation call against one concrete model id.
    async fn attempt(
        &self,
        question: &str,
        credential: Option<&str>,
        model: &str,
    ) -> Result<String, QueryError>;

    /// Cheapest possible authenticated call (list-models-equivalent) to
    /// classify the provider as reachable without consuming generation
    /// quota. Returns false on any transport or auth failure.
    async fn probe(&self, credential: Option<&str>) -> bool;

    /// Full query: validates inputs, then either honors `model_hint`
    /// directly, calls the single configured model, or walks the fallback
    /// cascade when several candidates are configured.
    async fn query(
        &self,
        question: &str,
        credential: Option<&str>,
        model_hint: Option<&str>,
    ) -> Result<String, QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::Unknown("question is empty".to_string()));
        }

        let identity = self.identity();
        let credential = credential.filter(|c| !c.trim().is_empty());
        if identity.credential == CredentialPolicy::Required && credential.is_none() {
            return Err(QueryError::MissingCredential);
        }

        if let Some(model) = model_hint {
            return self.attempt(question, credential, model).await;
        }

        match identity.models.as_slice() {
            [] => Err(QueryError::Unknown(
                "no model candidates configured".to_string(),
            )),
            [only] => self.attempt(question, credential, only).await,
            candidates => {
                run_cascade(candidates, |model| self.attempt(question, credential, model)).await
            }
        }
    }
}

/// Insertion-ordered registry of provider adapters, looked up by key.
pub struct ProviderRegistry {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// All built-in providers with their default endpoints, in the order
    /// they are presented to callers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenAiAdapter::new()));
        registry.register(Arc::new(AnthropicAdapter::new()));
        registry.register(Arc::new(GoogleAdapter::new()));
        registry.register(Arc::new(YandexAdapter::new()));
        registry.register(Arc::new(CohereAdapter::new()));
        registry.register(Arc::new(OllamaAdapter::new()));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.identity().name == name)
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.adapters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters
            .iter()
            .map(|a| a.identity().name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contents() {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec!["openai", "anthropic", "google", "yandex", "cohere", "ollama"]
        );
        assert!(registry.get("openai").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_exactly_one_credential_optional_provider() {
        let registry = ProviderRegistry::with_defaults();
        let optional: Vec<&str> = registry
            .iter()
            .filter(|a| !a.identity().requires_credential())
            .map(|a| a.identity().name.as_str())
            .collect();
        assert_eq!(optional, vec!["ollama"]);
    }

    #[tokio::test]
    async fn test_query_rejects_empty_question() {
        let registry = ProviderRegistry::with_defaults();
        let adapter = registry.get("openai").unwrap();
        let result = adapter.query("   ", Some("key"), None).await;
        assert!(matches!(result, Err(QueryError::Unknown(_))));
    }

    #[tokio::test]
    async fn test_query_rejects_missing_credential() {
        let registry = ProviderRegistry::with_defaults();
        let adapter = registry.get("anthropic").unwrap();

        let result = adapter.query("question", None, None).await;
        assert_eq!(result.unwrap_err(), QueryError::MissingCredential);

        // A blank credential counts as missing
        let result = adapter.query("question", Some("  "), None).await;
        assert_eq!(result.unwrap_err(), QueryError::MissingCredential);
    }
}
