//! Shared data model for providers, probes, and dispatch rounds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Whether a provider needs an API key to be queried at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialPolicy {
    Required,
    Optional,
}

/// Immutable descriptor for one remote text-generation backend.
///
/// Built once at registry construction and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    /// Unique registry key, e.g. "openai".
    pub name: String,
    /// Human-readable name used in report section headers, e.g. "OpenAI GPT".
    pub display_name: String,
    pub credential: CredentialPolicy,
    /// Ordered model candidates. More than one entry means the backend is
    /// known to silently reject specific model ids and the fallback cascade
    /// applies; a single entry skips the cascade.
    pub models: Vec<String>,
    /// Base endpoint the adapter talks to.
    pub endpoint: String,
}

impl ProviderIdentity {
    pub fn requires_credential(&self) -> bool {
        self.credential == CredentialPolicy::Required
    }
}

/// Cached connectivity state for one provider.
///
/// Written only by the connectivity probe; read by the orchestrator and by
/// status displays. Entries are never auto-expired — the caller decides
/// when a re-probe is due.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub provider: String,
    pub reachable: bool,
    pub checked_at: DateTime<Utc>,
}

/// The outcome of one provider query within a dispatch round.
///
/// Exactly one of content / error is present, expressed as a `Result`.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// Display name of the provider that produced this outcome.
    pub provider: String,
    pub result: Result<String, QueryError>,
}

impl RequestOutcome {
    pub fn success(provider: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            result: Ok(content.into()),
        }
    }

    pub fn failure(provider: impl Into<String>, error: QueryError) -> Self {
        Self {
            provider: provider.into(),
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Insertion-ordered outcomes of one dispatch round.
///
/// Order matches the caller's provider selection. Built incrementally by
/// the orchestrator and consumed once by the report persister.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    outcomes: Vec<RequestOutcome>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: RequestOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestOutcome> {
        self.outcomes.iter()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Successful (provider, content) pairs in selection order.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| {
            o.result
                .as_deref()
                .ok()
                .map(|content| (o.provider.as_str(), content))
        })
    }

    /// (provider, error) pairs for the failed entries, in selection order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &QueryError)> {
        self.outcomes.iter().filter_map(|o| {
            o.result
                .as_ref()
                .err()
                .map(|err| (o.provider.as_str(), err))
        })
    }

    pub fn failed_providers(&self) -> Vec<&str> {
        self.failures().map(|(provider, _)| provider).collect()
    }

    /// Human-readable round summary, e.g. "2 of 3 providers succeeded".
    pub fn summary(&self) -> String {
        format!(
            "{} of {} providers succeeded",
            self.success_count(),
            self.len()
        )
    }
}
