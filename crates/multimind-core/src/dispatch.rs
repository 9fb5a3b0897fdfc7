//! Dispatch orchestration for one question across selected providers
//!
//! A round validates its inputs up front, then queries each selected
//! provider sequentially in caller order. Per-provider failures are
//! recorded and the round moves on — partial failure is the normal case,
//! not an abort condition. Sequential dispatch keeps rate limits and log
//! ordering predictable; the per-provider call sits behind
//! [`crate::providers::ProviderAdapter`] so a fan-out strategy could be
//! swapped in without touching the adapters.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{DispatchError, QueryError};
use crate::probe::network_available;
use crate::providers::ProviderRegistry;
use crate::types::{RequestOutcome, ResultSet};

const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DispatchOrchestrator {
    registry: Arc<ProviderRegistry>,
    preflight: bool,
}

impl DispatchOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            preflight: true,
        }
    }

    /// Skip the round-level network pre-flight check. Meant for embedders
    /// that already know connectivity state and for tests against local
    /// mock servers.
    pub fn without_preflight(mut self) -> Self {
        self.preflight = false;
        self
    }

    /// Run one dispatch round.
    ///
    /// Validation is fail-fast and happens before any network activity:
    /// the selection must be non-empty, every name must be registered, and
    /// every credential-requiring provider must have a non-blank key.
    /// After validation the returned set always contains exactly one entry
    /// per selected provider, successful or error-tagged — entries are
    /// never dropped.
    pub async fn dispatch(
        &self,
        question: &str,
        selected: &[String],
        credentials: &HashMap<String, String>,
    ) -> Result<ResultSet, DispatchError> {
        if selected.is_empty() {
            return Err(DispatchError::EmptySelection);
        }

        let mut round = Vec::with_capacity(selected.len());
        for name in selected {
            let adapter = self
                .registry
                .get(name)
                .ok_or_else(|| DispatchError::UnknownProvider(name.clone()))?;
            let credential = credentials
                .get(name)
                .map(String::as_str)
                .filter(|c| !c.trim().is_empty())
                .map(str::to_string);

            if adapter.identity().requires_credential() && credential.is_none() {
                return Err(DispatchError::MissingCredential(name.clone()));
            }
            round.push((adapter, credential));
        }

        let mut results = ResultSet::new();

        if self.preflight && !network_available(PREFLIGHT_TIMEOUT).await {
            warn!("network pre-flight failed, skipping all provider calls");
            for (adapter, _) in &round {
                results.push(RequestOutcome::failure(
                    adapter.identity().display_name.clone(),
                    QueryError::NoNetwork,
                ));
            }
            return Ok(results);
        }

        info!(
            providers = round.len(),
            question_chars = question.len(),
            "starting dispatch round"
        );

        for (adapter, credential) in round {
            let identity = adapter.identity();
            info!(provider = %identity.name, "querying provider");

            match adapter.query(question, credential.as_deref(), None).await {
                Ok(content) => {
                    info!(
                        provider = %identity.name,
                        chars = content.len(),
                        "provider answered"
                    );
                    results.push(RequestOutcome::success(
                        identity.display_name.clone(),
                        content,
                    ));
                }
                Err(err) => {
                    warn!(
                        provider = %identity.name,
                        kind = err.kind(),
                        error = %err,
                        "provider failed"
                    );
                    results.push(RequestOutcome::failure(
                        identity.display_name.clone(),
                        err,
                    ));
                }
            }
        }

        info!("dispatch round finished: {}", results.summary());
        Ok(results)
    }
}
