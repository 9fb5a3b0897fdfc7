//! Connectivity probing and the shared connection-status store
//!
//! The probe loop runs on a background task, decoupled from the foreground
//! dispatch path; both sides share the same [`StatusStore`], which is why
//! the store is an explicitly synchronized map rather than ad hoc fields.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::providers::ProviderRegistry;
use crate::types::ConnectionStatus;

/// Default pause between two provider probes in one round. Keeps the probe
/// loop from bursting several hosts back to back.
pub const DEFAULT_INTER_PROBE_DELAY: Duration = Duration::from_secs(2);

/// Address used for the round-level network pre-flight check.
const PREFLIGHT_ADDR: &str = "1.1.1.1:443";

/// Mutex-guarded map of per-provider connection statuses.
///
/// Entries are written whole and never partially updated; stale entries
/// stay until the next probe round overwrites them.
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<Mutex<HashMap<String, ConnectionStatus>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, provider: &str, reachable: bool) {
        let status = ConnectionStatus {
            provider: provider.to_string(),
            reachable,
            checked_at: Utc::now(),
        };
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        guard.insert(provider.to_string(), status);
    }

    pub fn get(&self, provider: &str) -> Option<ConnectionStatus> {
        let guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        guard.get(provider).cloned()
    }

    /// All known statuses, sorted by provider name for stable display.
    pub fn snapshot(&self) -> Vec<ConnectionStatus> {
        let guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let mut statuses: Vec<ConnectionStatus> = guard.values().cloned().collect();
        statuses.sort_by(|a, b| a.provider.cmp(&b.provider));
        statuses
    }
}

/// Sequentially probes every registered provider and records the results.
#[derive(Clone)]
pub struct ConnectivityProbe {
    registry: Arc<ProviderRegistry>,
    store: StatusStore,
    inter_probe_delay: Duration,
}

impl ConnectivityProbe {
    pub fn new(registry: Arc<ProviderRegistry>, store: StatusStore) -> Self {
        Self {
            registry,
            store,
            inter_probe_delay: DEFAULT_INTER_PROBE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_probe_delay = delay;
        self
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// One probe round: providers in registry order, one at a time, with a
    /// fixed delay in between. A required credential that is missing or
    /// blank short-circuits to unreachable without a network call; the
    /// credential-optional provider is always probed.
    pub async fn probe_all(&self, credentials: &HashMap<String, String>) {
        let total = self.registry.len();
        for (index, adapter) in self.registry.iter().enumerate() {
            let identity = adapter.identity();
            let credential = credentials
                .get(&identity.name)
                .map(String::as_str)
                .filter(|c| !c.trim().is_empty());

            let reachable = if identity.requires_credential() && credential.is_none() {
                debug!(provider = %identity.name, "no credential configured, skipping network probe");
                false
            } else {
                adapter.probe(credential).await
            };

            self.store.record(&identity.name, reachable);
            info!(provider = %identity.name, reachable, "connectivity probe");

            if index + 1 < total {
                tokio::time::sleep(self.inter_probe_delay).await;
            }
        }
    }

    /// Run probe rounds on a background task until cancelled, pausing
    /// `interval` between rounds.
    pub fn spawn_loop(
        &self,
        interval: Duration,
        credentials: HashMap<String, String>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let probe = self.clone();
        tokio::spawn(async move {
            loop {
                probe.probe_all(&credentials).await;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("probe loop stopped");
        })
    }
}

/// Round-level pre-flight: can we reach the outside network at all?
///
/// A failed TCP connect here means provider calls are pointless and the
/// whole round classifies as `NoNetwork` without touching any provider.
pub async fn network_available(timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, tokio::net::TcpStream::connect(PREFLIGHT_ADDR)).await,
        Ok(Ok(_))
    )
}
