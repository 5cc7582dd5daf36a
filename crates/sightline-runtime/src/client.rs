//! Resilient wrapper around the upstream provider.
//!
//! Every upstream operation goes through the same envelope: ask the
//! circuit breaker for permission, bound each attempt with a timeout,
//! retry retryable failures with exponential backoff, and feed the final
//! outcome back into the circuit. Caching is deliberately NOT here: the
//! resolver owns it, so caching policy and resilience policy stay
//! independently testable.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use backon::Retryable;

use crate::provider::{
    ObservationCount, ObservationQuery, ObservationSummary, PlaceRecord, ProviderError,
    TaxonomyProvider, TaxonRecord,
};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig};

/// Errors from resilient upstream calls.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// The query resolved to nothing; the upstream itself is healthy.
    #[error("not found upstream")]
    NotFound,

    /// The circuit is open; no network attempt was made.
    #[error("circuit open, retry in {retry_in:?}")]
    CircuitOpen { retry_in: Duration },

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("upstream unavailable: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound => ClientError::NotFound,
            ProviderError::RateLimited { retry_after } => ClientError::RateLimited { retry_after },
            ProviderError::ServiceUnavailable { status, message } => {
                ClientError::Upstream { status, message }
            }
            ProviderError::Timeout(d) => ClientError::Timeout(d),
            ProviderError::Transport(msg) => ClientError::Transport(msg),
            ProviderError::Parse(msg) => ClientError::Malformed(msg),
        }
    }
}

/// Configuration for the resilient client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilientClientConfig {
    /// Per-attempt deadline
    #[serde(with = "crate::config::duration_str")]
    pub request_timeout: Duration,

    pub retry: RetryConfig,

    pub circuit: CircuitBreakerConfig,
}

impl Default for ResilientClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            circuit: CircuitBreakerConfig::default(),
        }
    }
}

/// The only component that talks to the network.
pub struct ResilientClient {
    provider: Arc<dyn TaxonomyProvider>,
    config: ResilientClientConfig,
    circuit: CircuitBreaker,
}

impl ResilientClient {
    /// Wrap a provider with the default resilience policy.
    pub fn new(provider: Arc<dyn TaxonomyProvider>) -> Self {
        Self::with_config(provider, ResilientClientConfig::default())
    }

    pub fn with_config(provider: Arc<dyn TaxonomyProvider>, config: ResilientClientConfig) -> Self {
        let circuit = CircuitBreaker::new(config.circuit.clone());
        Self {
            provider,
            config,
            circuit,
        }
    }

    pub async fn search_taxa(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TaxonRecord>, ClientError> {
        self.call("search_taxa", || self.provider.search_taxa(query, limit))
            .await
    }

    pub async fn taxon_detail(&self, taxon_id: u64) -> Result<TaxonRecord, ClientError> {
        self.call("taxon_detail", || self.provider.taxon_detail(taxon_id))
            .await
    }

    pub async fn search_places(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaceRecord>, ClientError> {
        self.call("search_places", || self.provider.search_places(query, limit))
            .await
    }

    pub async fn count_observations(
        &self,
        query: &ObservationQuery,
    ) -> Result<ObservationCount, ClientError> {
        self.call("count_observations", || {
            self.provider.count_observations(query)
        })
        .await
    }

    pub async fn recent_observations(
        &self,
        query: &ObservationQuery,
        limit: u32,
    ) -> Result<Vec<ObservationSummary>, ClientError> {
        self.call("recent_observations", || {
            self.provider.recent_observations(query, limit)
        })
        .await
    }

    /// Current circuit state (for diagnostics and tests).
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit.state()
    }

    /// Reset the circuit for a fresh run.
    pub fn reset_circuit(&self) {
        self.circuit.reset();
    }

    /// The shared resilience envelope: circuit gate, per-attempt timeout,
    /// bounded retry, outcome recorded back into the circuit.
    async fn call<T, Fut>(
        &self,
        op: &'static str,
        mut attempt: impl FnMut() -> Fut,
    ) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        if let Err(retry_in) = self.circuit.try_acquire() {
            tracing::warn!(op, retry_in = ?retry_in, "Circuit open, failing fast");
            return Err(ClientError::CircuitOpen { retry_in });
        }

        let timeout = self.config.request_timeout;
        let bounded = || {
            let fut = attempt();
            async move {
                match tokio::time::timeout(timeout, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(timeout)),
                }
            }
        };

        let result = bounded
            .retry(self.config.retry.backoff())
            .when(|err: &ProviderError| err.is_retryable())
            .notify(|err, delay| {
                tracing::warn!(op, error = %err, delay = ?delay, "Retrying upstream call");
            })
            .await;

        match result {
            Ok(value) => {
                self.circuit.record_success();
                Ok(value)
            }
            // NotFound means the upstream answered; the service is healthy.
            Err(ProviderError::NotFound) => {
                self.circuit.record_success();
                Err(ClientError::NotFound)
            }
            Err(err) => {
                self.circuit.record_failure();
                tracing::warn!(op, error = %err, "Upstream call failed after retries");
                Err(err.into())
            }
        }
    }
}
