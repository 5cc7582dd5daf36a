//! Circuit breaker to protect the upstream taxonomy service.
//!
//! When upstream calls fail repeatedly, the circuit opens and subsequent
//! calls fail immediately without touching the network, until a cooldown
//! elapses and a single trial call decides whether to close again.

use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery (in seconds)
    #[serde(with = "duration_secs")]
    pub recovery_timeout: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

/// State of the circuit.
#[derive(Debug, Clone)]
pub enum CircuitState {
    /// Normal operation, counting consecutive failures
    Closed { failures: u32 },

    /// Circuit is open, all calls fail fast
    Open { opened_at: Instant },

    /// A single trial call is in flight; its outcome decides the next state
    HalfOpen,
}

/// Circuit breaker for the upstream service.
///
/// One circuit per client: the upstream is a single dependency, so all
/// operations share its health. Transitions are atomic with respect to the
/// failure counter.
pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed { failures: 0 }),
            config,
        }
    }

    /// Ask permission to place a call.
    ///
    /// Returns `Err(retry_in)` when the circuit is open (or a trial call
    /// is already in flight). When the cooldown has elapsed, the circuit
    /// moves to half-open and exactly one caller gets through.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.state.write();
        match *state {
            CircuitState::Closed { .. } => Ok(()),
            CircuitState::Open { opened_at } => {
                let elapsed = opened_at.elapsed();
                if elapsed >= self.config.recovery_timeout {
                    *state = CircuitState::HalfOpen;
                    tracing::info!("Circuit half-open, allowing one trial call");
                    Ok(())
                } else {
                    Err(self.config.recovery_timeout - elapsed)
                }
            }
            // Trial call already in flight; everyone else fails fast.
            CircuitState::HalfOpen => Err(self.config.recovery_timeout),
        }
    }

    /// Record a successful upstream call.
    pub fn record_success(&self) {
        let mut state = self.state.write();
        match *state {
            CircuitState::HalfOpen => {
                *state = CircuitState::Closed { failures: 0 };
                tracing::info!("Circuit closed after successful recovery");
            }
            CircuitState::Closed { .. } => {
                *state = CircuitState::Closed { failures: 0 };
            }
            CircuitState::Open { .. } => {}
        }
    }

    /// Record a failed upstream call.
    pub fn record_failure(&self) {
        let mut state = self.state.write();
        match *state {
            CircuitState::Closed { failures } => {
                if failures + 1 >= self.config.failure_threshold {
                    *state = CircuitState::Open {
                        opened_at: Instant::now(),
                    };
                    tracing::warn!(
                        failures = failures + 1,
                        "Circuit opened after repeated failures"
                    );
                } else {
                    *state = CircuitState::Closed {
                        failures: failures + 1,
                    };
                }
            }
            CircuitState::HalfOpen => {
                // Trial failed, reopen and restart the cooldown.
                *state = CircuitState::Open {
                    opened_at: Instant::now(),
                };
                tracing::warn!("Circuit reopened after failed recovery attempt");
            }
            CircuitState::Open { .. } => {}
        }
    }

    /// Current state of the circuit.
    pub fn state(&self) -> CircuitState {
        self.state.read().clone()
    }

    /// Reset the circuit to closed (run isolation).
    pub fn reset(&self) {
        *self.state.write() = CircuitState::Closed { failures: 0 };
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
