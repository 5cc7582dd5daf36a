//! # sightline-runtime
//!
//! Resilient external validation for Sightline.
//!
//! This crate holds everything that talks to the upstream taxonomy and
//! geography service: the TTL-tiered lookup cache, the resilient client
//! (timeout, retry, circuit breaker), name resolution, hierarchy
//! verification, the external field agents, and the orchestrator that
//! combines them with the deterministic rules in `sightline-core`.
//!
//! ## Important
//!
//! The deterministic validation in `sightline-core` never needs this
//! crate. Use the runtime when records should also be checked against the
//! upstream service: species spelling, family ancestry, place identity,
//! and new-record claims.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sightline_runtime::{
//!     INaturalistProvider, RuntimeConfig, ValidationOrchestrator,
//! };
//!
//! let provider = Arc::new(INaturalistProvider::new());
//! let orchestrator = ValidationOrchestrator::new(provider, RuntimeConfig::default());
//! orchestrator.begin_run();
//!
//! let results = orchestrator.validate_batch(&records).await;
//! ```

pub mod agents;
pub mod cache;
pub mod client;
pub mod config;
pub mod hierarchy;
pub mod orchestrator;
pub mod provider;
pub mod resilience;
pub mod resolver;

#[cfg(test)]
mod testutil;

pub use cache::{CacheCategory, CacheKey, CachedValue, LookupCache};
pub use client::{ClientError, ResilientClient, ResilientClientConfig};
pub use config::{CacheConfig, CacheTtls, RuntimeConfig};
pub use hierarchy::{HierarchyAssessment, HierarchyValidator, SearchedRank};
pub use orchestrator::ValidationOrchestrator;
pub use provider::{
    INaturalistProvider, ObservationCount, ObservationQuery, ObservationSummary, PlaceRecord,
    ProviderError, QualityGrade, TaxonRecord, TaxonomyProvider,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig};
pub use resolver::{NameResolver, ResolveError};
