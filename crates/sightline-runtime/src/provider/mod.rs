//! Upstream taxonomy/geography provider abstraction.
//!
//! This module defines the trait for the external service Sightline
//! verifies against, the payload types it returns, and the domain error
//! taxonomy. The concrete implementation talks to iNaturalist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

mod inaturalist;

pub use inaturalist::INaturalistProvider;

/// Errors from the upstream provider.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The query resolved to nothing. Terminal: retrying cannot help.
    #[error("not found upstream")]
    NotFound,

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("upstream unavailable: {status} - {message}")]
    ServiceUnavailable { status: u16, message: String },

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Whether a retry has any chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::ServiceUnavailable { .. }
                | ProviderError::Timeout(_)
                | ProviderError::Transport(_)
        )
    }
}

/// One step of a taxon's ancestry path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonAncestor {
    pub id: u64,
    pub name: String,
    pub rank: String,
}

/// A resolved taxon. Immutable once fetched within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonRecord {
    pub id: u64,
    /// Canonical scientific name ("Danaus plexippus").
    pub name: String,
    pub preferred_common_name: Option<String>,
    pub rank: String,
    /// Ancestor taxon ids from root to parent.
    pub ancestor_ids: Vec<u64>,
    /// Full ancestor entries, present on detail lookups.
    pub ancestors: Vec<TaxonAncestor>,
    pub observations_count: u64,
}

impl TaxonRecord {
    /// The family-rank ancestor, when the ancestry is loaded.
    pub fn family_ancestor(&self) -> Option<&TaxonAncestor> {
        self.ancestors
            .iter()
            .find(|a| a.rank.eq_ignore_ascii_case("family"))
    }

    /// The genus-rank ancestor, when the ancestry is loaded.
    pub fn genus_ancestor(&self) -> Option<&TaxonAncestor> {
        self.ancestors
            .iter()
            .find(|a| a.rank.eq_ignore_ascii_case("genus"))
    }
}

/// A resolved place. Immutable once fetched within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: u64,
    pub display_name: String,
    /// Upstream administrative level (country/state/county tiers).
    pub admin_level: Option<i32>,
    pub ancestor_place_ids: Vec<u64>,
}

/// Observation tally for a taxon/place scope, with the query URL kept for
/// human review of record claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationCount {
    pub total: u64,
    pub query_url: String,
}

impl ObservationCount {
    /// No prior observations: the claim of a new record is corroborated.
    pub fn is_new_record(&self) -> bool {
        self.total == 0
    }
}

/// One entry of a recent-observations listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSummary {
    pub id: u64,
    pub observed_on: Option<String>,
    pub place_guess: Option<String>,
    pub quality_grade: Option<String>,
}

/// Upstream verification level of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Research,
    NeedsId,
    Casual,
}

impl QualityGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::Research => "research",
            QualityGrade::NeedsId => "needs_id",
            QualityGrade::Casual => "casual",
        }
    }
}

/// Scope of an observation count or listing. Taxon and place may each be
/// given by id or by name; ids are cheaper and unambiguous.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationQuery {
    pub taxon_id: Option<u64>,
    pub taxon_name: Option<String>,
    pub place_id: Option<u64>,
    pub place_name: Option<String>,
    pub year: Option<i32>,
    pub quality_grade: Option<QualityGrade>,
}

impl ObservationQuery {
    /// Deterministic token for cache keys.
    pub fn cache_token(&self) -> String {
        format!(
            "t:{}|tn:{}|p:{}|pn:{}|y:{}|q:{}",
            self.taxon_id.map(|v| v.to_string()).unwrap_or_default(),
            self.taxon_name.as_deref().unwrap_or_default(),
            self.place_id.map(|v| v.to_string()).unwrap_or_default(),
            self.place_name.as_deref().unwrap_or_default(),
            self.year.map(|v| v.to_string()).unwrap_or_default(),
            self.quality_grade.map(|q| q.as_str()).unwrap_or_default(),
        )
    }
}

impl fmt::Display for ObservationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_token())
    }
}

/// Provider abstraction allows swapping the upstream service.
///
/// This is the ONLY place network calls are made. Resilience (timeout,
/// retry, circuit breaking) is layered on by `ResilientClient`; caching by
/// `NameResolver`. Implementations perform one plain call per invocation.
#[async_trait]
pub trait TaxonomyProvider: Send + Sync {
    /// Search taxa by name.
    async fn search_taxa(&self, query: &str, limit: u32)
        -> Result<Vec<TaxonRecord>, ProviderError>;

    /// Fetch one taxon with its full ancestry.
    async fn taxon_detail(&self, taxon_id: u64) -> Result<TaxonRecord, ProviderError>;

    /// Search places by name.
    async fn search_places(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaceRecord>, ProviderError>;

    /// Count observations matching a scope.
    async fn count_observations(
        &self,
        query: &ObservationQuery,
    ) -> Result<ObservationCount, ProviderError>;

    /// List the most recent observations matching a scope.
    async fn recent_observations(
        &self,
        query: &ObservationQuery,
        limit: u32,
    ) -> Result<Vec<ObservationSummary>, ProviderError>;

    /// Check if the provider is reachable.
    async fn health_check(&self) -> bool;

    /// Provider name for logs and metrics.
    fn name(&self) -> &str;
}
