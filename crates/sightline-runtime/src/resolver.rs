//! Name resolution: free-text species and place names to canonical
//! upstream records.
//!
//! Sits between the cache and the resilient client. Every lookup is
//! cache-through with the TTL of its category; id-based entry points skip
//! name matching entirely and go straight to the client.
//!
//! ## Candidate selection
//!
//! Upstream search ranking is fuzzy. If any candidate's canonical name or
//! display name equals the query case-insensitively, that candidate wins
//! regardless of rank ("United States" must not resolve to "United States
//! Virgin Islands"). Otherwise the first, highest-ranked candidate is
//! taken. In the default mode several equally-ranked exact matches resolve
//! to the first one deterministically; strict mode surfaces
//! `AmbiguousName` instead.

use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheCategory, CacheKey, CachedValue, LookupCache};
use crate::client::{ClientError, ResilientClient};
use crate::config::CacheTtls;
use crate::provider::{
    ObservationCount, ObservationQuery, ObservationSummary, PlaceRecord, TaxonRecord,
};

/// Errors from name resolution.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The upstream returned zero candidates.
    #[error("no upstream match for '{0}'")]
    NotFound(String),

    /// Strict mode only: several equally-ranked exact matches.
    #[error("ambiguous name '{query}': {candidates} equally ranked exact matches")]
    AmbiguousName { query: String, candidates: usize },

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Resolves names against the upstream service, with caching.
pub struct NameResolver {
    client: Arc<ResilientClient>,
    cache: Arc<LookupCache>,
    ttls: CacheTtls,
    strict: bool,
}

impl NameResolver {
    pub fn new(client: Arc<ResilientClient>, cache: Arc<LookupCache>, ttls: CacheTtls) -> Self {
        Self {
            client,
            cache,
            ttls,
            strict: false,
        }
    }

    /// Enable strict ambiguity reporting.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve a scientific or common name to one taxon.
    pub async fn resolve_taxon(&self, query: &str, limit: u32) -> Result<TaxonRecord, ResolveError> {
        let candidates = self.taxon_candidates(query, limit).await?;
        let exact: Vec<&TaxonRecord> = candidates
            .iter()
            .filter(|t| {
                t.name.eq_ignore_ascii_case(query.trim())
                    || t.preferred_common_name
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(query.trim()))
            })
            .collect();
        self.pick(query, &candidates, &exact).map(Clone::clone)
    }

    /// Fetch one taxon by its upstream id, with the full ancestry.
    pub async fn taxon_by_id(&self, taxon_id: u64) -> Result<TaxonRecord, ResolveError> {
        let key = CacheKey::new(CacheCategory::TaxonDetail, &taxon_id.to_string(), None);
        if let Some(CachedValue::Taxon(taxon)) = self.cache.get(&key).await {
            return Ok(taxon);
        }
        let taxon = self
            .client
            .taxon_detail(taxon_id)
            .await
            .map_err(|e| match e {
                ClientError::NotFound => ResolveError::NotFound(format!("taxon {taxon_id}")),
                other => ResolveError::Client(other),
            })?;
        self.cache
            .put(
                key,
                CachedValue::Taxon(taxon.clone()),
                self.ttls.for_category(CacheCategory::TaxonDetail),
            )
            .await;
        Ok(taxon)
    }

    /// Resolve a place name to one place.
    pub async fn resolve_place(&self, query: &str, limit: u32) -> Result<PlaceRecord, ResolveError> {
        let candidates = self.place_candidates(query, limit).await?;
        let exact: Vec<&PlaceRecord> = candidates
            .iter()
            .filter(|p| p.display_name.eq_ignore_ascii_case(query.trim()))
            .collect();
        self.pick(query, &candidates, &exact).map(Clone::clone)
    }

    /// Count observations for a scope, cached for the observation-count
    /// tier.
    pub async fn observation_count(
        &self,
        query: &ObservationQuery,
    ) -> Result<ObservationCount, ResolveError> {
        let key = CacheKey::new(CacheCategory::ObservationCount, &query.cache_token(), None);
        if let Some(CachedValue::Count(count)) = self.cache.get(&key).await {
            return Ok(count);
        }
        let count = self.client.count_observations(query).await?;
        self.cache
            .put(
                key,
                CachedValue::Count(count.clone()),
                self.ttls.for_category(CacheCategory::ObservationCount),
            )
            .await;
        Ok(count)
    }

    /// Most recent observations for a scope, cached for the short
    /// recent-listings tier.
    pub async fn recent_observations(
        &self,
        query: &ObservationQuery,
        limit: u32,
    ) -> Result<Vec<ObservationSummary>, ResolveError> {
        let key = CacheKey::new(
            CacheCategory::RecentObservations,
            &query.cache_token(),
            Some(limit),
        );
        if let Some(CachedValue::Observations(observations)) = self.cache.get(&key).await {
            return Ok(observations);
        }
        let observations = self.client.recent_observations(query, limit).await?;
        self.cache
            .put(
                key,
                CachedValue::Observations(observations.clone()),
                self.ttls.for_category(CacheCategory::RecentObservations),
            )
            .await;
        Ok(observations)
    }

    /// Drop all cached lookups (run isolation).
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn taxon_candidates(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TaxonRecord>, ClientError> {
        let key = CacheKey::new(CacheCategory::TaxonSearch, query, Some(limit));
        if let Some(CachedValue::Taxa(taxa)) = self.cache.get(&key).await {
            return Ok(taxa);
        }
        let taxa = self.client.search_taxa(query, limit).await?;
        self.cache
            .put(
                key,
                CachedValue::Taxa(taxa.clone()),
                self.ttls.for_category(CacheCategory::TaxonSearch),
            )
            .await;
        Ok(taxa)
    }

    async fn place_candidates(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaceRecord>, ClientError> {
        let key = CacheKey::new(CacheCategory::PlaceSearch, query, Some(limit));
        if let Some(CachedValue::Places(places)) = self.cache.get(&key).await {
            return Ok(places);
        }
        let places = self.client.search_places(query, limit).await?;
        self.cache
            .put(
                key,
                CachedValue::Places(places.clone()),
                self.ttls.for_category(CacheCategory::PlaceSearch),
            )
            .await;
        Ok(places)
    }

    fn pick<'a, T>(
        &self,
        query: &str,
        candidates: &'a [T],
        exact: &[&'a T],
    ) -> Result<&'a T, ResolveError> {
        match (candidates.first(), exact.len()) {
            (None, _) => Err(ResolveError::NotFound(query.trim().to_string())),
            (Some(first), 0) => Ok(first),
            (_, 1) => Ok(exact[0]),
            (_, n) if self.strict => Err(ResolveError::AmbiguousName {
                query: query.trim().to_string(),
                candidates: n,
            }),
            // Known residual ambiguity: several exact matches, first wins.
            (_, _) => Ok(exact[0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockProvider;

    fn place(id: u64, display_name: &str) -> PlaceRecord {
        PlaceRecord {
            id,
            display_name: display_name.to_string(),
            admin_level: Some(0),
            ancestor_place_ids: Vec::new(),
        }
    }

    fn resolver_over(provider: Arc<MockProvider>) -> NameResolver {
        let client = Arc::new(ResilientClient::new(provider));
        NameResolver::new(
            client,
            Arc::new(LookupCache::default()),
            CacheTtls::default(),
        )
    }

    #[tokio::test]
    async fn test_exact_match_beats_ranking() {
        let provider = Arc::new(MockProvider::with_places(vec![
            place(8, "United States Virgin Islands"),
            place(1, "United States"),
        ]));
        let resolver = resolver_over(provider);

        let resolved = resolver.resolve_place("United States", 5).await.unwrap();
        assert_eq!(resolved.display_name, "United States");
        assert_eq!(resolved.id, 1);
    }

    #[tokio::test]
    async fn test_first_candidate_without_exact_match() {
        let provider = Arc::new(MockProvider::with_monarch());
        let resolver = resolver_over(provider);

        // Misspelled epithet: no exact match, highest-ranked hit wins.
        let resolved = resolver.resolve_taxon("Danaus plexipus", 5).await.unwrap();
        assert_eq!(resolved.name, "Danaus plexippus");
    }

    #[tokio::test]
    async fn test_common_name_counts_as_exact() {
        let provider = Arc::new(MockProvider::with_taxa(vec![
            TaxonRecord {
                name: "Danaus gilippus".to_string(),
                preferred_common_name: Some("Queen".to_string()),
                ..MockProvider::monarch_search_hit()
            },
            MockProvider::monarch_search_hit(),
        ]));
        let resolver = resolver_over(provider);

        let resolved = resolver.resolve_taxon("Monarch", 5).await.unwrap();
        assert_eq!(resolved.name, "Danaus plexippus");
    }

    #[tokio::test]
    async fn test_zero_candidates_is_not_found() {
        let provider = Arc::new(MockProvider::empty());
        let resolver = resolver_over(provider);

        let err = resolver.resolve_taxon("Nonexistus fakeus", 5).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_strict_mode_reports_ambiguity() {
        let duplicates = vec![place(1, "United States"), place(2, "United States")];
        let provider = Arc::new(MockProvider::with_places(duplicates.clone()));
        let strict = resolver_over(provider).strict(true);

        let err = strict.resolve_place("United States", 5).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::AmbiguousName { candidates: 2, .. }
        ));

        // Default mode picks the first deterministically.
        let provider = Arc::new(MockProvider::with_places(duplicates));
        let lenient = resolver_over(provider);
        let resolved = lenient.resolve_place("United States", 5).await.unwrap();
        assert_eq!(resolved.id, 1);
    }

    #[tokio::test]
    async fn test_repeat_lookups_hit_cache() {
        let provider = Arc::new(MockProvider::with_monarch());
        let resolver = resolver_over(provider.clone());

        resolver.resolve_taxon("Danaus plexippus", 5).await.unwrap();
        resolver.resolve_taxon("Danaus plexippus", 5).await.unwrap();
        // Key normalization folds case and spacing into the same entry.
        resolver.resolve_taxon("  danaus  plexippus ", 5).await.unwrap();
        assert_eq!(provider.calls(), 1);

        resolver.clear_cache();
        resolver.resolve_taxon("Danaus plexippus", 5).await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_taxon_by_id_bypasses_search_and_caches() {
        let provider = Arc::new(MockProvider::with_monarch());
        let resolver = resolver_over(provider.clone());

        let taxon = resolver.taxon_by_id(48662).await.unwrap();
        assert_eq!(taxon.family_ancestor().unwrap().name, "Nymphalidae");

        resolver.taxon_by_id(48662).await.unwrap();
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let provider = Arc::new(MockProvider::with_monarch());
        let resolver = resolver_over(provider);

        let err = resolver.taxon_by_id(999).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_observations_cached_per_scope_and_limit() {
        let provider = Arc::new(MockProvider::with_monarch());
        let resolver = resolver_over(provider.clone());

        let query = ObservationQuery {
            taxon_id: Some(48662),
            place_id: Some(18),
            ..Default::default()
        };
        resolver.recent_observations(&query, 10).await.unwrap();
        resolver.recent_observations(&query, 10).await.unwrap();
        assert_eq!(provider.calls(), 1);

        // A different page size is a different listing.
        resolver.recent_observations(&query, 20).await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_observation_count_cached_per_scope() {
        let provider = Arc::new(MockProvider::with_monarch());
        provider.set_count(0);
        let resolver = resolver_over(provider.clone());

        let query = ObservationQuery {
            taxon_id: Some(48662),
            place_id: Some(18),
            ..Default::default()
        };
        let count = resolver.observation_count(&query).await.unwrap();
        assert!(count.is_new_record());

        resolver.observation_count(&query).await.unwrap();
        assert_eq!(provider.calls(), 1);

        // A different scope is a different entry.
        let other = ObservationQuery {
            taxon_id: Some(48662),
            place_id: Some(99),
            ..Default::default()
        };
        resolver.observation_count(&other).await.unwrap();
        assert_eq!(provider.calls(), 2);
    }
}
