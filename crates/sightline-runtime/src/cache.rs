//! TTL-tiered lookup cache.
//!
//! One upstream answer per key, expiring on a TTL chosen by the caller
//! from the lookup category: taxonomy barely moves (days), places are
//! stable (a day), observation tallies drift (an hour), recent listings
//! churn (minutes). The cache itself knows nothing about what it stores.

use moka::future::Cache;
use moka::Expiry;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::provider::{ObservationCount, ObservationSummary, PlaceRecord, TaxonRecord};

/// Lookup categories, each with its own default TTL tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheCategory {
    TaxonSearch,
    TaxonDetail,
    PlaceSearch,
    ObservationCount,
    RecentObservations,
}

impl CacheCategory {
    /// Default TTL for entries of this category.
    pub fn default_ttl(&self) -> Duration {
        match self {
            CacheCategory::TaxonSearch | CacheCategory::TaxonDetail => {
                Duration::from_secs(7 * 24 * 3600)
            }
            CacheCategory::PlaceSearch => Duration::from_secs(24 * 3600),
            CacheCategory::ObservationCount => Duration::from_secs(3600),
            CacheCategory::RecentObservations => Duration::from_secs(15 * 60),
        }
    }
}

/// Cache key: category plus normalized query plus result limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: CacheCategory,
    query: String,
    limit: Option<u32>,
}

impl CacheKey {
    /// Build a key with query normalization: trimmed, lower-cased, inner
    /// whitespace collapsed. "Danaus  plexippus " and "danaus plexippus"
    /// are the same lookup.
    pub fn new(category: CacheCategory, query: &str, limit: Option<u32>) -> Self {
        Self {
            category,
            query: normalize_query(query),
            limit,
        }
    }

    pub fn category(&self) -> CacheCategory {
        self.category
    }
}

fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Cached payload. Entries are immutable value objects; a stale answer is
/// replaced, never edited.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Taxa(Vec<TaxonRecord>),
    Taxon(TaxonRecord),
    Places(Vec<PlaceRecord>),
    Count(ObservationCount),
    Observations(Vec<ObservationSummary>),
}

#[derive(Clone)]
struct CachedEntry {
    value: CachedValue,
    ttl: Duration,
}

/// Reads each entry's own TTL instead of a cache-wide one.
struct PerEntryExpiry;

impl Expiry<CacheKey, CachedEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        entry: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Keyed, TTL-tiered store for upstream lookup results.
pub struct LookupCache {
    cache: Cache<CacheKey, CachedEntry>,
}

impl LookupCache {
    /// Create a cache bounded to `max_entries`.
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryExpiry)
            .build();
        Self { cache }
    }

    /// Look up a key. An entry past its TTL reads as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        self.cache.get(key).await.map(|entry| entry.value)
    }

    /// Store a value under a key with the caller-chosen TTL. Re-putting
    /// the same key replaces the entry.
    pub async fn put(&self, key: CacheKey, value: CachedValue, ttl: Duration) {
        self.cache.insert(key, CachedEntry { value, ttl }).await;
    }

    /// Drop every entry (run isolation).
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}
