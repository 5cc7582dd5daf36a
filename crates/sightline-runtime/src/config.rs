//! Runtime configuration.
//!
//! Loaded from YAML by the CLI or built programmatically. Durations are
//! written as humantime strings ("30s", "7d", "15m").

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::CacheCategory;
use crate::client::ResilientClientConfig;

/// Serde helper for humantime duration strings.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for optional humantime duration strings.
pub(crate) mod opt_duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| humantime::parse_duration(&t).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Per-category cache TTLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtls {
    #[serde(with = "duration_str")]
    pub taxon_search: Duration,
    #[serde(with = "duration_str")]
    pub taxon_detail: Duration,
    #[serde(with = "duration_str")]
    pub place_search: Duration,
    #[serde(with = "duration_str")]
    pub observation_count: Duration,
    #[serde(with = "duration_str")]
    pub recent_observations: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            taxon_search: CacheCategory::TaxonSearch.default_ttl(),
            taxon_detail: CacheCategory::TaxonDetail.default_ttl(),
            place_search: CacheCategory::PlaceSearch.default_ttl(),
            observation_count: CacheCategory::ObservationCount.default_ttl(),
            recent_observations: CacheCategory::RecentObservations.default_ttl(),
        }
    }
}

impl CacheTtls {
    /// TTL for a cache category.
    pub fn for_category(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::TaxonSearch => self.taxon_search,
            CacheCategory::TaxonDetail => self.taxon_detail,
            CacheCategory::PlaceSearch => self.place_search,
            CacheCategory::ObservationCount => self.observation_count,
            CacheCategory::RecentObservations => self.recent_observations,
        }
    }
}

/// Cache sizing and TTL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttls: CacheTtls,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttls: CacheTtls::default(),
        }
    }
}

/// Configuration for the validation runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Resilience policy for upstream calls
    pub client: ResilientClientConfig,

    pub cache: CacheConfig,

    /// Abort a record's validation after this long; the record is reported
    /// as INCOMPLETE, never dropped
    #[serde(with = "opt_duration_str")]
    pub record_deadline: Option<Duration>,

    /// Surface AmbiguousName instead of picking the first of several
    /// equally-ranked exact matches
    pub strict_resolution: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            client: ResilientClientConfig::default(),
            cache: CacheConfig::default(),
            record_deadline: None,
            strict_resolution: false,
        }
    }
}
