//! iNaturalist REST API provider.
//!
//! Implements [`TaxonomyProvider`] over the public iNaturalist v1 API.
//! The API is unauthenticated; be a polite client (identifying
//! user-agent, bounded page sizes, `per_page=0` for pure counts).

use super::{
    ObservationCount, ObservationQuery, ObservationSummary, PlaceRecord, ProviderError,
    TaxonAncestor, TaxonomyProvider, TaxonRecord,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Default public API root.
pub const INAT_BASE_URL: &str = "https://api.inaturalist.org/v1";

const USER_AGENT: &str = concat!("sightline/", env!("CARGO_PKG_VERSION"));
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// iNaturalist taxonomy/geography provider.
#[derive(Debug, Clone)]
pub struct INaturalistProvider {
    base_url: String,
}

impl INaturalistProvider {
    /// Create a provider against the public API.
    pub fn new() -> Self {
        Self {
            base_url: INAT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different API root (mirrors, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn get_client(&self) -> &reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(|| {
            reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(CLIENT_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client")
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let response = self
            .get_client()
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(CLIENT_TIMEOUT)
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if status == 404 {
            return Err(ProviderError::NotFound);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ServiceUnavailable {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Translate an observation scope into API query parameters. A place
    /// given only by name is resolved first; the API itself only accepts
    /// place ids.
    async fn observation_params(
        &self,
        query: &ObservationQuery,
    ) -> Result<Vec<(&'static str, String)>, ProviderError> {
        let mut params = Vec::new();

        if let Some(id) = query.taxon_id {
            params.push(("taxon_id", id.to_string()));
        } else if let Some(name) = &query.taxon_name {
            params.push(("taxon_name", name.clone()));
        }

        if let Some(id) = query.place_id {
            params.push(("place_id", id.to_string()));
        } else if let Some(name) = &query.place_name {
            let places = self.search_places(name, 1).await?;
            let place = places.first().ok_or(ProviderError::NotFound)?;
            params.push(("place_id", place.id.to_string()));
        }

        if let Some(year) = query.year {
            params.push(("year", year.to_string()));
        }
        if let Some(grade) = query.quality_grade {
            params.push(("quality_grade", grade.as_str().to_string()));
        }
        Ok(params)
    }
}

impl Default for INaturalistProvider {
    fn default() -> Self {
        Self::new()
    }
}

// iNaturalist API wire format.

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    total_results: u64,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiTaxon {
    id: u64,
    name: String,
    rank: Option<String>,
    preferred_common_name: Option<String>,
    #[serde(default)]
    observations_count: u64,
    #[serde(default)]
    ancestor_ids: Vec<u64>,
    #[serde(default)]
    ancestors: Vec<ApiAncestor>,
}

#[derive(Debug, Deserialize)]
struct ApiAncestor {
    id: u64,
    name: String,
    rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPlace {
    id: u64,
    display_name: Option<String>,
    name: Option<String>,
    admin_level: Option<i32>,
    #[serde(default)]
    ancestor_place_ids: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct ApiObservation {
    id: u64,
    observed_on: Option<String>,
    place_guess: Option<String>,
    quality_grade: Option<String>,
}

impl From<ApiTaxon> for TaxonRecord {
    fn from(taxon: ApiTaxon) -> Self {
        TaxonRecord {
            id: taxon.id,
            name: taxon.name,
            preferred_common_name: taxon.preferred_common_name,
            rank: taxon.rank.unwrap_or_default(),
            ancestor_ids: taxon.ancestor_ids,
            ancestors: taxon
                .ancestors
                .into_iter()
                .map(|a| TaxonAncestor {
                    id: a.id,
                    name: a.name,
                    rank: a.rank.unwrap_or_default(),
                })
                .collect(),
            observations_count: taxon.observations_count,
        }
    }
}

impl From<ApiPlace> for PlaceRecord {
    fn from(place: ApiPlace) -> Self {
        PlaceRecord {
            display_name: place
                .display_name
                .or(place.name)
                .unwrap_or_default(),
            id: place.id,
            admin_level: place.admin_level,
            ancestor_place_ids: place.ancestor_place_ids.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl TaxonomyProvider for INaturalistProvider {
    async fn search_taxa(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TaxonRecord>, ProviderError> {
        let url = format!("{}/taxa", self.base_url);
        let params = [
            ("q", query.to_string()),
            ("per_page", limit.to_string()),
        ];
        let body: ApiEnvelope<ApiTaxon> = self.get_json(&url, &params).await?;
        Ok(body.results.into_iter().map(TaxonRecord::from).collect())
    }

    async fn taxon_detail(&self, taxon_id: u64) -> Result<TaxonRecord, ProviderError> {
        let url = format!("{}/taxa/{}", self.base_url, taxon_id);
        let body: ApiEnvelope<ApiTaxon> = self.get_json(&url, &[]).await?;
        body.results
            .into_iter()
            .next()
            .map(TaxonRecord::from)
            .ok_or(ProviderError::NotFound)
    }

    async fn search_places(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaceRecord>, ProviderError> {
        let url = format!("{}/places/autocomplete", self.base_url);
        let params = [
            ("q", query.to_string()),
            ("per_page", limit.to_string()),
        ];
        let body: ApiEnvelope<ApiPlace> = self.get_json(&url, &params).await?;
        Ok(body.results.into_iter().map(PlaceRecord::from).collect())
    }

    async fn count_observations(
        &self,
        query: &ObservationQuery,
    ) -> Result<ObservationCount, ProviderError> {
        let url = format!("{}/observations", self.base_url);
        let mut params = self.observation_params(query).await?;
        // per_page=0: only the total, no payload.
        params.push(("per_page", "0".to_string()));

        let query_url = format!(
            "{}?{}",
            url,
            params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&")
        );
        let body: ApiEnvelope<ApiObservation> = self.get_json(&url, &params).await?;
        Ok(ObservationCount {
            total: body.total_results,
            query_url,
        })
    }

    async fn recent_observations(
        &self,
        query: &ObservationQuery,
        limit: u32,
    ) -> Result<Vec<ObservationSummary>, ProviderError> {
        let url = format!("{}/observations", self.base_url);
        let mut params = self.observation_params(query).await?;
        params.push(("per_page", limit.to_string()));
        params.push(("order_by", "observed_on".to_string()));
        params.push(("order", "desc".to_string()));

        let body: ApiEnvelope<ApiObservation> = self.get_json(&url, &params).await?;
        Ok(body
            .results
            .into_iter()
            .map(|o| ObservationSummary {
                id: o.id,
                observed_on: o.observed_on,
                place_guess: o.place_guess,
                quality_grade: o.quality_grade,
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/observations", self.base_url);
        let params = [("per_page", "0".to_string())];
        self.get_json::<ApiEnvelope<ApiObservation>>(&url, &params)
            .await
            .is_ok()
    }

    fn name(&self) -> &str {
        "inaturalist"
    }
}
