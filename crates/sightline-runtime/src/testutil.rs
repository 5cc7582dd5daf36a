//! Test doubles for the upstream provider.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::provider::{
    ObservationCount, ObservationQuery, ObservationSummary, PlaceRecord, ProviderError,
    TaxonAncestor, TaxonomyProvider, TaxonRecord,
};

pub(crate) enum MockBehavior {
    Succeed,
    Fail(ProviderError),
    Hang,
}

/// Scripted provider: counts calls, returns configured payloads, and can
/// fail or hang on demand.
pub(crate) struct MockProvider {
    behavior: Mutex<MockBehavior>,
    calls: AtomicU32,
    taxa: Mutex<Vec<TaxonRecord>>,
    details: Mutex<HashMap<u64, TaxonRecord>>,
    places: Mutex<Vec<PlaceRecord>>,
    count: Mutex<ObservationCount>,
}

impl MockProvider {
    fn base() -> Self {
        Self {
            behavior: Mutex::new(MockBehavior::Succeed),
            calls: AtomicU32::new(0),
            taxa: Mutex::new(Vec::new()),
            details: Mutex::new(HashMap::new()),
            places: Mutex::new(Vec::new()),
            count: Mutex::new(ObservationCount {
                total: 3,
                query_url: "https://example.test/observations".to_string(),
            }),
        }
    }

    /// A healthy provider that knows the monarch and Texas.
    pub fn with_monarch() -> Self {
        let mock = Self::base();
        *mock.taxa.lock() = vec![Self::monarch_search_hit()];
        mock.details
            .lock()
            .insert(48662, Self::monarch_detail());
        *mock.places.lock() = vec![Self::texas()];
        mock
    }

    /// Every call fails with the given error.
    pub fn failing(err: ProviderError) -> Self {
        let mock = Self::base();
        *mock.behavior.lock() = MockBehavior::Fail(err);
        mock
    }

    /// Every call hangs past any sane timeout.
    pub fn hanging() -> Self {
        let mock = Self::base();
        *mock.behavior.lock() = MockBehavior::Hang;
        mock
    }

    /// Searches succeed but return no candidates.
    pub fn empty() -> Self {
        Self::base()
    }

    pub fn with_taxa(taxa: Vec<TaxonRecord>) -> Self {
        let mock = Self::base();
        *mock.taxa.lock() = taxa;
        mock
    }

    pub fn with_places(places: Vec<PlaceRecord>) -> Self {
        let mock = Self::base();
        *mock.places.lock() = places;
        mock
    }

    pub fn set_count(&self, total: u64) {
        self.count.lock().total = total;
    }

    /// Switch a failing/hanging mock back to healthy monarch data.
    pub fn recover_with_monarch(&self) {
        *self.behavior.lock() = MockBehavior::Succeed;
        *self.taxa.lock() = vec![Self::monarch_search_hit()];
        self.details
            .lock()
            .insert(48662, Self::monarch_detail());
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Search hit as the API returns it: ancestor ids, no ancestor entries.
    pub fn monarch_search_hit() -> TaxonRecord {
        TaxonRecord {
            id: 48662,
            name: "Danaus plexippus".to_string(),
            preferred_common_name: Some("Monarch".to_string()),
            rank: "species".to_string(),
            ancestor_ids: vec![47157, 47224, 47922],
            ancestors: Vec::new(),
            observations_count: 500_000,
        }
    }

    /// Detail lookup with the full ancestry.
    pub fn monarch_detail() -> TaxonRecord {
        TaxonRecord {
            ancestors: vec![
                TaxonAncestor {
                    id: 47157,
                    name: "Lepidoptera".to_string(),
                    rank: "order".to_string(),
                },
                TaxonAncestor {
                    id: 47224,
                    name: "Nymphalidae".to_string(),
                    rank: "family".to_string(),
                },
                TaxonAncestor {
                    id: 47922,
                    name: "Danaus".to_string(),
                    rank: "genus".to_string(),
                },
            ],
            ..Self::monarch_search_hit()
        }
    }

    pub fn texas() -> PlaceRecord {
        PlaceRecord {
            id: 18,
            display_name: "Texas, US".to_string(),
            admin_level: Some(10),
            ancestor_place_ids: vec![97394, 1],
        }
    }

    async fn gate<T>(&self, ok: T) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = {
            let guard = self.behavior.lock();
            match &*guard {
                MockBehavior::Succeed => MockBehavior::Succeed,
                MockBehavior::Fail(e) => MockBehavior::Fail(e.clone()),
                MockBehavior::Hang => MockBehavior::Hang,
            }
        };
        match behavior {
            MockBehavior::Succeed => Ok(ok),
            MockBehavior::Fail(err) => Err(err),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Err(ProviderError::Timeout(Duration::from_secs(600)))
            }
        }
    }
}

#[async_trait]
impl TaxonomyProvider for MockProvider {
    async fn search_taxa(
        &self,
        _query: &str,
        _limit: u32,
    ) -> Result<Vec<TaxonRecord>, ProviderError> {
        let taxa = self.taxa.lock().clone();
        self.gate(taxa).await
    }

    async fn taxon_detail(&self, taxon_id: u64) -> Result<TaxonRecord, ProviderError> {
        let detail = self.details.lock().get(&taxon_id).cloned();
        match self.gate(detail).await? {
            Some(taxon) => Ok(taxon),
            None => Err(ProviderError::NotFound),
        }
    }

    async fn search_places(
        &self,
        _query: &str,
        _limit: u32,
    ) -> Result<Vec<PlaceRecord>, ProviderError> {
        let places = self.places.lock().clone();
        self.gate(places).await
    }

    async fn count_observations(
        &self,
        _query: &ObservationQuery,
    ) -> Result<ObservationCount, ProviderError> {
        let count = self.count.lock().clone();
        self.gate(count).await
    }

    async fn recent_observations(
        &self,
        _query: &ObservationQuery,
        _limit: u32,
    ) -> Result<Vec<ObservationSummary>, ProviderError> {
        self.gate(Vec::new()).await
    }

    async fn health_check(&self) -> bool {
        matches!(*self.behavior.lock(), MockBehavior::Succeed)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
