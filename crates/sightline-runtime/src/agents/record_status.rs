//! Record-claim agents: corroborate state and county "new record" flags
//! against upstream observation history.
//!
//! A claim is corroborated when zero research-grade observations exist in
//! the claimed scope. Existing observations do not disprove the claim
//! (the upstream corpus is not the society's archive), so they surface as
//! a warning with the evidence URL, never an error.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use sightline_core::{FieldId, FieldValidationResult, Record};

use crate::hierarchy::HierarchyValidator;
use crate::provider::{ObservationQuery, QualityGrade};
use crate::resolver::NameResolver;

use super::{is_affirmative, warn_unavailable, ExternalAgent};

/// Which geographic scope a claim covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimScope {
    State,
    County,
}

impl ClaimScope {
    fn field(&self) -> FieldId {
        match self {
            ClaimScope::State => FieldId::StateRecord,
            ClaimScope::County => FieldId::CountyRecord,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ClaimScope::State => "state",
            ClaimScope::County => "county",
        }
    }

    /// Upstream place-name filter for the claimed scope.
    fn place_name(&self, record: &Record) -> Option<String> {
        let state = record.field(FieldId::State)?;
        match self {
            ClaimScope::State => Some(state.to_string()),
            ClaimScope::County => {
                let county = record.field(FieldId::County)?;
                Some(format!("{county}, {state}"))
            }
        }
    }
}

/// Shared corroboration flow for both claim scopes.
async fn corroborate(
    scope: ClaimScope,
    validator_name: &'static str,
    hierarchy: &HierarchyValidator,
    resolver: &NameResolver,
    value: Option<&str>,
    record: &Record,
) -> FieldValidationResult {
    let mut result = FieldValidationResult::new(scope.field(), validator_name);
    if !value.is_some_and(is_affirmative) {
        return result;
    }

    let Some(genus) = record.field(FieldId::Genus) else {
        result.warn(format!(
            "Cannot corroborate {} record claim without a genus",
            scope.label()
        ));
        return result;
    };
    let Some(place_name) = scope.place_name(record) else {
        result.warn(format!(
            "Cannot corroborate {} record claim without a place",
            scope.label()
        ));
        return result;
    };

    // Served from cache when the taxon agent already resolved this record.
    let assessment = match hierarchy
        .assess(
            genus,
            record.field(FieldId::Species),
            record.field(FieldId::Subspecies),
            record.field(FieldId::Family),
        )
        .await
    {
        Ok(assessment) => assessment,
        Err(err) => {
            warn_unavailable(&mut result, "record claim", &err);
            return result;
        }
    };
    let Some(taxon) = &assessment.taxon else {
        result
            .warn(format!(
                "Cannot corroborate {} record claim: '{}' unresolved upstream",
                scope.label(),
                assessment.searched
            ))
            .meta("needs_review", json!(true));
        return result;
    };

    let query = ObservationQuery {
        taxon_id: Some(taxon.id),
        place_name: Some(place_name),
        quality_grade: Some(QualityGrade::Research),
        ..Default::default()
    };
    match resolver.observation_count(&query).await {
        Ok(count) => {
            result
                .meta("existing_observations", json!(count.total))
                .meta("evidence_url", json!(count.query_url));
            if count.is_new_record() {
                result.meta("record_corroborated", json!(true));
            } else {
                result.warn(format!(
                    "{} research-grade observations already exist in the claimed {}; \
                     verify this is a new record",
                    count.total,
                    scope.label()
                ));
            }
        }
        Err(err) => warn_unavailable(&mut result, "record claim", &err),
    }
    result
}

/// Corroborates a state-record claim.
pub struct StateRecordAgent {
    hierarchy: Arc<HierarchyValidator>,
    resolver: Arc<NameResolver>,
}

impl StateRecordAgent {
    pub fn new(hierarchy: Arc<HierarchyValidator>, resolver: Arc<NameResolver>) -> Self {
        Self {
            hierarchy,
            resolver,
        }
    }
}

#[async_trait]
impl ExternalAgent for StateRecordAgent {
    fn field(&self) -> FieldId {
        FieldId::StateRecord
    }

    fn name(&self) -> &'static str {
        "state-record-agent"
    }

    async fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult {
        corroborate(
            ClaimScope::State,
            self.name(),
            &self.hierarchy,
            &self.resolver,
            value,
            record,
        )
        .await
    }
}

/// Corroborates a county-record claim.
pub struct CountyRecordAgent {
    hierarchy: Arc<HierarchyValidator>,
    resolver: Arc<NameResolver>,
}

impl CountyRecordAgent {
    pub fn new(hierarchy: Arc<HierarchyValidator>, resolver: Arc<NameResolver>) -> Self {
        Self {
            hierarchy,
            resolver,
        }
    }
}

#[async_trait]
impl ExternalAgent for CountyRecordAgent {
    fn field(&self) -> FieldId {
        FieldId::CountyRecord
    }

    fn name(&self) -> &'static str {
        "county-record-agent"
    }

    async fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult {
        corroborate(
            ClaimScope::County,
            self.name(),
            &self.hierarchy,
            &self.resolver,
            value,
            record,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LookupCache;
    use crate::client::ResilientClient;
    use crate::config::CacheTtls;
    use crate::testutil::MockProvider;

    fn agent_over(provider: Arc<MockProvider>) -> StateRecordAgent {
        let client = Arc::new(ResilientClient::new(provider));
        let resolver = Arc::new(NameResolver::new(
            client,
            Arc::new(LookupCache::default()),
            CacheTtls::default(),
        ));
        StateRecordAgent::new(Arc::new(HierarchyValidator::new(resolver.clone())), resolver)
    }

    fn claim_record() -> Record {
        Record {
            state: Some("TX".to_string()),
            county: Some("Travis".to_string()),
            genus: Some("Danaus".to_string()),
            species: Some("plexippus".to_string()),
            state_record: Some("Y".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_zero_observations_corroborates_claim() {
        let provider = Arc::new(MockProvider::with_monarch());
        provider.set_count(0);
        let agent = agent_over(provider);
        let record = claim_record();

        let result = agent
            .validate(record.field(FieldId::StateRecord), &record)
            .await;
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert_eq!(result.metadata["record_corroborated"], json!(true));
        assert_eq!(result.metadata["existing_observations"], json!(0));
    }

    #[tokio::test]
    async fn test_existing_observations_warn_with_evidence() {
        let provider = Arc::new(MockProvider::with_monarch());
        provider.set_count(12);
        let agent = agent_over(provider);
        let record = claim_record();

        let result = agent
            .validate(record.field(FieldId::StateRecord), &record)
            .await;
        assert!(result.is_valid);
        assert!(result.warnings[0].contains("12 research-grade observations"));
        assert!(result.metadata.contains_key("evidence_url"));
    }

    #[tokio::test]
    async fn test_negative_flag_skips_upstream_entirely() {
        let provider = Arc::new(MockProvider::with_monarch());
        let agent = agent_over(provider.clone());
        let mut record = claim_record();
        record.state_record = Some("N".to_string());

        let result = agent
            .validate(record.field(FieldId::StateRecord), &record)
            .await;
        assert!(result.warnings.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unresolved_taxon_warns_for_review() {
        let agent = agent_over(Arc::new(MockProvider::empty()));
        let record = claim_record();

        let result = agent
            .validate(record.field(FieldId::StateRecord), &record)
            .await;
        assert!(result.is_valid);
        assert!(result.warnings[0].contains("unresolved upstream"));
        assert_eq!(result.metadata["needs_review"], json!(true));
    }

    #[test]
    fn test_county_scope_includes_county_in_place() {
        let record = claim_record();
        assert_eq!(
            ClaimScope::County.place_name(&record).as_deref(),
            Some("Travis, TX")
        );
        assert_eq!(ClaimScope::State.place_name(&record).as_deref(), Some("TX"));
    }
}
