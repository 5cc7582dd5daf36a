//! Taxonomy agents: species resolution and family-ancestry verification.
//!
//! Both agents drive the same [`HierarchyValidator`] assessment; the
//! resolver's cache guarantees a single upstream round per record even
//! though each agent asks independently.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use sightline_core::{FieldId, FieldValidationResult, Record};

use crate::hierarchy::{HierarchyAssessment, HierarchyValidator};

use super::{warn_unavailable, ExternalAgent};

/// Confidence attached to an epithet correction sourced from upstream
/// search ranking. Below the auto-apply threshold: queued for review.
const RESOLUTION_CONFIDENCE: f64 = 0.85;

/// Confidence attached to a family correction sourced from the upstream
/// ancestry path. Below the auto-apply threshold: queued for review.
const ANCESTRY_CONFIDENCE: f64 = 0.9;

/// Verifies the species column against the upstream taxonomy.
pub struct TaxonAgent {
    hierarchy: Arc<HierarchyValidator>,
}

impl TaxonAgent {
    pub fn new(hierarchy: Arc<HierarchyValidator>) -> Self {
        Self { hierarchy }
    }
}

#[async_trait]
impl ExternalAgent for TaxonAgent {
    fn field(&self) -> FieldId {
        FieldId::Species
    }

    fn name(&self) -> &'static str {
        "taxon-agent"
    }

    async fn validate(&self, _value: Option<&str>, record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());
        // Without a genus there is no name to resolve; the genus rules
        // already reported the blank.
        let Some(genus) = record.field(FieldId::Genus) else {
            return result;
        };

        let assessment = match self.assess(genus, record).await {
            Ok(assessment) => assessment,
            Err(err) => {
                warn_unavailable(&mut result, "taxonomy", &err);
                return result;
            }
        };

        let Some(taxon) = &assessment.taxon else {
            result
                .warn(format!(
                    "{} '{}' not found in upstream taxonomy. Needs review.",
                    assessment.rank.label(),
                    assessment.searched
                ))
                .meta("needs_review", json!(true));
            return result;
        };

        result
            .meta("taxon_id", json!(taxon.id))
            .meta("resolved_name", json!(taxon.name))
            .meta("observations_count", json!(taxon.observations_count));
        if let Some(family) = &assessment.verified_family {
            result.meta("verified_family", json!(family));
        }

        // A fuzzy hit on a species/subspecies query means the submitted
        // epithet is probably misspelled; propose the upstream spelling
        // for review. Genus-only searches legitimately resolve deeper.
        if assessment.rank != crate::hierarchy::SearchedRank::Genus
            && !taxon.name.eq_ignore_ascii_case(&assessment.searched)
        {
            result.warn(format!(
                "'{}' resolved to '{}' upstream",
                assessment.searched, taxon.name
            ));
            if let Some(epithet) = taxon.name.split_whitespace().last() {
                if record
                    .field(FieldId::Species)
                    .is_some_and(|s| !s.eq_ignore_ascii_case(epithet))
                {
                    result.suggest(epithet, RESOLUTION_CONFIDENCE);
                }
            }
        }
        result
    }
}

impl TaxonAgent {
    async fn assess(
        &self,
        genus: &str,
        record: &Record,
    ) -> Result<HierarchyAssessment, crate::resolver::ResolveError> {
        self.hierarchy
            .assess(
                genus,
                record.field(FieldId::Species),
                record.field(FieldId::Subspecies),
                record.field(FieldId::Family),
            )
            .await
    }
}

/// Verifies the family column against the resolved taxon's ancestry.
pub struct FamilyAgent {
    hierarchy: Arc<HierarchyValidator>,
}

impl FamilyAgent {
    pub fn new(hierarchy: Arc<HierarchyValidator>) -> Self {
        Self { hierarchy }
    }
}

#[async_trait]
impl ExternalAgent for FamilyAgent {
    fn field(&self) -> FieldId {
        FieldId::Family
    }

    fn name(&self) -> &'static str {
        "hierarchy-agent"
    }

    async fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let (Some(declared), Some(genus)) = (value, record.field(FieldId::Genus)) else {
            return result;
        };

        let assessment = self
            .hierarchy
            .assess(
                genus,
                record.field(FieldId::Species),
                record.field(FieldId::Subspecies),
                Some(declared),
            )
            .await;

        match assessment {
            Ok(assessment) => {
                // Unresolved names are the taxon agent's finding; a family
                // verdict needs an ancestry to compare against.
                if let Some(suggested) = &assessment.suggested_family {
                    result
                        .warn(format!(
                            "Family '{declared}' conflicts with upstream ancestry \
                             for '{}'; upstream reports '{suggested}'",
                            assessment.searched
                        ))
                        .suggest(suggested.clone(), ANCESTRY_CONFIDENCE)
                        .meta("suggested_family", json!(suggested));
                } else if let Some(verified) = &assessment.verified_family {
                    result.meta("verified_family", json!(verified));
                }
            }
            Err(err) => warn_unavailable(&mut result, "family ancestry", &err),
        }
        result
    }
}
