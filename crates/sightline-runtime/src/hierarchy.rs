//! Taxonomic hierarchy verification.
//!
//! Given the declared family/genus/species/subspecies strings of a record,
//! resolve the most specific name and walk its upstream ancestry to check
//! that the declared family is the one the taxonomy actually reports.
//!
//! A mismatch is never an error: taxonomy membership can be legitimately
//! contested, so it surfaces as a warning with the upstream family as a
//! suggested correction. Absence from the upstream database is likewise a
//! human-review warning, not proof of an invalid record.

use std::sync::Arc;

use crate::provider::TaxonRecord;
use crate::resolver::{NameResolver, ResolveError};

/// Which rank the hierarchy check searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchedRank {
    Genus,
    Species,
    Subspecies,
}

impl SearchedRank {
    pub fn label(&self) -> &'static str {
        match self {
            SearchedRank::Genus => "Genus",
            SearchedRank::Species => "Species",
            SearchedRank::Subspecies => "Sub-species",
        }
    }
}

/// Outcome of a hierarchy check.
#[derive(Debug, Clone)]
pub struct HierarchyAssessment {
    /// The name that was searched upstream.
    pub searched: String,

    pub rank: SearchedRank,

    /// The resolved taxon; `None` when the upstream knows no such name.
    pub taxon: Option<TaxonRecord>,

    /// Family reported by the upstream ancestry, when available.
    pub verified_family: Option<String>,

    /// Set when the declared family conflicts with the upstream ancestry;
    /// holds the upstream family as the suggested correction.
    pub suggested_family: Option<String>,
}

impl HierarchyAssessment {
    /// Resolved and free of family conflicts.
    pub fn is_consistent(&self) -> bool {
        self.taxon.is_some() && self.suggested_family.is_none()
    }
}

/// Checks declared taxonomy against the upstream ancestry path.
pub struct HierarchyValidator {
    resolver: Arc<NameResolver>,
}

impl HierarchyValidator {
    pub fn new(resolver: Arc<NameResolver>) -> Self {
        Self { resolver }
    }

    /// Assess hierarchy consistency for one record's taxon fields.
    ///
    /// Resolves the most specific available name (subspecies over species
    /// over genus). `Ok` with `taxon: None` means the name is unknown
    /// upstream; `Err` is reserved for service failures.
    pub async fn assess(
        &self,
        genus: &str,
        species: Option<&str>,
        subspecies: Option<&str>,
        declared_family: Option<&str>,
    ) -> Result<HierarchyAssessment, ResolveError> {
        let (searched, rank) = match (species, subspecies) {
            (Some(sp), Some(ssp)) => (format!("{genus} {sp} {ssp}"), SearchedRank::Subspecies),
            (Some(sp), None) => (format!("{genus} {sp}"), SearchedRank::Species),
            _ => (genus.to_string(), SearchedRank::Genus),
        };

        let taxon = match self.resolver.resolve_taxon(&searched, 5).await {
            Ok(taxon) => taxon,
            Err(ResolveError::NotFound(_)) => {
                tracing::debug!(searched = %searched, "Taxon unknown upstream");
                return Ok(HierarchyAssessment {
                    searched,
                    rank,
                    taxon: None,
                    verified_family: None,
                    suggested_family: None,
                });
            }
            Err(err) => return Err(err),
        };

        // Search hits come back without ancestor entries; the detail
        // lookup fills in the ancestry path.
        let taxon = if taxon.ancestors.is_empty() && !taxon.ancestor_ids.is_empty() {
            match self.resolver.taxon_by_id(taxon.id).await {
                Ok(detail) => detail,
                Err(ResolveError::NotFound(_)) => taxon,
                Err(err) => return Err(err),
            }
        } else {
            taxon
        };

        let verified_family = taxon.family_ancestor().map(|a| a.name.clone());
        let suggested_family = match (declared_family, &verified_family) {
            (Some(declared), Some(actual)) if !declared.eq_ignore_ascii_case(actual) => {
                tracing::debug!(
                    declared = %declared,
                    actual = %actual,
                    taxon_id = taxon.id,
                    "Hierarchy mismatch"
                );
                Some(actual.clone())
            }
            _ => None,
        };

        Ok(HierarchyAssessment {
            searched,
            rank,
            taxon: Some(taxon),
            verified_family,
            suggested_family,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LookupCache;
    use crate::client::ResilientClient;
    use crate::config::CacheTtls;
    use crate::testutil::MockProvider;

    fn validator_over(provider: Arc<MockProvider>) -> HierarchyValidator {
        let client = Arc::new(ResilientClient::new(provider));
        let resolver = Arc::new(NameResolver::new(
            client,
            Arc::new(LookupCache::default()),
            CacheTtls::default(),
        ));
        HierarchyValidator::new(resolver)
    }

    #[tokio::test]
    async fn test_consistent_hierarchy() {
        let provider = Arc::new(MockProvider::with_monarch());
        let validator = validator_over(provider);

        let assessment = validator
            .assess("Danaus", Some("plexippus"), None, Some("Nymphalidae"))
            .await
            .unwrap();

        assert!(assessment.is_consistent());
        assert_eq!(assessment.rank, SearchedRank::Species);
        assert_eq!(assessment.verified_family.as_deref(), Some("Nymphalidae"));
        assert_eq!(assessment.taxon.unwrap().id, 48662);
    }

    #[tokio::test]
    async fn test_family_compare_is_case_insensitive() {
        let provider = Arc::new(MockProvider::with_monarch());
        let validator = validator_over(provider);

        let assessment = validator
            .assess("Danaus", Some("plexippus"), None, Some("NYMPHALIDAE"))
            .await
            .unwrap();
        assert!(assessment.is_consistent());
    }

    #[tokio::test]
    async fn test_mismatch_suggests_upstream_family() {
        let provider = Arc::new(MockProvider::with_monarch());
        let validator = validator_over(provider);

        let assessment = validator
            .assess("Danaus", Some("plexippus"), None, Some("Pieridae"))
            .await
            .unwrap();

        assert!(!assessment.is_consistent());
        assert_eq!(assessment.suggested_family.as_deref(), Some("Nymphalidae"));
    }

    #[tokio::test]
    async fn test_unknown_species_reports_no_taxon() {
        let provider = Arc::new(MockProvider::empty());
        let validator = validator_over(provider);

        let assessment = validator
            .assess("Danaus", Some("plexipus"), None, Some("Nymphalidae"))
            .await
            .unwrap();

        assert!(assessment.taxon.is_none());
        assert_eq!(assessment.rank, SearchedRank::Species);
        assert_eq!(assessment.searched, "Danaus plexipus");
    }

    #[tokio::test]
    async fn test_most_specific_name_wins() {
        let provider = Arc::new(MockProvider::empty());
        let validator = validator_over(provider);

        let assessment = validator
            .assess(
                "Danaus",
                Some("plexippus"),
                Some("thersippus"),
                Some("Nymphalidae"),
            )
            .await
            .unwrap();

        assert_eq!(assessment.rank, SearchedRank::Subspecies);
        assert_eq!(assessment.searched, "Danaus plexippus thersippus");
    }

    #[tokio::test]
    async fn test_genus_only_resolution() {
        let provider = Arc::new(MockProvider::with_monarch());
        let validator = validator_over(provider);

        let assessment = validator.assess("Danaus", None, None, None).await.unwrap();
        assert_eq!(assessment.rank, SearchedRank::Genus);
        assert!(assessment.taxon.is_some());
        assert!(assessment.suggested_family.is_none());
    }

    #[tokio::test]
    async fn test_detail_lookup_fills_ancestry() {
        // The search hit has ancestor ids but no entries; the validator
        // must fetch the detail to verify the family.
        let provider = Arc::new(MockProvider::with_monarch());
        let validator = validator_over(provider.clone());

        let assessment = validator
            .assess("Danaus", Some("plexippus"), None, Some("Nymphalidae"))
            .await
            .unwrap();
        assert_eq!(assessment.verified_family.as_deref(), Some("Nymphalidae"));
        // One search, one detail.
        assert_eq!(provider.calls(), 2);
    }
}
