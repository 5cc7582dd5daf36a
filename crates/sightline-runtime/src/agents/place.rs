//! Geography agent: county resolution against the upstream gazetteer.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use sightline_core::{FieldId, FieldValidationResult, Record};

use crate::resolver::{NameResolver, ResolveError};

use super::{warn_unavailable, ExternalAgent};

/// Resolves the county column to an upstream place id.
///
/// The resolved id lands in the result metadata so the record-claim
/// agents can scope observation counts without re-resolving.
pub struct PlaceAgent {
    resolver: Arc<NameResolver>,
}

impl PlaceAgent {
    pub fn new(resolver: Arc<NameResolver>) -> Self {
        Self { resolver }
    }

    /// Gazetteer query for a record's county, qualified by state when one
    /// is present ("Travis, TX" beats the bare "Travis").
    fn place_query(county: &str, record: &Record) -> String {
        match record.field(FieldId::State) {
            Some(state) => format!("{county}, {state}"),
            None => county.to_string(),
        }
    }
}

#[async_trait]
impl ExternalAgent for PlaceAgent {
    fn field(&self) -> FieldId {
        FieldId::County
    }

    fn name(&self) -> &'static str {
        "place-agent"
    }

    async fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let Some(county) = value else {
            return result;
        };

        let query = Self::place_query(county, record);
        match self.resolver.resolve_place(&query, 5).await {
            Ok(place) => {
                result
                    .meta("place_id", json!(place.id))
                    .meta("place_name", json!(place.display_name));
                if let Some(level) = place.admin_level {
                    result.meta("admin_level", json!(level));
                }
            }
            Err(ResolveError::NotFound(_)) => {
                result
                    .warn(format!(
                        "Place '{query}' not found in upstream gazetteer. Needs review."
                    ))
                    .meta("needs_review", json!(true));
            }
            Err(err) => warn_unavailable(&mut result, "place", &err),
        }
        result
    }
}
