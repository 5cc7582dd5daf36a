//! External field agents.
//!
//! Each agent owns one field and layers upstream verification over the
//! deterministic rule result for that field: taxonomy for the species and
//! family columns, the gazetteer for the county column, observation
//! history for the record-claim columns.
//!
//! Agents never raise past their own boundary. Every upstream failure is
//! converted into a warning on the field result so one flaky lookup never
//! aborts the rest of the record or the run.

use async_trait::async_trait;

use sightline_core::{FieldId, FieldValidationResult, Record};

use crate::client::ClientError;
use crate::resolver::ResolveError;

mod place;
mod record_status;
mod taxon;

pub use place::PlaceAgent;
pub use record_status::{CountyRecordAgent, StateRecordAgent};
pub use taxon::{FamilyAgent, TaxonAgent};

/// A validator that needs the upstream service.
///
/// # Isolation Contract
/// Agents are independent: no shared mutable state beyond the cache and
/// circuit they read through, no access to other agents' results, and the
/// same record against the same upstream answers always produces the same
/// result.
#[async_trait]
pub trait ExternalAgent: Send + Sync {
    /// The field this agent owns.
    fn field(&self) -> FieldId;

    /// Identifier recorded in the audit trail.
    fn name(&self) -> &'static str;

    /// Validate the field value in the context of its record.
    async fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult;
}

/// Affirmative spellings accepted for a record-claim flag.
pub(crate) fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_uppercase().as_str(),
        "Y" | "YES" | "1" | "TRUE"
    )
}

/// Convert an upstream failure into a human-review warning on the result.
pub(crate) fn warn_unavailable(
    result: &mut FieldValidationResult,
    check: &str,
    err: &ResolveError,
) {
    let reason = match err {
        ResolveError::Client(ClientError::CircuitOpen { .. }) => {
            "upstream circuit open".to_string()
        }
        ResolveError::Client(ClientError::Timeout(_)) => "upstream timed out".to_string(),
        ResolveError::Client(ClientError::RateLimited { .. }) => "rate limited".to_string(),
        other => other.to_string(),
    };
    tracing::warn!(check, error = %err, "External check unavailable");
    result
        .warn(format!(
            "Could not verify {check} ({reason}); flagged for manual review"
        ))
        .meta("external_check_failed", serde_json::json!(true));
}
