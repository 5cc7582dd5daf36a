//! Deterministic field validators.
//!
//! One validator per season-summary field. Each receives the raw field
//! value and the full record (for cross-field checks) and returns a
//! [`FieldValidationResult`]; none of them touch the network. External
//! verification (taxonomy, geography, record status) is layered on top of
//! these in `sightline-runtime`.

use crate::record::{FieldId, Record};
use crate::result::FieldValidationResult;

mod geographic;
mod metadata;
mod records;
mod taxonomic;
mod temporal;

pub use geographic::{CountryValidator, CountyValidator, StateValidator, ZoneValidator};
pub use metadata::{CommentValidator, ContributorValidator, LocationValidator};
pub use records::{CountyRecordValidator, StateRecordValidator};
pub use taxonomic::{FamilyValidator, GenusValidator, SpeciesValidator, SubspeciesValidator};
pub use temporal::{parse_flexible_date, FirstDateValidator, LastDateValidator, YearValidator};

/// A deterministic validator for one field.
///
/// # Isolation Contract
/// Validators are independent: no shared mutable state, no access to other
/// validators' results, and identical input always produces an identical
/// result.
pub trait FieldValidator: Send + Sync {
    /// The field this validator owns.
    fn field(&self) -> FieldId;

    /// Identifier recorded in the audit trail.
    fn name(&self) -> &'static str;

    /// Validate the field value in the context of its record.
    fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult;
}

/// The fixed validator table, one entry per field, in column order.
pub fn registry() -> Vec<Box<dyn FieldValidator>> {
    vec![
        Box::new(ZoneValidator),
        Box::new(CountryValidator),
        Box::new(StateValidator),
        Box::new(FamilyValidator),
        Box::new(GenusValidator),
        Box::new(SpeciesValidator),
        Box::new(SubspeciesValidator),
        Box::new(CountyValidator),
        Box::new(StateRecordValidator),
        Box::new(CountyRecordValidator),
        Box::new(LocationValidator),
        Box::new(FirstDateValidator),
        Box::new(LastDateValidator),
        Box::new(ContributorValidator),
        Box::new(CommentValidator),
        Box::new(YearValidator),
    ]
}

/// Required-field guard. Returns a failing result when the value is blank,
/// otherwise `None`.
pub(crate) fn require(
    field: FieldId,
    validator: &'static str,
    value: Option<&str>,
) -> Option<FieldValidationResult> {
    if value.is_none() {
        let mut result = FieldValidationResult::new(field, validator);
        result.error(format!("{} is required", field.display_name()));
        return Some(result);
    }
    None
}

/// Length guard against the schema's per-field maximum.
pub(crate) fn check_max_len(result: &mut FieldValidationResult, value: &str) {
    if let Some(max) = result.field.max_len() {
        let len = value.chars().count();
        if len > max {
            result.error(format!(
                "{} exceeds {} characters: {}",
                result.field.display_name(),
                max,
                len
            ));
        }
    }
}
