//! Record-claim flag validators: State Record, County Record.
//!
//! A `Y` here claims the first known occurrence of the taxon in that
//! state or county. The flag's syntax is checked here; corroborating the
//! claim against existing observations is the runtime's job.

use serde_json::json;

use crate::record::{FieldId, Record};
use crate::result::FieldValidationResult;

use super::FieldValidator;

/// Metadata key flagging a record claim for external verification.
pub(crate) const NEEDS_RECORD_VERIFICATION: &str = "needs_record_verification";

fn validate_flag(
    field: FieldId,
    validator: &'static str,
    value: Option<&str>,
) -> FieldValidationResult {
    let mut result = FieldValidationResult::new(field, validator);
    let Some(raw) = value else {
        return result;
    };
    let raw = raw.trim();
    let upper = raw.to_uppercase();

    if upper != "Y" && upper != "N" {
        result.error(format!("{} must be Y, N, or blank", field.display_name()));
        return result;
    }
    if upper != raw {
        result.normalize(upper.clone());
    }
    if upper == "Y" {
        result.meta(NEEDS_RECORD_VERIFICATION, json!(true));
    }
    result
}

pub struct StateRecordValidator;

impl FieldValidator for StateRecordValidator {
    fn field(&self) -> FieldId {
        FieldId::StateRecord
    }

    fn name(&self) -> &'static str {
        "state-record-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        validate_flag(self.field(), self.name(), value)
    }
}

pub struct CountyRecordValidator;

impl FieldValidator for CountyRecordValidator {
    fn field(&self) -> FieldId {
        FieldId::CountyRecord
    }

    fn name(&self) -> &'static str {
        "county-record-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        validate_flag(self.field(), self.name(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_flag_passes() {
        let result = StateRecordValidator.validate(None, &Record::default());
        assert!(result.is_valid);
        assert!(!result.metadata.contains_key(NEEDS_RECORD_VERIFICATION));
    }

    #[test]
    fn test_lowercase_flag_normalized() {
        let result = StateRecordValidator.validate(Some("y"), &Record::default());
        assert!(result.is_valid);
        assert_eq!(result.correction.unwrap().value, "Y");
        assert_eq!(result.metadata[NEEDS_RECORD_VERIFICATION], json!(true));
    }

    #[test]
    fn test_invalid_flag_fails() {
        let result = CountyRecordValidator.validate(Some("maybe"), &Record::default());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_negative_flag_passes_without_verification() {
        let result = CountyRecordValidator.validate(Some("N"), &Record::default());
        assert!(result.is_valid);
        assert!(!result.metadata.contains_key(NEEDS_RECORD_VERIFICATION));
    }
}
