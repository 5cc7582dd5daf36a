//! Geographic field validators: Zone, Country, State, County.

use crate::record::{FieldId, Record};
use crate::reference;
use crate::result::FieldValidationResult;

use super::{check_max_len, require, FieldValidator};

/// Reporting zone: integer 1-12, normalized to its canonical string form.
pub struct ZoneValidator;

impl FieldValidator for ZoneValidator {
    fn field(&self) -> FieldId {
        FieldId::Zone
    }

    fn name(&self) -> &'static str {
        "zone-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let raw = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());

        match raw.parse::<i64>() {
            Ok(zone) if reference::is_valid_zone(zone) => {
                let canonical = zone.to_string();
                if canonical != raw {
                    result.normalize(canonical);
                }
            }
            Ok(zone) => {
                result.error(format!("Zone must be between 1-12, got {zone}"));
            }
            Err(_) => {
                result.error(format!("Zone must be numeric, got {raw}"));
            }
        }
        result
    }
}

/// Country code: one of USA, CAN, MEX; upper-cased.
pub struct CountryValidator;

impl FieldValidator for CountryValidator {
    fn field(&self) -> FieldId {
        FieldId::Country
    }

    fn name(&self) -> &'static str {
        "country-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let raw = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let upper = raw.to_uppercase();

        if !reference::is_valid_country(&upper) {
            result.error(format!("Country must be USA, CAN, or MEX, got {raw}"));
        }
        if upper.chars().count() != 3 {
            result.error("Country must be exactly 3 characters");
        }
        if result.is_valid && upper != raw {
            result.normalize(upper);
        }
        result
    }
}

/// State/province code, validated against the table for the record's
/// country. Unknown Mexican codes are a warning only: the abbreviation
/// table for Mexico is not authoritative.
pub struct StateValidator;

impl FieldValidator for StateValidator {
    fn field(&self) -> FieldId {
        FieldId::State
    }

    fn name(&self) -> &'static str {
        "state-rules"
    }

    fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let raw = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let state = raw.to_uppercase();

        let country = record
            .field(FieldId::Country)
            .map(|c| c.trim().to_uppercase())
            .unwrap_or_default();

        match country.as_str() {
            "USA" => {
                if !reference::is_us_state(&state) {
                    result.error(format!("Invalid US state: {state}"));
                }
            }
            "CAN" => {
                if !reference::is_can_province(&state) {
                    result.error(format!("Invalid Canadian province: {state}"));
                }
            }
            "MEX" => {
                if !reference::is_mex_state(&state) {
                    result.warn(format!("Please verify Mexican state code: {state}"));
                }
            }
            _ => {}
        }

        check_max_len(&mut result, &state);
        if result.is_valid && state != raw {
            result.normalize(state);
        }
        result
    }
}

/// County name: bounded length, no "County"/"Province"/"Territory" suffix.
pub struct CountyValidator;

impl CountyValidator {
    const SUFFIXES: [&'static str; 3] = ["County", "Province", "Territory"];
}

impl FieldValidator for CountyValidator {
    fn field(&self) -> FieldId {
        FieldId::County
    }

    fn name(&self) -> &'static str {
        "county-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let county = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());

        check_max_len(&mut result, county);

        if Self::SUFFIXES.iter().any(|s| county.contains(s)) {
            result.warn("Remove 'County/Province/Territory' from name");
            let mut cleaned = county.to_string();
            for suffix in Self::SUFFIXES {
                cleaned = cleaned.replace(suffix, "");
            }
            result.normalize(cleaned.trim().to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usa_record() -> Record {
        Record {
            country: Some("USA".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_zone_in_range_passes() {
        let result = ZoneValidator.validate(Some("8"), &Record::default());
        assert!(result.is_valid);
        assert!(result.correction.is_none());
    }

    #[test]
    fn test_zone_normalizes_padded_numbers() {
        let result = ZoneValidator.validate(Some("08"), &Record::default());
        assert!(result.is_valid);
        assert_eq!(result.correction.unwrap().value, "8");
    }

    #[test]
    fn test_zone_out_of_range_fails() {
        let result = ZoneValidator.validate(Some("13"), &Record::default());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_zone_non_numeric_fails() {
        let result = ZoneValidator.validate(Some("north"), &Record::default());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("numeric"));
    }

    #[test]
    fn test_country_upcased() {
        let result = CountryValidator.validate(Some("usa"), &Record::default());
        assert!(result.is_valid);
        assert_eq!(result.correction.unwrap().value, "USA");
    }

    #[test]
    fn test_country_unknown_fails() {
        let result = CountryValidator.validate(Some("GBR"), &Record::default());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_state_valid_for_country() {
        let result = StateValidator.validate(Some("TX"), &usa_record());
        assert!(result.is_valid);
    }

    #[test]
    fn test_state_wrong_country_fails() {
        // Ontario is not a US state.
        let result = StateValidator.validate(Some("ON"), &usa_record());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_mexican_state_only_warns() {
        let record = Record {
            country: Some("MEX".to_string()),
            ..Default::default()
        };
        let result = StateValidator.validate(Some("XXX"), &record);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_county_suffix_stripped() {
        let result = CountyValidator.validate(Some("Travis County"), &Record::default());
        assert!(result.is_valid);
        assert_eq!(result.correction.unwrap().value, "Travis");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_county_too_long_fails() {
        let long = "A".repeat(21);
        let result = CountyValidator.validate(Some(&long), &Record::default());
        assert!(!result.is_valid);
    }
}
