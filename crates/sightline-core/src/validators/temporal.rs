//! Temporal field validators: First Date, Last Date, Year.
//!
//! Dates are canonicalized to dd-MMM-yy with an upper-cased month
//! (15-JUN-23). Contributors submit everything from ISO dates to regional
//! slash formats; parseable variants are normalized rather than rejected.

use chrono::{Datelike, NaiveDate, Utc};
use serde_json::json;

use crate::record::{FieldId, Record};
use crate::reference;
use crate::result::FieldValidationResult;

use super::{require, FieldValidator};

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Alternate layouts accepted for normalization, tried in order.
const ALTERNATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d/%m/%Y", "%d/%m/%y"];

/// Seasons older than this many years draw a staleness warning.
const STALE_YEARS: i32 = 3;

/// Parse a date in the canonical dd-MMM-yy layout. Two-digit years pivot
/// at 50: 00-49 map to 20xx, 50-99 to 19xx.
fn parse_canonical(value: &str) -> Option<NaiveDate> {
    let upper = value.to_uppercase();
    if !reference::is_canonical_date(&upper) {
        return None;
    }
    let mut parts = upper.split('-');
    let day: u32 = parts.next()?.parse().ok()?;
    let month = MONTHS.iter().position(|m| *m == parts.next()?)? as u32 + 1;
    let short_year: i32 = parts.next()?.parse().ok()?;
    let year = if short_year < 50 {
        2000 + short_year
    } else {
        1900 + short_year
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a submitted date in the canonical layout or any accepted
/// alternate layout.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Some(date) = parse_canonical(trimmed) {
        return Some(date);
    }
    ALTERNATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Render a date in the canonical dd-MMM-yy layout.
fn format_canonical(date: NaiveDate) -> String {
    format!(
        "{:02}-{}-{:02}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year() % 100
    )
}

/// Shared validation for the two date fields.
fn validate_date(result: &mut FieldValidationResult, raw: &str, warn_stale: bool) -> Option<NaiveDate> {
    let Some(date) = parse_flexible_date(raw) else {
        if reference::is_canonical_date(&raw.to_uppercase()) {
            result.error(format!("Invalid date: {raw}"));
        } else {
            result.error(format!("Could not parse date: {raw}"));
        }
        return None;
    };

    let canonical = format_canonical(date);
    if canonical != raw {
        result.normalize(canonical.clone());
    }

    let today = Utc::now().date_naive();
    if date > today {
        result.error(format!("Date cannot be in the future: {canonical}"));
    } else if warn_stale && today.year() - date.year() > STALE_YEARS {
        result.warn(format!("Date is more than {STALE_YEARS} years old: {}", date.year()));
    }

    result.meta("date", json!(date.to_string()));
    Some(date)
}

pub struct FirstDateValidator;

impl FieldValidator for FirstDateValidator {
    fn field(&self) -> FieldId {
        FieldId::FirstDate
    }

    fn name(&self) -> &'static str {
        "first-date-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let mut result = FieldValidationResult::new(self.field(), self.name());
        validate_date(&mut result, value.unwrap().trim(), true);
        result
    }
}

pub struct LastDateValidator;

impl FieldValidator for LastDateValidator {
    fn field(&self) -> FieldId {
        FieldId::LastDate
    }

    fn name(&self) -> &'static str {
        "last-date-rules"
    }

    fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let Some(raw) = value else {
            return result;
        };

        let last = validate_date(&mut result, raw.trim(), false);

        // Cross-field: a flight period cannot end before it starts.
        if let (Some(last), Some(first)) = (
            last,
            record.field(FieldId::FirstDate).and_then(parse_flexible_date),
        ) {
            if last < first {
                result.warn("Last Date is before First Date");
            }
        }
        result
    }
}

pub struct YearValidator;

impl FieldValidator for YearValidator {
    fn field(&self) -> FieldId {
        FieldId::Year
    }

    fn name(&self) -> &'static str {
        "year-rules"
    }

    fn validate(&self, value: Option<&str>, record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());

        let Some(raw) = value else {
            // Cross-field: backfill a missing year from a parseable first date.
            if let Some(first) = record.field(FieldId::FirstDate).and_then(parse_flexible_date) {
                result
                    .autofill(first.year().to_string())
                    .warn(format!("Year auto-filled from First Date: {}", first.year()));
            } else {
                result.error("Year is required");
            }
            return result;
        };

        let raw = raw.trim();
        match raw.parse::<i32>() {
            Ok(year) => {
                if !(1000..=9999).contains(&year) {
                    result.error("Year must be 4 digits");
                }
                let current = Utc::now().year();
                if year > current {
                    result.error(format!("Year cannot be in the future: {year}"));
                } else if current - year > STALE_YEARS {
                    result.warn(format!("Year is more than {STALE_YEARS} years old: {year}"));
                }
            }
            Err(_) => {
                result.error(format!("Year must be numeric: {raw}"));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_date_accepted_unchanged() {
        let result = FirstDateValidator.validate(Some("15-JUN-23"), &Record::default());
        assert!(result.is_valid);
        assert!(result.correction.is_none());
    }

    #[test]
    fn test_iso_date_normalized() {
        let result = FirstDateValidator.validate(Some("2023-06-15"), &Record::default());
        assert!(result.is_valid);
        assert_eq!(result.correction.unwrap().value, "15-JUN-23");
    }

    #[test]
    fn test_lowercase_month_normalized() {
        let result = FirstDateValidator.validate(Some("15-jun-23"), &Record::default());
        assert!(result.is_valid);
        assert_eq!(result.correction.unwrap().value, "15-JUN-23");
    }

    #[test]
    fn test_impossible_date_rejected() {
        let result = FirstDateValidator.validate(Some("31-FEB-23"), &Record::default());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_unparseable_date_rejected() {
        let result = FirstDateValidator.validate(Some("sometime in June"), &Record::default());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Could not parse"));
    }

    #[test]
    fn test_old_date_warns() {
        let result = FirstDateValidator.validate(Some("15-JUN-19"), &Record::default());
        assert!(result.is_valid);
        assert!(result.warnings[0].contains("more than 3 years old"));
    }

    #[test]
    fn test_future_date_fails() {
        let result = FirstDateValidator.validate(Some("01-JAN-49"), &Record::default());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("future"));
    }

    #[test]
    fn test_last_date_optional() {
        let result = LastDateValidator.validate(None, &Record::default());
        assert!(result.is_valid);
    }

    #[test]
    fn test_last_before_first_warns() {
        let record = Record {
            first_date: Some("20-JUN-23".to_string()),
            ..Default::default()
        };
        let result = LastDateValidator.validate(Some("10-JUN-23"), &record);
        assert!(result.is_valid);
        assert!(result.warnings[0].contains("before First Date"));
    }

    #[test]
    fn test_year_matches_range_rules() {
        let result = YearValidator.validate(Some("23"), &Record::default());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("4 digits"));
    }

    #[test]
    fn test_year_autofilled_from_first_date() {
        let record = Record {
            first_date: Some("15-JUN-23".to_string()),
            ..Default::default()
        };
        let result = YearValidator.validate(None, &record);
        assert!(result.is_valid);
        let correction = result.correction.unwrap();
        assert_eq!(correction.value, "2023");
        assert_eq!(correction.confidence, 1.0);
    }

    #[test]
    fn test_year_missing_without_first_date_fails() {
        let result = YearValidator.validate(None, &Record::default());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_future_year_fails() {
        let result = YearValidator.validate(Some("2999"), &Record::default());
        assert!(!result.is_valid);
    }

    proptest! {
        // Formatting then reparsing a date is lossless for the years the
        // two-digit pivot can represent.
        #[test]
        fn prop_canonical_roundtrip(year in 1950i32..2049, month in 1u32..=12, day in 1u32..=28) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let rendered = format_canonical(date);
            prop_assert_eq!(parse_canonical(&rendered), Some(date));
        }
    }
}
