//! Free-text field validators: Specific Location, Name (contributor
//! code), Comments.

use serde_json::json;

use crate::record::{FieldId, Record};
use crate::reference;
use crate::result::FieldValidationResult;

use super::{check_max_len, require, FieldValidator};

pub struct LocationValidator;

impl FieldValidator for LocationValidator {
    fn field(&self) -> FieldId {
        FieldId::Location
    }

    fn name(&self) -> &'static str {
        "location-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let location = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());

        check_max_len(&mut result, location);
        if !result.is_valid {
            // Preserve the overflow so an editor can move it to Comments.
            let max = self.field().max_len().unwrap();
            if let Some((cut, _)) = location.char_indices().nth(max) {
                result.meta("overflow_to_comments", json!(location[cut..].to_string()));
            }
        }
        result
    }
}

/// Contributor initials, up to three characters. Matching against the
/// contributor master list happens during editorial review.
pub struct ContributorValidator;

impl FieldValidator for ContributorValidator {
    fn field(&self) -> FieldId {
        FieldId::Contributor
    }

    fn name(&self) -> &'static str {
        "contributor-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let Some(code) = value else {
            return result;
        };
        let code = code.trim();

        if code.chars().count() > 3 {
            result.error("Name code must be 3 characters or less");
        }
        result.meta("needs_contributor_check", json!(true));
        result
    }
}

pub struct CommentValidator;

impl FieldValidator for CommentValidator {
    fn field(&self) -> FieldId {
        FieldId::Comment
    }

    fn name(&self) -> &'static str {
        "comment-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let Some(comment) = value else {
            return result;
        };
        let comment = comment.trim();

        check_max_len(&mut result, comment);

        if reference::contains_gps_coords(comment) {
            result.meta("has_gps_coords", json!(true));
        }
        result
    }
}
