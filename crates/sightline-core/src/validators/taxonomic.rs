//! Taxonomic field validators: Family, Genus, Species, Subspecies.
//!
//! These are the deterministic halves: casing, length, and the
//! common-families screen. Whether the names exist upstream and agree with
//! each other is checked by the runtime's taxon agents.

use serde_json::json;

use crate::record::{FieldId, Record};
use crate::reference;
use crate::result::FieldValidationResult;

use super::{check_max_len, require, FieldValidator};

/// Metadata key flagging a field for external taxonomy verification.
pub(crate) const NEEDS_EXTERNAL_CHECK: &str = "needs_external_check";

pub struct FamilyValidator;

impl FieldValidator for FamilyValidator {
    fn field(&self) -> FieldId {
        FieldId::Family
    }

    fn name(&self) -> &'static str {
        "family-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let family = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());

        check_max_len(&mut result, family);

        if !reference::is_common_family(family) {
            result
                .warn(format!("Uncommon family name: {family}. Please verify."))
                .meta(NEEDS_EXTERNAL_CHECK, json!(true));
        }
        result
    }
}

pub struct GenusValidator;

impl FieldValidator for GenusValidator {
    fn field(&self) -> FieldId {
        FieldId::Genus
    }

    fn name(&self) -> &'static str {
        "genus-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let genus = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());

        check_max_len(&mut result, genus);

        if !genus.chars().next().is_some_and(|c| c.is_uppercase()) {
            result
                .warn("Genus should start with capital letter")
                .normalize(capitalize(genus));
        }
        result.meta(NEEDS_EXTERNAL_CHECK, json!(true));
        result
    }
}

pub struct SpeciesValidator;

impl FieldValidator for SpeciesValidator {
    fn field(&self) -> FieldId {
        FieldId::Species
    }

    fn name(&self) -> &'static str {
        "species-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        if let Some(missing) = require(self.field(), self.name(), value) {
            return missing;
        }
        let raw = value.unwrap().trim();
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let epithet = raw.to_lowercase();

        check_max_len(&mut result, &epithet);

        // Species epithets are always lower case.
        if epithet != raw {
            result.normalize(epithet);
        }
        result.meta(NEEDS_EXTERNAL_CHECK, json!(true));
        result
    }
}

pub struct SubspeciesValidator;

impl FieldValidator for SubspeciesValidator {
    fn field(&self) -> FieldId {
        FieldId::Subspecies
    }

    fn name(&self) -> &'static str {
        "subspecies-rules"
    }

    fn validate(&self, value: Option<&str>, _record: &Record) -> FieldValidationResult {
        let mut result = FieldValidationResult::new(self.field(), self.name());
        let Some(raw) = value else {
            return result;
        };
        let raw = raw.trim();
        let epithet = raw.to_lowercase();

        check_max_len(&mut result, &epithet);

        if epithet != raw {
            result.normalize(epithet);
        }
        result
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
