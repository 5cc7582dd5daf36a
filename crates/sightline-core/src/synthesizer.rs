//! Synthesizer: merges field verdicts into a record verdict.
//!
//! The aggregation rules are fixed policy, not a tuning toy:
//! 1. Any field error → FAIL
//! 2. Else any auto-applied correction → CORRECTED
//! 3. Else → PASS
//!
//! A correction is auto-applied only at full confidence (direct rule-based
//! fixes). Anything sourced from external name resolution or hierarchy
//! comparison arrives below the threshold and is queued for human review.

use chrono::Utc;
use std::collections::BTreeMap;

use crate::record::Record;
use crate::result::{
    AuditColumns, Correction, FieldValidationResult, RecordStatus, RecordValidationResult,
};

/// Minimum confidence for applying a correction without review.
pub const AUTO_APPLY_THRESHOLD: f64 = 1.0;

/// Findings included in the consolidated notes column.
const NOTES_LIMIT: usize = 3;

pub struct Synthesizer {
    threshold: f64,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self {
            threshold: AUTO_APPLY_THRESHOLD,
        }
    }

    /// Override the auto-apply threshold (tests and review tooling only;
    /// production runs keep the default).
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Merge the ordered field results for one record.
    pub fn synthesize(
        &self,
        row_index: usize,
        record: &Record,
        fields: Vec<FieldValidationResult>,
    ) -> RecordValidationResult {
        let mut applied: BTreeMap<_, Correction> = BTreeMap::new();
        let mut pending_review: BTreeMap<_, Correction> = BTreeMap::new();

        for field_result in &fields {
            let Some(correction) = &field_result.correction else {
                continue;
            };
            // A correction identical to the submitted value is a no-op.
            if record.field(field_result.field) == Some(correction.value.as_str()) {
                continue;
            }
            if correction.confidence >= self.threshold {
                applied.insert(field_result.field, correction.clone());
            } else {
                pending_review.insert(field_result.field, correction.clone());
            }
        }

        let status = if fields.iter().any(|f| !f.is_valid) {
            RecordStatus::Fail
        } else if !applied.is_empty() {
            RecordStatus::Corrected
        } else {
            RecordStatus::Pass
        };

        let audit = build_audit(status, record, &fields, &applied);

        RecordValidationResult {
            row_index,
            status,
            fields,
            applied,
            pending_review,
            audit,
            completed_at: Utc::now(),
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn build_audit(
    status: RecordStatus,
    record: &Record,
    fields: &[FieldValidationResult],
    applied: &BTreeMap<crate::record::FieldId, Correction>,
) -> AuditColumns {
    let errors: Vec<String> = fields
        .iter()
        .flat_map(|f| f.errors.iter().map(|e| format!("{}: {}", f.field, e)))
        .collect();
    let warnings: Vec<String> = fields
        .iter()
        .flat_map(|f| f.warnings.iter().map(|w| format!("{}: {}", f.field, w)))
        .collect();

    let notes = if !errors.is_empty() {
        errors.iter().take(NOTES_LIMIT).cloned().collect::<Vec<_>>().join("; ")
    } else {
        warnings.iter().take(NOTES_LIMIT).cloned().collect::<Vec<_>>().join("; ")
    };

    let original_values = applied
        .keys()
        .map(|field| match record.field(*field) {
            Some(original) => format!("{field}: {original}"),
            None => format!("{field}: (blank)"),
        })
        .collect::<Vec<_>>()
        .join("; ");

    let mut validated_by: Vec<&str> = Vec::new();
    for f in fields {
        let contributed =
            !f.errors.is_empty() || !f.warnings.is_empty() || f.correction.is_some();
        if contributed && !validated_by.contains(&f.validator.as_str()) {
            validated_by.push(&f.validator);
        }
    }
    let validated_by = if validated_by.is_empty() {
        "field-rules".to_string()
    } else {
        validated_by.join(", ")
    };

    let confidence = match status {
        RecordStatus::Pass => 1.0,
        RecordStatus::Corrected => 0.8,
        RecordStatus::Fail => 0.5,
        RecordStatus::Incomplete => 0.0,
    };

    AuditColumns {
        status,
        notes,
        original_values,
        confidence,
        validated_by,
    }
}
