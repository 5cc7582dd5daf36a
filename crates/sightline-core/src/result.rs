//! Validation result model.
//!
//! One `FieldValidationResult` per field per record, merged by the
//! [`Synthesizer`](crate::synthesizer::Synthesizer) into a
//! `RecordValidationResult` plus the five audit columns the output writer
//! appends to each row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::FieldId;

/// How a proposed correction was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// Format/case standardization of a value that is already right.
    Normalization,
    /// Rule-derived fill or rewrite of the value itself (e.g. year from
    /// first date).
    Substantive,
    /// Proposed by external name resolution or hierarchy comparison;
    /// requires human sign-off.
    ExternalSuggestion,
}

/// A proposed replacement value with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub value: String,
    pub confidence: f64,
    pub kind: CorrectionKind,
}

/// Verdict from a single field validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValidationResult {
    pub field: FieldId,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub correction: Option<Correction>,
    /// Structured side-channel: resolved taxon id, suggested family,
    /// evidence URLs. BTreeMap for deterministic ordering.
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Identifier of the validator that produced this result.
    pub validator: String,
}

impl FieldValidationResult {
    /// A passing result with no findings.
    pub fn new(field: FieldId, validator: impl Into<String>) -> Self {
        Self {
            field,
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            correction: None,
            metadata: BTreeMap::new(),
            validator: validator.into(),
        }
    }

    /// Record an error; the field (and record) will fail.
    pub fn error(&mut self, message: impl Into<String>) -> &mut Self {
        self.is_valid = false;
        self.errors.push(message.into());
        self
    }

    /// Record a non-fatal warning.
    pub fn warn(&mut self, message: impl Into<String>) -> &mut Self {
        self.warnings.push(message.into());
        self
    }

    /// Propose a format/case normalization. Confidence 1.0: safe to apply
    /// without review.
    pub fn normalize(&mut self, value: impl Into<String>) -> &mut Self {
        self.correction = Some(Correction {
            value: value.into(),
            confidence: 1.0,
            kind: CorrectionKind::Normalization,
        });
        self
    }

    /// Propose a rule-derived substantive fix. Confidence 1.0.
    pub fn autofill(&mut self, value: impl Into<String>) -> &mut Self {
        self.correction = Some(Correction {
            value: value.into(),
            confidence: 1.0,
            kind: CorrectionKind::Substantive,
        });
        self
    }

    /// Propose an externally-sourced replacement. Confidence below the
    /// auto-apply threshold; queued for human review.
    pub fn suggest(&mut self, value: impl Into<String>, confidence: f64) -> &mut Self {
        self.correction = Some(Correction {
            value: value.into(),
            confidence,
            kind: CorrectionKind::ExternalSuggestion,
        });
        self
    }

    /// Attach structured metadata.
    pub fn meta(&mut self, key: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Aggregate verdict for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// Every field valid, nothing changed.
    Pass,
    /// No errors; at least one correction was auto-applied.
    Corrected,
    /// At least one field reported an error.
    Fail,
    /// Aborted by the run deadline before all validators finished.
    Incomplete,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pass => "PASS",
            RecordStatus::Corrected => "CORRECTED",
            RecordStatus::Fail => "FAIL",
            RecordStatus::Incomplete => "INCOMPLETE",
        }
    }
}

/// The five columns appended to each output row.
///
/// Ordering and presence of these columns is the compatibility contract
/// with the output writer; see [`AuditColumns::HEADERS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditColumns {
    pub status: RecordStatus,
    /// Consolidated errors (or, when error-free, warnings), capped at the
    /// first three findings.
    pub notes: String,
    /// Original values of auto-corrected fields, `Field: value` pairs.
    pub original_values: String,
    pub confidence: f64,
    /// Originating validator identifiers, comma-joined.
    pub validated_by: String,
}

impl AuditColumns {
    /// Output column headings, in contract order.
    pub const HEADERS: [&'static str; 5] = [
        "Validation_Status",
        "Validation_Notes",
        "Original_Values",
        "Confidence_Score",
        "Validated_By",
    ];

    /// Render the columns as output cells, in contract order.
    pub fn cells(&self) -> [String; 5] {
        [
            self.status.as_str().to_string(),
            self.notes.clone(),
            self.original_values.clone(),
            format!("{:.1}", self.confidence),
            self.validated_by.clone(),
        ]
    }
}

/// Everything the run learned about one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordValidationResult {
    pub row_index: usize,
    pub status: RecordStatus,
    /// One result per field, in column order. Empty when `Incomplete`.
    pub fields: Vec<FieldValidationResult>,
    /// Corrections applied automatically (confidence at threshold).
    pub applied: BTreeMap<FieldId, Correction>,
    /// Corrections queued for human review.
    pub pending_review: BTreeMap<FieldId, Correction>,
    pub audit: AuditColumns,
    pub completed_at: DateTime<Utc>,
}

impl RecordValidationResult {
    /// Result for a record aborted by the run deadline.
    pub fn incomplete(row_index: usize) -> Self {
        Self {
            row_index,
            status: RecordStatus::Incomplete,
            fields: Vec::new(),
            applied: BTreeMap::new(),
            pending_review: BTreeMap::new(),
            audit: AuditColumns {
                status: RecordStatus::Incomplete,
                notes: "validation aborted before completion".to_string(),
                original_values: String::new(),
                confidence: 0.0,
                validated_by: String::new(),
            },
            completed_at: Utc::now(),
        }
    }

    /// The record with all auto-applied corrections written back.
    pub fn apply_to(&self, record: &crate::record::Record) -> crate::record::Record {
        let mut corrected = record.clone();
        for (field, correction) in &self.applied {
            corrected.set_field(*field, correction.value.clone());
        }
        corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods_accumulate() {
        let mut result = FieldValidationResult::new(FieldId::Genus, "genus-rules");
        result
            .warn("Genus should start with capital letter")
            .normalize("Danaus");

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        let correction = result.correction.as_ref().unwrap();
        assert_eq!(correction.value, "Danaus");
        assert_eq!(correction.kind, CorrectionKind::Normalization);
        assert_eq!(correction.confidence, 1.0);
    }

    #[test]
    fn test_error_clears_validity() {
        let mut result = FieldValidationResult::new(FieldId::Zone, "zone-rules");
        result.error("Zone is required");
        assert!(!result.is_valid);
    }

    #[test]
    fn test_audit_cells_order_matches_headers() {
        let audit = AuditColumns {
            status: RecordStatus::Corrected,
            notes: "Genus: capitalized".to_string(),
            original_values: "Genus: danaus".to_string(),
            confidence: 0.8,
            validated_by: "genus-rules".to_string(),
        };
        let cells = audit.cells();
        assert_eq!(AuditColumns::HEADERS[0], "Validation_Status");
        assert_eq!(cells[0], "CORRECTED");
        assert_eq!(cells[3], "0.8");
    }

    #[test]
    fn test_apply_to_writes_back_corrections() {
        use crate::record::Record;

        let record = Record {
            genus: Some("danaus".to_string()),
            ..Default::default()
        };
        let mut result = RecordValidationResult::incomplete(0);
        result.applied.insert(
            FieldId::Genus,
            Correction {
                value: "Danaus".to_string(),
                confidence: 1.0,
                kind: CorrectionKind::Normalization,
            },
        );

        let corrected = result.apply_to(&record);
        assert_eq!(corrected.genus.as_deref(), Some("Danaus"));
        assert_eq!(record.genus.as_deref(), Some("danaus"));
    }
}
