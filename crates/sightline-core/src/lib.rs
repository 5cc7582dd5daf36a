//! # sightline-core
//!
//! Deterministic validation of biodiversity season-summary records.
//!
//! This crate holds the static half of the Sightline pipeline: the record
//! schema, one rule-based validator per field, and the synthesizer that
//! merges field verdicts into a record verdict with audit columns.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same record always produces the same result
//! 2. **No network calls**: external taxonomy/geography verification lives
//!    in `sightline-runtime`
//! 3. **Non-aborting**: a bad field never stops the other fields or rows
//! 4. **Traceable**: every correction carries its origin and confidence
//!
//! ## Example
//!
//! ```rust,ignore
//! use sightline_core::{validate_record, Record, RecordStatus};
//!
//! let record = Record {
//!     genus: Some("danaus".into()),
//!     species: Some("plexippus".into()),
//!     ..Default::default()
//! };
//! let result = validate_record(0, &record);
//!
//! match result.status {
//!     RecordStatus::Pass => println!("clean"),
//!     RecordStatus::Corrected => println!("fixed: {}", result.audit.original_values),
//!     RecordStatus::Fail => println!("problems: {}", result.audit.notes),
//!     RecordStatus::Incomplete => unreachable!("no deadline in pure validation"),
//! }
//! ```

pub mod qa;
pub mod record;
pub mod reference;
pub mod result;
pub mod synthesizer;
pub mod validators;

// Re-export main types at crate root
pub use record::{FieldId, Record};
pub use result::{
    AuditColumns, Correction, CorrectionKind, FieldValidationResult, RecordStatus,
    RecordValidationResult,
};
pub use synthesizer::{Synthesizer, AUTO_APPLY_THRESHOLD};
pub use validators::FieldValidator;

/// Run every deterministic field validator over one record and merge the
/// verdicts.
///
/// This is the pure entry point: no caching, no network, no external
/// suggestions. The runtime orchestrator layers external verification on
/// top of the same validators.
pub fn validate_record(row_index: usize, record: &Record) -> RecordValidationResult {
    let synthesizer = Synthesizer::new();
    let fields = validators::registry()
        .iter()
        .map(|v| v.validate(record.field(v.field()), record))
        .collect();
    synthesizer.synthesize(row_index, record, fields)
}

/// Validate a batch of records and apply the cross-row QA pass.
pub fn validate_records(records: &[Record]) -> Vec<RecordValidationResult> {
    let synthesizer = Synthesizer::new();
    let mut results: Vec<_> = records
        .iter()
        .enumerate()
        .map(|(row, record)| validate_record(row, record))
        .collect();
    qa::enforce_record_uniqueness(records, &mut results, &synthesizer);
    results
}
