//! Cross-row QA pass.
//!
//! Per-record validation cannot see duplicate record claims, so a final
//! pass enforces them across the whole run:
//! - at most one state-record claim per species
//! - at most one county-record claim per species and county
//!
//! Among duplicates, the occurrence with the earliest first date keeps the
//! claim (ties go to the earlier row); the rest fail with an error naming
//! the winning row.

use std::collections::BTreeMap;

use crate::record::{FieldId, Record};
use crate::result::RecordValidationResult;
use crate::synthesizer::Synthesizer;
use crate::validators::parse_flexible_date;

/// Affirmative spellings accepted for a record-claim flag.
fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_uppercase().as_str(),
        "Y" | "YES" | "1" | "TRUE"
    )
}

/// Enforce record-claim uniqueness across all rows of a run.
///
/// `records` and `results` are matched by `row_index`; incomplete results
/// are left untouched.
pub fn enforce_record_uniqueness(
    records: &[Record],
    results: &mut [RecordValidationResult],
    synthesizer: &Synthesizer,
) {
    let species_groups = group_by_species(records);

    // Position of each row's result, keyed by row index.
    let result_slots: BTreeMap<usize, usize> = results
        .iter()
        .enumerate()
        .map(|(slot, r)| (r.row_index, slot))
        .collect();

    for rows in species_groups.values() {
        enforce_state_claims(records, results, &result_slots, rows, synthesizer);
        enforce_county_claims(records, results, &result_slots, rows, synthesizer);
    }
}

fn group_by_species(records: &[Record]) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (row, record) in records.iter().enumerate() {
        if let Some(key) = record.species_key() {
            groups.entry(key).or_default().push(row);
        }
    }
    groups
}

fn enforce_state_claims(
    records: &[Record],
    results: &mut [RecordValidationResult],
    result_slots: &BTreeMap<usize, usize>,
    rows: &[usize],
    synthesizer: &Synthesizer,
) {
    let claimants: Vec<usize> = rows
        .iter()
        .copied()
        .filter(|row| {
            records[*row]
                .field(FieldId::StateRecord)
                .is_some_and(is_affirmative)
        })
        .collect();
    if claimants.len() < 2 {
        return;
    }

    let winner = earliest_claim(records, &claimants);
    for row in claimants {
        if row == winner {
            continue;
        }
        fail_claim(
            records,
            results,
            result_slots,
            row,
            FieldId::StateRecord,
            format!(
                "Duplicate state record for species. Only row {} (earliest date) should be marked as state record.",
                winner + 1
            ),
            synthesizer,
        );
    }
}

fn enforce_county_claims(
    records: &[Record],
    results: &mut [RecordValidationResult],
    result_slots: &BTreeMap<usize, usize>,
    rows: &[usize],
    synthesizer: &Synthesizer,
) {
    let mut by_county: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in rows.iter().copied() {
        let claimed = records[row]
            .field(FieldId::CountyRecord)
            .is_some_and(is_affirmative);
        if claimed {
            let county = records[row]
                .field(FieldId::County)
                .unwrap_or("")
                .trim()
                .to_string();
            by_county.entry(county).or_default().push(row);
        }
    }

    for (county, claimants) in by_county {
        if claimants.len() < 2 {
            continue;
        }
        let winner = earliest_claim(records, &claimants);
        for row in claimants {
            if row == winner {
                continue;
            }
            fail_claim(
                records,
                results,
                result_slots,
                row,
                FieldId::CountyRecord,
                format!(
                    "Duplicate county record for species in {}. Only row {} (earliest date) should be marked as county record.",
                    county,
                    winner + 1
                ),
                synthesizer,
            );
        }
    }
}

/// Earliest first date among claimants; undated rows sort last, ties go to
/// the earlier row.
fn earliest_claim(records: &[Record], claimants: &[usize]) -> usize {
    claimants
        .iter()
        .copied()
        .min_by_key(|row| {
            let date = records[*row]
                .field(FieldId::FirstDate)
                .and_then(parse_flexible_date);
            (date.is_none(), date.unwrap_or(chrono::NaiveDate::MAX))
        })
        .expect("claimants is non-empty")
}

fn fail_claim(
    records: &[Record],
    results: &mut [RecordValidationResult],
    result_slots: &BTreeMap<usize, usize>,
    row: usize,
    field: FieldId,
    message: String,
    synthesizer: &Synthesizer,
) {
    let Some(&slot) = result_slots.get(&row) else {
        return;
    };
    let result = &mut results[slot];
    // Incomplete results have no field entries to attach the error to.
    let Some(position) = result.fields.iter().position(|f| f.field == field) else {
        return;
    };

    tracing::info!(row, field = %field, "Duplicate record claim rejected");
    let mut fields = std::mem::take(&mut result.fields);
    fields[position].error(message);
    *result = synthesizer.synthesize(result.row_index, &records[row], fields);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RecordStatus;
    use crate::validators::registry;

    fn claim_row(first_date: &str) -> Record {
        Record {
            zone: Some("5".to_string()),
            country: Some("USA".to_string()),
            state: Some("TX".to_string()),
            family: Some("Nymphalidae".to_string()),
            genus: Some("Danaus".to_string()),
            species: Some("plexippus".to_string()),
            county: Some("Travis".to_string()),
            state_record: Some("Y".to_string()),
            location: Some("Zilker Park".to_string()),
            first_date: Some(first_date.to_string()),
            year: Some("2023".to_string()),
            ..Default::default()
        }
    }

    fn validate_all(records: &[Record]) -> Vec<RecordValidationResult> {
        let synthesizer = Synthesizer::new();
        let validators = registry();
        records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let fields = validators
                    .iter()
                    .map(|v| v.validate(record.field(v.field()), record))
                    .collect();
                synthesizer.synthesize(row, record, fields)
            })
            .collect()
    }

    #[test]
    fn test_duplicate_state_claims_keep_earliest() {
        let records = vec![claim_row("20-JUN-23"), claim_row("10-JUN-23")];
        let mut results = validate_all(&records);

        enforce_record_uniqueness(&records, &mut results, &Synthesizer::new());

        // Row 1 has the earlier date and keeps its claim.
        assert_ne!(results[1].status, RecordStatus::Fail);
        assert_eq!(results[0].status, RecordStatus::Fail);
        assert!(results[0].audit.notes.contains("row 2"));
    }

    #[test]
    fn test_single_claim_untouched() {
        let records = vec![claim_row("10-JUN-23")];
        let mut results = validate_all(&records);
        let status_before = results[0].status;

        enforce_record_uniqueness(&records, &mut results, &Synthesizer::new());
        assert_eq!(results[0].status, status_before);
    }

    #[test]
    fn test_tied_dates_keep_first_row() {
        let records = vec![claim_row("10-JUN-23"), claim_row("10-JUN-23")];
        let mut results = validate_all(&records);

        enforce_record_uniqueness(&records, &mut results, &Synthesizer::new());
        assert_ne!(results[0].status, RecordStatus::Fail);
        assert_eq!(results[1].status, RecordStatus::Fail);
    }

    #[test]
    fn test_county_claims_scoped_by_county() {
        let mut a = claim_row("10-JUN-23");
        a.state_record = None;
        a.county_record = Some("Y".to_string());
        let mut b = claim_row("12-JUN-23");
        b.state_record = None;
        b.county_record = Some("Y".to_string());
        b.county = Some("Hays".to_string());

        let records = vec![a, b];
        let mut results = validate_all(&records);

        enforce_record_uniqueness(&records, &mut results, &Synthesizer::new());
        // Different counties: both claims stand.
        assert_ne!(results[0].status, RecordStatus::Fail);
        assert_ne!(results[1].status, RecordStatus::Fail);
    }

    #[test]
    fn test_different_species_do_not_collide() {
        let a = claim_row("10-JUN-23");
        let mut b = claim_row("12-JUN-23");
        b.species = Some("gilippus".to_string());

        let records = vec![a, b];
        let mut results = validate_all(&records);

        enforce_record_uniqueness(&records, &mut results, &Synthesizer::new());
        assert_ne!(results[0].status, RecordStatus::Fail);
        assert_ne!(results[1].status, RecordStatus::Fail);
    }
}
