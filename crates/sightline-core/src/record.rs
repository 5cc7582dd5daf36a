//! Season-summary record schema.
//!
//! A record is one row of a season-summary submission: sixteen fields in a
//! fixed column order, carried as raw strings exactly as the contributor
//! typed them. Validators decide what the strings mean.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for each of the sixteen season-summary fields, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Zone,
    Country,
    State,
    Family,
    Genus,
    Species,
    Subspecies,
    County,
    StateRecord,
    CountyRecord,
    Location,
    FirstDate,
    LastDate,
    Contributor,
    Comment,
    Year,
}

impl FieldId {
    /// All fields in column order. This order is the output contract.
    pub const ALL: [FieldId; 16] = [
        FieldId::Zone,
        FieldId::Country,
        FieldId::State,
        FieldId::Family,
        FieldId::Genus,
        FieldId::Species,
        FieldId::Subspecies,
        FieldId::County,
        FieldId::StateRecord,
        FieldId::CountyRecord,
        FieldId::Location,
        FieldId::FirstDate,
        FieldId::LastDate,
        FieldId::Contributor,
        FieldId::Comment,
        FieldId::Year,
    ];

    /// Column heading as it appears in submitted spreadsheets.
    pub fn display_name(&self) -> &'static str {
        match self {
            FieldId::Zone => "Zone",
            FieldId::Country => "Country",
            FieldId::State => "State",
            FieldId::Family => "Family",
            FieldId::Genus => "Genus",
            FieldId::Species => "Species",
            FieldId::Subspecies => "Sub-species",
            FieldId::County => "County",
            FieldId::StateRecord => "State Record",
            FieldId::CountyRecord => "County Record",
            FieldId::Location => "Specific Location",
            FieldId::FirstDate => "First Date",
            FieldId::LastDate => "Last Date",
            FieldId::Contributor => "Name",
            FieldId::Comment => "Comments",
            FieldId::Year => "Year",
        }
    }

    /// Whether a blank value is an error for this field.
    pub fn required(&self) -> bool {
        matches!(
            self,
            FieldId::Zone
                | FieldId::Country
                | FieldId::State
                | FieldId::Family
                | FieldId::Genus
                | FieldId::Species
                | FieldId::County
                | FieldId::Location
                | FieldId::FirstDate
                | FieldId::Year
        )
    }

    /// Maximum accepted length in characters, where the schema fixes one.
    pub fn max_len(&self) -> Option<usize> {
        match self {
            FieldId::State => Some(3),
            FieldId::Family => Some(20),
            FieldId::Genus => Some(20),
            FieldId::Species => Some(18),
            FieldId::Subspecies => Some(16),
            FieldId::County => Some(20),
            FieldId::Location => Some(50),
            FieldId::Contributor => Some(3),
            FieldId::Comment => Some(120),
            _ => None,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One season-summary row, fields as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub zone: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub subspecies: Option<String>,
    pub county: Option<String>,
    pub state_record: Option<String>,
    pub county_record: Option<String>,
    pub location: Option<String>,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub contributor: Option<String>,
    pub comment: Option<String>,
    pub year: Option<String>,
}

impl Record {
    /// Raw value of a field. Whitespace-only values read as absent.
    pub fn field(&self, id: FieldId) -> Option<&str> {
        let value = match id {
            FieldId::Zone => &self.zone,
            FieldId::Country => &self.country,
            FieldId::State => &self.state,
            FieldId::Family => &self.family,
            FieldId::Genus => &self.genus,
            FieldId::Species => &self.species,
            FieldId::Subspecies => &self.subspecies,
            FieldId::County => &self.county,
            FieldId::StateRecord => &self.state_record,
            FieldId::CountyRecord => &self.county_record,
            FieldId::Location => &self.location,
            FieldId::FirstDate => &self.first_date,
            FieldId::LastDate => &self.last_date,
            FieldId::Contributor => &self.contributor,
            FieldId::Comment => &self.comment,
            FieldId::Year => &self.year,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Replace a field value (used when applying corrections).
    pub fn set_field(&mut self, id: FieldId, value: String) {
        let slot = match id {
            FieldId::Zone => &mut self.zone,
            FieldId::Country => &mut self.country,
            FieldId::State => &mut self.state,
            FieldId::Family => &mut self.family,
            FieldId::Genus => &mut self.genus,
            FieldId::Species => &mut self.species,
            FieldId::Subspecies => &mut self.subspecies,
            FieldId::County => &mut self.county,
            FieldId::StateRecord => &mut self.state_record,
            FieldId::CountyRecord => &mut self.county_record,
            FieldId::Location => &mut self.location,
            FieldId::FirstDate => &mut self.first_date,
            FieldId::LastDate => &mut self.last_date,
            FieldId::Contributor => &mut self.contributor,
            FieldId::Comment => &mut self.comment,
            FieldId::Year => &mut self.year,
        };
        *slot = Some(value);
    }

    /// Key grouping rows that describe the same taxon
    /// (family, genus, species, subspecies).
    pub fn species_key(&self) -> Option<String> {
        let family = self.field(FieldId::Family)?;
        let genus = self.field(FieldId::Genus)?;
        let species = self.field(FieldId::Species)?;
        let subspecies = self.field(FieldId::Subspecies).unwrap_or("");
        Some(format!(
            "{}|{}|{}|{}",
            family.trim(),
            genus.trim(),
            species.trim(),
            subspecies.trim()
        ))
    }
}
