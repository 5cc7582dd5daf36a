//! Shared reference tables and patterns for field validators.
//!
//! Single source of truth for the static vocabularies the season-summary
//! schema validates against: zones, country codes, state/province codes,
//! common Lepidoptera families, and the canonical date layout.

use lazy_static::lazy_static;
use regex::Regex;

/// Inclusive range of valid LepSoc reporting zones.
pub const ZONE_MIN: i64 = 1;
pub const ZONE_MAX: i64 = 12;

/// Accepted country codes.
pub const COUNTRIES: [&str; 3] = ["USA", "CAN", "MEX"];

/// US state and district abbreviations.
pub const US_STATES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC",
];

/// Canadian province and territory abbreviations.
pub const CAN_PROVINCES: [&str; 13] = [
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

/// Mexican state abbreviations (three-letter).
pub const MEX_STATES: [&str; 32] = [
    "AGU", "BCN", "BCS", "CAM", "CHP", "CHH", "COA", "COL", "CMX", "DUR", "GUA", "GRO", "HID",
    "JAL", "MEX", "MIC", "MOR", "NAY", "NLE", "OAX", "PUE", "QUE", "ROO", "SLP", "SIN", "SON",
    "TAB", "TAM", "TLA", "VER", "YUC", "ZAC",
];

/// Lepidoptera families commonly reported in season summaries. A family
/// outside this list is not wrong, just worth a second look.
pub const COMMON_FAMILIES: [&str; 20] = [
    "Hesperiidae",
    "Papilionidae",
    "Pieridae",
    "Lycaenidae",
    "Riodinidae",
    "Nymphalidae",
    "Geometridae",
    "Erebidae",
    "Noctuidae",
    "Notodontidae",
    "Sphingidae",
    "Saturniidae",
    "Lasiocampidae",
    "Megalopygidae",
    "Limacodidae",
    "Crambidae",
    "Pyralidae",
    "Tortricidae",
    "Cossidae",
    "Sesiidae",
];

lazy_static! {
    /// Canonical date layout: dd-MMM-yy, month upper-cased (15-JUN-23).
    pub static ref CANONICAL_DATE: Regex = Regex::new(r"^\d{1,2}-[A-Z]{3}-\d{2}$").unwrap();

    /// Loose GPS coordinate pair (lat, lon) inside free text.
    pub static ref GPS_COORDS: Regex =
        Regex::new(r"[-+]?\d+\.?\d*,\s*[-+]?\d+\.?\d*").unwrap();
}

/// Check a zone number against the valid range.
pub fn is_valid_zone(zone: i64) -> bool {
    (ZONE_MIN..=ZONE_MAX).contains(&zone)
}

/// Check an upper-cased country code.
pub fn is_valid_country(code: &str) -> bool {
    COUNTRIES.contains(&code)
}

/// Check an upper-cased US state abbreviation.
pub fn is_us_state(code: &str) -> bool {
    US_STATES.contains(&code)
}

/// Check an upper-cased Canadian province abbreviation.
pub fn is_can_province(code: &str) -> bool {
    CAN_PROVINCES.contains(&code)
}

/// Check an upper-cased Mexican state abbreviation.
pub fn is_mex_state(code: &str) -> bool {
    MEX_STATES.contains(&code)
}

/// Check a family name against the common-families list.
pub fn is_common_family(family: &str) -> bool {
    COMMON_FAMILIES.contains(&family)
}

/// Check a date string against the canonical dd-MMM-yy layout.
pub fn is_canonical_date(value: &str) -> bool {
    CANONICAL_DATE.is_match(value)
}

/// Check free text for an embedded GPS coordinate pair.
pub fn contains_gps_coords(text: &str) -> bool {
    GPS_COORDS.is_match(text)
}
