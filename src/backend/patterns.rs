// file: src/backend/patterns.rs
// description: compiled regex patterns for fast-mode field extraction
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Labeled fields, as they appear on structured report forms
    pub static ref PATIENT_ID: Regex = Regex::new(
        r"(?i)patient\s*(?:id|identifier|number)?\s*[:#]\s*([A-Za-z0-9][A-Za-z0-9-]*)"
    ).expect("PATIENT_ID regex is valid");

    pub static ref DRUG_LABEL: Regex = Regex::new(
        r"(?i)(?:suspect\s+product|drug|medication|product)\s*(?:name)?\s*:\s*([^\n]+)"
    ).expect("DRUG_LABEL regex is valid");

    pub static ref EVENT_LABEL: Regex = Regex::new(
        r"(?i)(?:event\s+description|adverse\s+event|reaction)\s*:\s*([^\n]+)"
    ).expect("EVENT_LABEL regex is valid");

    pub static ref DATE_LABEL: Regex = Regex::new(
        r"(?i)(?:event\s+date|date\s+of\s+event|onset\s+date)\s*:\s*([^\n]+)"
    ).expect("DATE_LABEL regex is valid");

    // Narrative-style reports without labeled fields
    pub static ref DRUG_TAKING: Regex = Regex::new(
        r"(?i)(?:after|while|since)\s+taking\s+([A-Za-z][A-Za-z0-9-]*)"
    ).expect("DRUG_TAKING regex is valid");

    pub static ref REACTION: Regex = Regex::new(
        r"(?i)(?:experienced|developed|suffered|reported)\s+([^.\n]+?)(?:\s+(?:after|following|while)\b|[.\n]|$)"
    ).expect("REACTION regex is valid");

    // Dates
    pub static ref ISO_DATE: Regex = Regex::new(
        r"\b(\d{4}-\d{2}-\d{2})\b"
    ).expect("ISO_DATE regex is valid");
}
