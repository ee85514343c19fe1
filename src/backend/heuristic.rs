// file: src/backend/heuristic.rs
// description: deterministic fast-mode classifiers used when no model is available
// reference: keyword and regex heuristics

use crate::backend::patterns::*;
use chrono::NaiveDate;
use serde_json::json;

/// Terms whose presence in an event description marks it as an adverse event.
const ADVERSE_TERMS: &[&str] = &[
    "cardiac arrest",
    "death",
    "died",
    "fatal",
    "anaphylaxis",
    "seizure",
    "stroke",
    "hospitaliz",
    "hospitalis",
    "overdose",
    "rash",
    "nausea",
    "vomiting",
    "syncope",
    "bleeding",
    "hemorrhage",
    "failure",
    "reaction",
    "swelling",
    "life-threatening",
];

/// Keyword table mapping descriptions onto the fixed seriousness vocabulary.
const CRITERION_KEYWORDS: [(&str, &[&str]); 5] = [
    ("Death", &["death", "died", "fatal", "cardiac arrest"]),
    (
        "LifeThreatening",
        &[
            "life-threatening",
            "life threatening",
            "cardiac arrest",
            "respiratory arrest",
            "anaphylaxis",
            "resuscitat",
        ],
    ),
    (
        "Hospitalization",
        &["hospitaliz", "hospitalis", "admitted", "inpatient"],
    ),
    (
        "Disability",
        &["disability", "disabling", "permanent impairment"],
    ),
    (
        "CongenitalAnomaly",
        &["congenital", "birth defect", "birth anomaly"],
    ),
];

/// Form triage without a model: look for the markers each reporting format
/// prints on its template.
pub fn triage(text: &str) -> String {
    let lower = text.to_lowercase();

    if lower.contains("medwatch") || lower.contains("fda form 3500") || lower.contains("3500a") {
        "MedWatch".to_string()
    } else if lower.contains("cioms") {
        "CIOMS".to_string()
    } else if lower.contains("e2b") || lower.contains("ich icsr") {
        "E2B".to_string()
    } else {
        "Unknown".to_string()
    }
}

/// Field extraction without a model. Prefers labeled form fields, falls back
/// to narrative patterns, and answers in the same JSON shape the model
/// prompt asks for so both paths share one parser.
pub fn extract_fields(text: &str) -> String {
    let patient_id = capture(&PATIENT_ID, text);

    let drug_name = capture(&DRUG_LABEL, text).or_else(|| capture(&DRUG_TAKING, text));

    let event_description = capture(&EVENT_LABEL, text)
        .or_else(|| capture(&REACTION, text))
        .or_else(|| first_nonempty_line(text));

    let event_date = capture(&DATE_LABEL, text)
        .and_then(|d| valid_iso_date(&d))
        .or_else(|| capture(&ISO_DATE, text).and_then(|d| valid_iso_date(&d)));

    json!({
        "patient_id": patient_id,
        "drug_name": drug_name,
        "event_description": event_description,
        "event_date": event_date,
    })
    .to_string()
}

/// Adverse-event call without a model: any recognized adverse term means Yes.
pub fn adverse_event(description: &str) -> String {
    let lower = description.to_lowercase();
    if ADVERSE_TERMS.iter().any(|term| lower.contains(term)) {
        "Yes".to_string()
    } else {
        "No".to_string()
    }
}

/// Seriousness grading without a model, answered as the JSON array the model
/// prompt asks for.
pub fn seriousness(description: &str) -> String {
    let lower = description.to_lowercase();
    let matched: Vec<&str> = CRITERION_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(label, _)| *label)
        .collect();

    json!(matched).to_string()
}

fn capture(pattern: &regex::Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_nonempty_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn valid_iso_date(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    let token = ISO_DATE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())?;
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()?;
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NARRATIVE: &str =
        "Patient experienced cardiac arrest after taking DrugX on 2024-01-05.";

    #[test]
    fn test_triage_markers() {
        assert_eq!(triage("FDA Form 3500A voluntary report"), "MedWatch");
        assert_eq!(triage("CIOMS Form I - Suspect Adverse Reaction"), "CIOMS");
        assert_eq!(triage("E2B(R3) ICSR transmission"), "E2B");
        assert_eq!(triage("Handwritten letter about side effects"), "Unknown");
    }

    #[test]
    fn test_extract_fields_narrative() {
        let response = extract_fields(NARRATIVE);
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();

        assert_eq!(value["drug_name"], "DrugX");
        assert_eq!(value["event_description"], "cardiac arrest");
        assert_eq!(value["event_date"], "2024-01-05");
        assert!(value["patient_id"].is_null());
    }

    #[test]
    fn test_extract_fields_labeled_form() {
        let text = "Patient ID: P-001\nDrug: Cardiozem\nEvent Description: severe rash\nEvent Date: 2023-11-20";
        let value: serde_json::Value = serde_json::from_str(&extract_fields(text)).unwrap();

        assert_eq!(value["patient_id"], "P-001");
        assert_eq!(value["drug_name"], "Cardiozem");
        assert_eq!(value["event_description"], "severe rash");
        assert_eq!(value["event_date"], "2023-11-20");
    }

    #[test]
    fn test_extract_fields_rejects_invalid_date() {
        let text = "Event Date: 2024-13-99\nPatient felt fine.";
        let value: serde_json::Value = serde_json::from_str(&extract_fields(text)).unwrap();
        assert!(value["event_date"].is_null());
    }

    #[test]
    fn test_adverse_event_call() {
        assert_eq!(adverse_event("cardiac arrest"), "Yes");
        assert_eq!(adverse_event("mild headache resolved same day"), "No");
    }

    #[test]
    fn test_seriousness_cardiac_arrest_maps_to_death_and_life_threatening() {
        let response = seriousness("cardiac arrest");
        let labels: Vec<String> = serde_json::from_str(&response).unwrap();
        assert_eq!(labels, vec!["Death", "LifeThreatening"]);
    }

    #[test]
    fn test_seriousness_none_apply() {
        let response = seriousness("transient mild itching");
        let labels: Vec<String> = serde_json::from_str(&response).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn test_heuristics_are_deterministic() {
        assert_eq!(extract_fields(NARRATIVE), extract_fields(NARRATIVE));
        assert_eq!(seriousness(NARRATIVE), seriousness(NARRATIVE));
    }
}
