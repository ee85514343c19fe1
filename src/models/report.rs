// file: src/models/report.rs
// description: classification outcomes and the final case report
// reference: internal data structures

use crate::models::record::{ExtractedRecord, StorageReceipt};
use serde::{Deserialize, Serialize};

/// Template variant of an incoming safety report, produced by triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormType {
    MedWatch,
    #[serde(rename = "CIOMS")]
    Cioms,
    #[serde(rename = "E2B")]
    E2b,
    Unknown,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::MedWatch => "MedWatch",
            FormType::Cioms => "CIOMS",
            FormType::E2b => "E2B",
            FormType::Unknown => "Unknown",
        }
    }

    /// Normalizes a raw backend response into the closed vocabulary. Any
    /// response naming zero or more than one form maps to `Unknown` rather
    /// than propagating free text.
    pub fn from_response(response: &str) -> Self {
        let lower = response.to_lowercase();
        let candidates = [
            (FormType::MedWatch, "medwatch"),
            (FormType::Cioms, "cioms"),
            (FormType::E2b, "e2b"),
        ];

        let mut matched = None;
        for (form, needle) in candidates {
            if lower.contains(needle) {
                if matched.is_some() {
                    return FormType::Unknown;
                }
                matched = Some(form);
            }
        }

        matched.unwrap_or(FormType::Unknown)
    }
}

/// Adverse-event classification. Ambiguous backend output becomes
/// `Indeterminate`; it is never coerced into `No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdverseEventCall {
    Yes,
    No,
    Indeterminate,
}

impl AdverseEventCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdverseEventCall::Yes => "Yes",
            AdverseEventCall::No => "No",
            AdverseEventCall::Indeterminate => "Indeterminate",
        }
    }

    pub fn from_response(response: &str) -> Self {
        let token: String = response
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match token.as_str() {
            "yes" => AdverseEventCall::Yes,
            "no" => AdverseEventCall::No,
            _ => AdverseEventCall::Indeterminate,
        }
    }
}

/// The adverse-event call together with the description it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub call: AdverseEventCall,
    pub event_description: String,
}

impl Verdict {
    pub fn new(call: AdverseEventCall, event_description: String) -> Self {
        Self {
            call,
            event_description,
        }
    }
}

/// Fixed regulatory vocabulary for grading adverse events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeriousnessCriterion {
    Death,
    LifeThreatening,
    Hospitalization,
    Disability,
    CongenitalAnomaly,
}

impl SeriousnessCriterion {
    /// Canonical ordering used to keep reports deterministic.
    pub const ALL: [SeriousnessCriterion; 5] = [
        SeriousnessCriterion::Death,
        SeriousnessCriterion::LifeThreatening,
        SeriousnessCriterion::Hospitalization,
        SeriousnessCriterion::Disability,
        SeriousnessCriterion::CongenitalAnomaly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriousnessCriterion::Death => "Death",
            SeriousnessCriterion::LifeThreatening => "LifeThreatening",
            SeriousnessCriterion::Hospitalization => "Hospitalization",
            SeriousnessCriterion::Disability => "Disability",
            SeriousnessCriterion::CongenitalAnomaly => "CongenitalAnomaly",
        }
    }

    /// Parses one criterion label, tolerating the hyphenated and spaced
    /// spellings the regulatory wording uses. Unrecognized labels yield None
    /// and are dropped by the caller.
    pub fn parse(label: &str) -> Option<Self> {
        let token: String = label
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match token.as_str() {
            "death" => Some(SeriousnessCriterion::Death),
            "lifethreatening" => Some(SeriousnessCriterion::LifeThreatening),
            "hospitalization" | "hospitalisation" => Some(SeriousnessCriterion::Hospitalization),
            "disability" => Some(SeriousnessCriterion::Disability),
            "congenitalanomaly" => Some(SeriousnessCriterion::CongenitalAnomaly),
            _ => None,
        }
    }
}

/// Final output of the seriousness stage: zero or more criteria in canonical
/// order plus the verdict they apply to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriousnessReport {
    pub verdict: Verdict,
    pub criteria: Vec<SeriousnessCriterion>,
    pub note: Option<String>,
}

impl SeriousnessReport {
    pub fn new(
        verdict: Verdict,
        criteria: Vec<SeriousnessCriterion>,
        note: Option<String>,
    ) -> Self {
        Self {
            verdict,
            criteria: canonicalize(criteria),
            note,
        }
    }
}

/// Deduplicates and orders criteria by the fixed vocabulary order so equal
/// inputs always produce byte-identical reports.
pub fn canonicalize(criteria: Vec<SeriousnessCriterion>) -> Vec<SeriousnessCriterion> {
    SeriousnessCriterion::ALL
        .into_iter()
        .filter(|c| criteria.contains(c))
        .collect()
}

/// Extraction section of the final report: the four fields, the parse flag,
/// and the case IDs handed back by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub patient_id: String,
    pub drug_name: String,
    pub event_description: String,
    pub event_date: String,
    pub parse_error: bool,
    pub case_ids: Vec<String>,
}

/// The pipeline's return value. The sole contract any presentation layer
/// relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    pub source: String,
    pub form_type: FormType,
    pub extraction: ExtractionSection,
    pub adverse_event: AdverseEventCall,
    pub seriousness_criteria: Vec<SeriousnessCriterion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CaseReport {
    pub fn assemble(
        source: String,
        form_type: FormType,
        record: ExtractedRecord,
        receipt: StorageReceipt,
        seriousness: SeriousnessReport,
    ) -> Self {
        Self {
            source,
            form_type,
            extraction: ExtractionSection {
                patient_id: record.patient_id,
                drug_name: record.drug_name,
                event_description: record.event_description,
                event_date: record.event_date,
                parse_error: record.parse_error,
                case_ids: receipt.case_ids,
            },
            adverse_event: seriousness.verdict.call,
            seriousness_criteria: seriousness.criteria,
            note: seriousness.note,
        }
    }
}
