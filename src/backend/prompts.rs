// file: src/backend/prompts.rs
// description: prompt templates for the four classification stages

pub const TRIAGE: &str = "Identify the form type from the following text: MedWatch, CIOMS, or E2B. \
Read the text carefully and return only the form name as a single string.";

pub const EXTRACTION: &str = "Based on the following medical document text, extract these entities: \
patient_id, drug_name, event_description, event_date. \
Return the data as a single, clean JSON object with no extra text or explanations. \
Do not invent values; use \"not found\" for any entity the text does not contain.";

pub const ADVERSE_EVENT: &str =
    "Is the following an adverse event? Answer only with 'Yes' or 'No'.";

pub const SERIOUSNESS: &str = "Review the event description. Does it meet any of the following \
seriousness criteria: Death, Life-Threatening, Hospitalization, Disability, Congenital Anomaly? \
Return a JSON array of the criteria that apply. If none apply, return [].";
