use csv::StringRecord;
use serde::{Deserialize, Serialize};

/// Zero-based column index of every questionnaire answer in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetColumnMapping {
    pub name: usize,
    pub email: usize,
    pub phone: usize,
    pub city: usize,
    pub has_pc: usize,
    pub stable_connection: usize,
    pub quiet_environment: usize,
    pub vat_number: usize,
    pub setter_experience: usize,
    pub setter_experience_description: usize,
    pub call_center_experience: usize,
    pub call_center_description: usize,
    pub setter_approach: usize,
    pub script_relationship: usize,
    pub weekly_hours: usize,
    pub motivation: usize,
    pub time_slot: usize,
    pub submitted_at: usize,
    pub token: usize,
}

impl Default for SheetColumnMapping {
    /// Questionnaire order of the standard Typeform export.
    fn default() -> Self {
        Self {
            name: 0,
            email: 1,
            phone: 2,
            city: 3,
            has_pc: 4,
            stable_connection: 5,
            quiet_environment: 6,
            vat_number: 7,
            setter_experience: 8,
            setter_experience_description: 9,
            call_center_experience: 10,
            call_center_description: 11,
            setter_approach: 12,
            script_relationship: 13,
            weekly_hours: 14,
            motivation: 15,
            time_slot: 16,
            submitted_at: 17,
            token: 18,
        }
    }
}

/// Trimmed cell at `index`; short rows and blank cells read as `None`.
pub(crate) fn cell(record: &StringRecord, index: usize) -> Option<&str> {
    record
        .get(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(crate) fn text(record: &StringRecord, index: usize) -> String {
    cell(record, index).unwrap_or_default().to_string()
}
