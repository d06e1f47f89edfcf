use std::io::Read;

use csv::StringRecord;

use super::mapping::{cell, text, SheetColumnMapping};
use super::normalizer::{
    parse_boolean, parse_script_relationship, parse_setter_approach, parse_time_slot,
    parse_vat_number, parse_weekly_hours,
};
use crate::workflows::screening::domain::{Candidate, CandidateId};

/// Raw export: the header row plus every data row, positional.
#[derive(Debug)]
pub(crate) struct SheetExport {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<StringRecord>,
}

pub(crate) fn read_export<R: Read>(reader: R) -> Result<SheetExport, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        rows.push(record?);
    }

    Ok(SheetExport { headers, rows })
}

/// Rows without token, name or email cannot be addressed and yield `None`.
pub(crate) fn row_to_candidate(
    record: &StringRecord,
    mapping: &SheetColumnMapping,
) -> Option<Candidate> {
    let token = cell(record, mapping.token)?;
    let name = cell(record, mapping.name)?;
    let email = cell(record, mapping.email)?;

    Some(Candidate {
        id: CandidateId(token.to_string()),
        name: name.to_string(),
        email: email.to_string(),
        phone: text(record, mapping.phone),
        city: text(record, mapping.city),
        has_pc: parse_boolean(cell(record, mapping.has_pc)),
        stable_connection: parse_boolean(cell(record, mapping.stable_connection)),
        quiet_environment: parse_boolean(cell(record, mapping.quiet_environment)),
        vat_number: parse_vat_number(cell(record, mapping.vat_number)),
        setter_experience: parse_boolean(cell(record, mapping.setter_experience)),
        setter_experience_description: text(record, mapping.setter_experience_description),
        call_center_experience: parse_boolean(cell(record, mapping.call_center_experience)),
        call_center_description: text(record, mapping.call_center_description),
        setter_approach: parse_setter_approach(cell(record, mapping.setter_approach)),
        script_relationship: parse_script_relationship(cell(record, mapping.script_relationship)),
        weekly_hours: parse_weekly_hours(cell(record, mapping.weekly_hours)),
        motivation: text(record, mapping.motivation),
        time_slot: parse_time_slot(cell(record, mapping.time_slot)),
        submitted_at: text(record, mapping.submitted_at),
    })
}

#[cfg(test)]
pub(crate) fn record_for_tests(cells: &[&str]) -> StringRecord {
    StringRecord::from(cells.to_vec())
}
