//! Questionnaire spreadsheet ingestion.
//!
//! Exports are read as CSV from `<export_dir>/<sheet_id>/<sheet_name>.csv`,
//! one applicant per row after the header, columns mapped by position.

mod mapping;
mod normalizer;
mod parser;

pub use mapping::SheetColumnMapping;

use std::collections::HashSet;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::workflows::screening::domain::{Candidate, Position};

#[derive(Debug)]
pub enum SheetImportError {
    NotConfigured,
    /// Sheet id or name that would not resolve to a single entry under the export dir.
    InvalidLocation(String),
    Missing(PathBuf),
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for SheetImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetImportError::NotConfigured => write!(f, "no spreadsheet configured for position"),
            SheetImportError::InvalidLocation(value) => {
                write!(f, "spreadsheet location '{}' is not a plain name", value)
            }
            SheetImportError::Missing(path) => {
                write!(f, "spreadsheet export not found at {}", path.display())
            }
            SheetImportError::Io(err) => write!(f, "failed to read spreadsheet export: {}", err),
            SheetImportError::Csv(err) => write!(f, "invalid spreadsheet CSV data: {}", err),
        }
    }
}

impl std::error::Error for SheetImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetImportError::Io(err) => Some(err),
            SheetImportError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SheetImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SheetImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Supplier of applicant records for a position.
pub trait CandidateSource: Send + Sync {
    fn fetch(&self, position: &Position) -> Result<Vec<Candidate>, SheetImportError>;
    fn headers(&self, position: &Position) -> Result<Vec<String>, SheetImportError>;
}

/// Converts an export into candidates. Unaddressable rows are skipped and a
/// repeated token keeps its first row.
pub fn import_candidates_from_reader<R: Read>(
    reader: R,
    mapping: &SheetColumnMapping,
) -> Result<Vec<Candidate>, SheetImportError> {
    let export = parser::read_export(reader)?;
    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(export.rows.len());
    let mut excluded = 0usize;

    for (index, record) in export.rows.iter().enumerate() {
        let Some(candidate) = parser::row_to_candidate(record, mapping) else {
            excluded += 1;
            continue;
        };

        if !seen.insert(candidate.id.clone()) {
            warn!(row = index + 2, token = %candidate.id, "duplicate candidate token skipped");
            continue;
        }

        candidates.push(candidate);
    }

    if excluded > 0 {
        debug!(excluded, "rows without token, name or email excluded");
    }

    Ok(candidates)
}

pub fn import_candidates_from_path<P: AsRef<Path>>(
    path: P,
    mapping: &SheetColumnMapping,
) -> Result<Vec<Candidate>, SheetImportError> {
    let file = open_export(path.as_ref())?;
    import_candidates_from_reader(file, mapping)
}

fn open_export(path: &Path) -> Result<std::fs::File, SheetImportError> {
    std::fs::File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => SheetImportError::Missing(path.to_path_buf()),
        _ => SheetImportError::Io(err),
    })
}

/// Reads spreadsheet exports from a local directory tree.
#[derive(Debug, Clone)]
pub struct CsvSheetSource {
    export_dir: PathBuf,
    mapping: SheetColumnMapping,
}

impl CsvSheetSource {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            mapping: SheetColumnMapping::default(),
        }
    }

    pub fn with_mapping(mut self, mapping: SheetColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Resolves `<export_dir>/<sheet_id>/<sheet_name>.csv`. Both parts must be
    /// single plain path segments.
    pub fn export_path(&self, position: &Position) -> Result<PathBuf, SheetImportError> {
        if position.sheet_id.trim().is_empty() {
            return Err(SheetImportError::NotConfigured);
        }
        let sheet_id = plain_segment(&position.sheet_id)?;
        let sheet_name = plain_segment(&position.sheet_name)?;

        Ok(self
            .export_dir
            .join(sheet_id)
            .join(format!("{sheet_name}.csv")))
    }
}

fn plain_segment(value: &str) -> Result<&str, SheetImportError> {
    let trimmed = value.trim();
    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !trimmed.contains(|c: char| c == '/' || c == '\\') => {
            Ok(trimmed)
        }
        _ => {
            warn!(value = %value, "rejected spreadsheet location");
            Err(SheetImportError::InvalidLocation(value.to_string()))
        }
    }
}

impl CandidateSource for CsvSheetSource {
    fn fetch(&self, position: &Position) -> Result<Vec<Candidate>, SheetImportError> {
        let path = self.export_path(position)?;
        let candidates = import_candidates_from_path(&path, &self.mapping)?;
        debug!(
            position = %position.id,
            path = %path.display(),
            candidates = candidates.len(),
            "imported spreadsheet export"
        );
        Ok(candidates)
    }

    fn headers(&self, position: &Position) -> Result<Vec<String>, SheetImportError> {
        let path = self.export_path(position)?;
        let export = parser::read_export(open_export(&path)?)?;
        Ok(export.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::screening::domain::{
        PositionDefaults, ScriptRelationship, SetterApproach, TimeSlot, VatNumberStatus,
        WeeklyHours,
    };
    use chrono::Utc;
    use std::io::Cursor;

    const HEADER: &str = "Nome,Email,Telefono,Città,PC,Connessione,Ambiente,Partita IVA,Esperienza setter,Descrizione,Call center,Descrizione call center,Approccio,Script,Ore,Motivazione,Fascia,Submitted At,Token\n";

    #[test]
    fn row_maps_every_questionnaire_column() {
        let record = parser::record_for_tests(&[
            "Giulia Rossi",
            "giulia@example.com",
            "+39 333 000 0000",
            "Milano",
            "Sì",
            "TRUE",
            "no",
            "Sono pronto ad aprirla",
            "1",
            "Due anni in agenzia",
            "no",
            "",
            "Fisso solo appuntamenti realmente qualificati",
            "Lo uso come guida ma personalizzo",
            "25h+",
            "Crescere",
            "Pomeriggio (14-18)",
            "2026-01-12 10:00:00",
            "tok-1",
        ]);

        let candidate = parser::row_to_candidate(&record, &SheetColumnMapping::default())
            .expect("complete row");

        assert_eq!(candidate.id.0, "tok-1");
        assert!(candidate.has_pc && candidate.stable_connection);
        assert!(!candidate.quiet_environment);
        assert_eq!(candidate.vat_number, VatNumberStatus::WillingToOpen);
        assert!(candidate.setter_experience);
        assert!(!candidate.call_center_experience);
        assert_eq!(candidate.setter_approach, SetterApproach::QualityOnly);
        assert_eq!(
            candidate.script_relationship,
            ScriptRelationship::GuideAndAdapt
        );
        assert_eq!(candidate.weekly_hours, WeeklyHours::Over25);
        assert_eq!(candidate.time_slot, TimeSlot::Afternoon);
        assert_eq!(candidate.submitted_at, "2026-01-12 10:00:00");
    }

    #[test]
    fn rows_missing_identity_are_excluded() {
        let csv = format!(
            "{HEADER}\
Anna,anna@example.com,,,si,si,si,si,,,,,,,,,,,tok-a\n\
,nobody@example.com,,,si,si,si,si,,,,,,,,,,,tok-b\n\
Bruno,,,,si,si,si,si,,,,,,,,,,,tok-c\n\
Carla,carla@example.com,,,si,si,si,si\n"
        );

        let candidates =
            import_candidates_from_reader(Cursor::new(csv), &SheetColumnMapping::default())
                .expect("import succeeds");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Anna");
    }

    #[test]
    fn duplicate_tokens_keep_first_row() {
        let csv = format!(
            "{HEADER}\
Anna,anna@example.com,,Roma,,,,,,,,,,,,,,,tok-a\n\
Anna Bis,anna2@example.com,,Napoli,,,,,,,,,,,,,,,tok-a\n"
        );

        let candidates =
            import_candidates_from_reader(Cursor::new(csv), &SheetColumnMapping::default())
                .expect("import succeeds");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].city, "Roma");
    }

    #[test]
    fn source_requires_configured_sheet() {
        let source = CsvSheetSource::new("exports");
        let position = PositionDefaults::default().default_position(Utc::now());

        let err = source.fetch(&position).expect_err("sheet id is blank");
        assert!(matches!(err, SheetImportError::NotConfigured));
    }

    #[test]
    fn source_reports_missing_export() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = CsvSheetSource::new(dir.path());
        let mut position = PositionDefaults::default().default_position(Utc::now());
        position.sheet_id = "sheet-1".to_string();

        let err = source.fetch(&position).expect_err("export missing");
        assert!(matches!(err, SheetImportError::Missing(_)));
    }

    #[test]
    fn source_reads_headers_and_rows_from_export_tree() {
        let dir = tempfile::tempdir().expect("temp dir");
        let sheet_dir = dir.path().join("sheet-1");
        std::fs::create_dir_all(&sheet_dir).expect("sheet dir");
        std::fs::write(
            sheet_dir.join("Risposte.csv"),
            format!("{HEADER}Anna,anna@example.com,,,,,,,,,,,,,,,,,tok-a\n"),
        )
        .expect("write export");

        let source = CsvSheetSource::new(dir.path());
        let mut position = PositionDefaults::default().default_position(Utc::now());
        position.sheet_id = "sheet-1".to_string();
        position.sheet_name = "Risposte".to_string();

        let headers = source.headers(&position).expect("headers");
        assert_eq!(headers.len(), 19);
        assert_eq!(headers[0], "Nome");

        let candidates = source.fetch(&position).expect("candidates");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id.0, "tok-a");
    }

    #[test]
    fn export_path_stays_inside_export_dir() {
        let source = CsvSheetSource::new("exports");
        let mut position = PositionDefaults::default().default_position(Utc::now());
        position.sheet_id = "sheet-1".to_string();
        position.sheet_name = "Risposte".to_string();
        assert_eq!(
            source.export_path(&position).expect("plain names"),
            PathBuf::from("exports").join("sheet-1").join("Risposte.csv")
        );

        for sheet_id in ["/etc", "..", "../outside", "nested/sheet", "."] {
            position.sheet_id = sheet_id.to_string();
            position.sheet_name = "Risposte".to_string();
            let err = source.export_path(&position).expect_err(sheet_id);
            assert!(matches!(err, SheetImportError::InvalidLocation(_)), "{sheet_id}");
        }

        position.sheet_id = "sheet-1".to_string();
        for sheet_name in ["../../passwd", "/tmp/leak", "a\\b", ""] {
            position.sheet_name = sheet_name.to_string();
            let err = source.export_path(&position).expect_err(sheet_name);
            assert!(matches!(err, SheetImportError::InvalidLocation(_)), "{sheet_name}");
        }
    }
}
