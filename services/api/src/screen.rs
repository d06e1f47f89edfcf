use candidate_screening::config::AppConfig;
use candidate_screening::error::AppError;
use candidate_screening::workflows::screening::{
    default_setter_preset, present, rationale, resolve_all, screen_all, ContactLogRepository,
    JsonFileStore, OverrideRepository, PositionId, PresentationSnapshot, PresetRepository,
    RepositoryError, ScreeningEngine, ScreeningPreset, StatusFilter, DEFAULT_POSITION_ID,
};
use candidate_screening::workflows::sheets::{import_candidates_from_path, SheetColumnMapping};
use chrono::Utc;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ScreenArgs {
    /// Questionnaire CSV export to screen
    pub(crate) csv: PathBuf,
    /// Stored preset id to screen against (defaults to the standard setter preset)
    #[arg(long)]
    pub(crate) preset: Option<String>,
    /// Only list candidates with this status (idoneo, dubbio, da_valutare, contattato, non_idoneo, all)
    #[arg(long, default_value = "all")]
    pub(crate) status: StatusFilter,
    /// Case-insensitive match on name, email or city
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Directory holding the JSON collections
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Print the snapshot as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
    /// Add the scoring rationale under each screened candidate
    #[arg(long)]
    pub(crate) explain: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PresetsArgs {
    /// Directory holding the JSON collections
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

fn open_store(data_dir: Option<PathBuf>) -> Result<JsonFileStore, AppError> {
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => AppConfig::load()?.storage.data_dir,
    };
    Ok(JsonFileStore::open(data_dir)?)
}

fn load_preset(store: &JsonFileStore, id: Option<&str>) -> Result<ScreeningPreset, AppError> {
    match id {
        Some(id) => store
            .preset(id)?
            .ok_or(AppError::Storage(RepositoryError::NotFound)),
        None => Ok(default_setter_preset(
            PositionId(DEFAULT_POSITION_ID.to_string()),
            Utc::now(),
        )),
    }
}

/// Screens an export against `preset`, folding in any overrides and contact
/// history the store holds for the preset's position.
pub(crate) fn screen_export(
    path: &Path,
    store: &JsonFileStore,
    preset: &ScreeningPreset,
    filter: &StatusFilter,
    search: Option<&str>,
) -> Result<PresentationSnapshot, AppError> {
    let candidates = import_candidates_from_path(path, &SheetColumnMapping::default())?;
    let results = screen_all(&candidates, Some(preset));
    let overrides = store.overrides(&preset.position_id)?;
    let contacts = store.contact_log()?;
    let views = resolve_all(
        candidates,
        &preset.position_id,
        &results,
        &overrides,
        &contacts,
    );
    Ok(present(views, filter, search, Utc::now()))
}

pub(crate) fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let ScreenArgs {
        csv,
        preset,
        status,
        search,
        data_dir,
        json,
        explain,
    } = args;

    let store = open_store(data_dir)?;
    let preset = load_preset(&store, preset.as_deref())?;
    let snapshot = screen_export(&csv, &store, &preset, &status, search.as_deref())?;

    if json {
        let rendered = serde_json::to_string_pretty(&snapshot)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        print!("{}", render_snapshot(&snapshot, &preset, explain));
    }
    Ok(())
}

pub(crate) fn run_presets(args: PresetsArgs) -> Result<(), AppError> {
    let store = open_store(args.data_dir)?;
    let presets = store.presets()?;

    if presets.is_empty() {
        println!("No presets stored yet; the standard setter preset is seeded when the server first starts.");
        return Ok(());
    }

    for preset in presets {
        println!(
            "{:<24} {:<48} idoneo>={:<3} dubbio>={:<3} rules={:<2} position={}",
            preset.id,
            preset.name,
            preset.suitable_threshold,
            preset.doubtful_threshold,
            preset.rules.len(),
            preset.position_id
        );
    }
    Ok(())
}

pub(crate) fn render_snapshot(
    snapshot: &PresentationSnapshot,
    preset: &ScreeningPreset,
    explain: bool,
) -> String {
    let engine = ScreeningEngine::new(preset.clone());
    let mut out = String::new();
    let stats = &snapshot.stats;
    out.push_str(&format!(
        "Preset: {} (idoneo >= {}%, dubbio >= {}%)\n",
        preset.name, preset.suitable_threshold, preset.doubtful_threshold
    ));
    out.push_str(&format!(
        "Candidates: {} total | idoneo {} | dubbio {} | da valutare {} | contattato {} | non idoneo {}\n\n",
        stats.total,
        stats.by_status.suitable,
        stats.by_status.doubtful,
        stats.by_status.pending_review,
        stats.by_status.contacted,
        stats.by_status.unsuitable,
    ));

    for view in &snapshot.candidates {
        let score = view
            .screening
            .as_ref()
            .map(|result| format!("{:>3}%", result.percentage))
            .unwrap_or_else(|| "  -".to_string());
        out.push_str(&format!(
            "{:<12} {} {:<28} {:<32} {}\n",
            view.status.label(),
            score,
            view.candidate.name,
            view.candidate.email,
            view.candidate.city
        ));
        if explain && view.screening.is_some() {
            let aggregate = engine.aggregate(&view.candidate);
            out.push_str(&format!("    {}\n", rationale(&aggregate, preset)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use candidate_screening::workflows::screening::CandidateStatus;

    const EXPORT: &str = "Nome,Email,Telefono,Città,PC,Connessione,Ambiente,Partita IVA,Esperienza setter,Descrizione,Call center,Descrizione call center,Approccio,Script,Ore,Motivazione,Fascia,Submitted At,Token\n\
Bruno Neri,bruno@example.com,,Milano,no,no,no,no,,,,,,,,,,,tok-b\n\
Anna Galli,anna@example.com,,Roma,si,si,si,si,si,,si,,,,25h+,,,,tok-a\n";

    fn fixture() -> (tempfile::TempDir, PathBuf, JsonFileStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let csv = dir.path().join("export.csv");
        std::fs::write(&csv, EXPORT).expect("write export");
        let store = JsonFileStore::open(dir.path().join("data")).expect("store opens");
        (dir, csv, store)
    }

    #[test]
    fn screen_export_ranks_suitable_first() {
        let (_dir, csv, store) = fixture();
        let preset = load_preset(&store, None).expect("default preset");

        let snapshot = screen_export(&csv, &store, &preset, &StatusFilter::All, None)
            .expect("export screens");

        assert_eq!(snapshot.stats.total, 2);
        assert_eq!(snapshot.candidates[0].candidate.name, "Anna Galli");
        assert_eq!(snapshot.candidates[0].status, CandidateStatus::Suitable);
        assert_eq!(snapshot.candidates[1].status, CandidateStatus::Unsuitable);

        let rendered = render_snapshot(&snapshot, &preset, false);
        assert!(rendered.contains("2 total"));
        assert!(rendered.lines().any(|line| line.starts_with("idoneo") && line.contains("100%")));

        let explained = render_snapshot(&snapshot, &preset, true);
        assert!(explained.contains("required criteria not met: Ha un PC adeguato"));
    }

    #[test]
    fn unknown_stored_preset_is_reported() {
        let (_dir, _csv, store) = fixture();
        let err = load_preset(&store, Some("missing")).expect_err("no such preset");
        assert!(matches!(err, AppError::Storage(RepositoryError::NotFound)));
    }

    #[test]
    fn missing_export_is_an_import_error() {
        let (dir, _csv, store) = fixture();
        let preset = load_preset(&store, None).expect("default preset");
        let err = screen_export(
            &dir.path().join("absent.csv"),
            &store,
            &preset,
            &StatusFilter::All,
            None,
        )
        .expect_err("missing file");
        assert!(matches!(err, AppError::Import(_)));
    }
}
