use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::domain::{CandidateId, Position, PositionId};
use super::evaluation::ScreeningPreset;
use super::outreach::EmailTemplate;
use super::repository::{
    ContactLogRepository, ContactRecord, OverrideRecord, OverrideRepository, OverrideUpdate,
    PositionRepository, PresetRepository, RepositoryError, TemplateRepository,
};

const POSITIONS: &str = "positions.json";
const PRESETS: &str = "presets.json";
const TEMPLATES: &str = "templates.json";
const CONTACT_LOG: &str = "email-logs.json";
const OVERRIDES: &str = "candidate-overrides.json";

/// Persists every screening collection as a pretty-printed JSON array in one
/// directory. A missing file reads as an empty collection; a file that does not
/// parse is reported as corrupt rather than silently reset.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| unavailable(&root, err))?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, RepositoryError> {
        self.lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable("file store lock poisoned".to_string()))
    }

    fn read<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, RepositoryError> {
        let path = self.root.join(collection);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(unavailable(&path, err)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|err| RepositoryError::Corrupt {
            collection: collection.to_string(),
            reason: err.to_string(),
        })
    }

    fn write<T: Serialize>(&self, collection: &str, items: &[T]) -> Result<(), RepositoryError> {
        let path = self.root.join(collection);
        let encoded = serde_json::to_string_pretty(items).map_err(|err| {
            RepositoryError::Unavailable(format!("failed to encode {collection}: {err}"))
        })?;
        fs::write(&path, encoded).map_err(|err| unavailable(&path, err))?;
        debug!(collection, records = items.len(), "persisted collection");
        Ok(())
    }

    /// Reads, mutates and writes back one collection under the store lock.
    fn modify<T, R, F>(&self, collection: &str, change: F) -> Result<R, RepositoryError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R, RepositoryError>,
    {
        let _guard = self.guard()?;
        let mut items = self.read(collection)?;
        let outcome = change(&mut items)?;
        self.write(collection, &items)?;
        Ok(outcome)
    }

    fn snapshot<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, RepositoryError> {
        let _guard = self.guard()?;
        self.read(collection)
    }
}

fn unavailable(path: &Path, err: io::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}: {err}", path.display()))
}

impl PositionRepository for JsonFileStore {
    fn positions(&self) -> Result<Vec<Position>, RepositoryError> {
        self.snapshot(POSITIONS)
    }

    fn position(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError> {
        Ok(self
            .snapshot::<Position>(POSITIONS)?
            .into_iter()
            .find(|position| &position.id == id))
    }

    fn insert_position(&self, position: Position) -> Result<Position, RepositoryError> {
        self.modify(POSITIONS, |items: &mut Vec<Position>| {
            if items.iter().any(|existing| existing.id == position.id) {
                return Err(RepositoryError::Conflict);
            }
            items.push(position.clone());
            Ok(position)
        })
    }

    fn update_position(&self, position: Position) -> Result<(), RepositoryError> {
        self.modify(POSITIONS, |items: &mut Vec<Position>| {
            let slot = items
                .iter_mut()
                .find(|existing| existing.id == position.id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = position;
            Ok(())
        })
    }

    fn delete_position(&self, id: &PositionId) -> Result<bool, RepositoryError> {
        self.modify(POSITIONS, |items: &mut Vec<Position>| {
            let before = items.len();
            items.retain(|position| &position.id != id);
            Ok(items.len() != before)
        })
    }
}

impl PresetRepository for JsonFileStore {
    fn presets(&self) -> Result<Vec<ScreeningPreset>, RepositoryError> {
        self.snapshot(PRESETS)
    }

    fn preset(&self, id: &str) -> Result<Option<ScreeningPreset>, RepositoryError> {
        Ok(self
            .snapshot::<ScreeningPreset>(PRESETS)?
            .into_iter()
            .find(|preset| preset.id == id))
    }

    fn insert_preset(&self, preset: ScreeningPreset) -> Result<ScreeningPreset, RepositoryError> {
        self.modify(PRESETS, |items: &mut Vec<ScreeningPreset>| {
            if items.iter().any(|existing| existing.id == preset.id) {
                return Err(RepositoryError::Conflict);
            }
            items.push(preset.clone());
            Ok(preset)
        })
    }

    fn update_preset(&self, preset: ScreeningPreset) -> Result<(), RepositoryError> {
        self.modify(PRESETS, |items: &mut Vec<ScreeningPreset>| {
            let slot = items
                .iter_mut()
                .find(|existing| existing.id == preset.id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = preset;
            Ok(())
        })
    }
}

impl TemplateRepository for JsonFileStore {
    fn templates(&self) -> Result<Vec<EmailTemplate>, RepositoryError> {
        self.snapshot(TEMPLATES)
    }

    fn template(&self, id: &str) -> Result<Option<EmailTemplate>, RepositoryError> {
        Ok(self
            .snapshot::<EmailTemplate>(TEMPLATES)?
            .into_iter()
            .find(|template| template.id == id))
    }

    fn insert_template(&self, template: EmailTemplate) -> Result<EmailTemplate, RepositoryError> {
        self.modify(TEMPLATES, |items: &mut Vec<EmailTemplate>| {
            if items.iter().any(|existing| existing.id == template.id) {
                return Err(RepositoryError::Conflict);
            }
            items.push(template.clone());
            Ok(template)
        })
    }

    fn update_template(&self, template: EmailTemplate) -> Result<(), RepositoryError> {
        self.modify(TEMPLATES, |items: &mut Vec<EmailTemplate>| {
            let slot = items
                .iter_mut()
                .find(|existing| existing.id == template.id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = template;
            Ok(())
        })
    }
}

impl OverrideRepository for JsonFileStore {
    fn overrides(&self, position_id: &PositionId) -> Result<Vec<OverrideRecord>, RepositoryError> {
        Ok(self
            .snapshot::<OverrideRecord>(OVERRIDES)?
            .into_iter()
            .filter(|record| &record.position_id == position_id)
            .collect())
    }

    fn upsert_override(
        &self,
        candidate_id: &CandidateId,
        position_id: &PositionId,
        update: OverrideUpdate,
        at: DateTime<Utc>,
    ) -> Result<OverrideRecord, RepositoryError> {
        self.modify(OVERRIDES, |items: &mut Vec<OverrideRecord>| {
            let existing = items.iter_mut().find(|record| {
                &record.candidate_id == candidate_id && &record.position_id == position_id
            });

            match existing {
                Some(record) => {
                    if !record.merge(update, at) {
                        debug!(candidate = %candidate_id, "ignored stale override write");
                    }
                    Ok(record.clone())
                }
                None => {
                    let record =
                        OverrideRecord::new(candidate_id.clone(), position_id.clone(), update, at);
                    items.push(record.clone());
                    Ok(record)
                }
            }
        })
    }
}

impl ContactLogRepository for JsonFileStore {
    fn contact_log(&self) -> Result<Vec<ContactRecord>, RepositoryError> {
        self.snapshot(CONTACT_LOG)
    }

    fn append_contact(&self, record: ContactRecord) -> Result<ContactRecord, RepositoryError> {
        self.modify(CONTACT_LOG, |items: &mut Vec<ContactRecord>| {
            items.push(record.clone());
            Ok(record)
        })
    }
}
