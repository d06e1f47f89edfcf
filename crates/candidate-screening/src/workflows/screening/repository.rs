use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{CandidateId, CandidateStatus, Position, PositionId};
use super::evaluation::ScreeningPreset;
use super::outreach::EmailTemplate;

/// Manual status/notes correction for one candidate within one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub candidate_id: CandidateId,
    pub position_id: PositionId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_status_as_none"
    )]
    pub status: Option<CandidateStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an operator may change on an override. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideUpdate {
    #[serde(default, deserialize_with = "blank_status_as_none")]
    pub status: Option<CandidateStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OverrideRecord {
    pub fn new(
        candidate_id: CandidateId,
        position_id: PositionId,
        update: OverrideUpdate,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            candidate_id,
            position_id,
            status: update.status,
            notes: update.notes,
            updated_at: at,
        }
    }

    /// Merges `update` into the record. Writes older than the stored record lose.
    pub fn merge(&mut self, update: OverrideUpdate, at: DateTime<Utc>) -> bool {
        if at < self.updated_at {
            return false;
        }
        if update.status.is_some() {
            self.status = update.status;
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }
        self.updated_at = at;
        true
    }
}

fn blank_status_as_none<'de, D>(deserializer: D) -> Result<Option<CandidateStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => CandidateStatus::from_label(label)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown candidate status '{label}'"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
    Pending,
}

/// One outbound message attempt, appended to the contact log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: String,
    pub candidate_id: CandidateId,
    pub candidate_email: String,
    pub candidate_name: String,
    pub template_id: String,
    pub position_id: PositionId,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContactRecord {
    pub fn delivered(&self) -> bool {
        self.status == DeliveryOutcome::Sent
    }
}

pub trait PositionRepository: Send + Sync {
    fn positions(&self) -> Result<Vec<Position>, RepositoryError>;
    fn position(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError>;
    fn insert_position(&self, position: Position) -> Result<Position, RepositoryError>;
    fn update_position(&self, position: Position) -> Result<(), RepositoryError>;
    fn delete_position(&self, id: &PositionId) -> Result<bool, RepositoryError>;
}

pub trait PresetRepository: Send + Sync {
    fn presets(&self) -> Result<Vec<ScreeningPreset>, RepositoryError>;
    fn preset(&self, id: &str) -> Result<Option<ScreeningPreset>, RepositoryError>;
    fn insert_preset(&self, preset: ScreeningPreset) -> Result<ScreeningPreset, RepositoryError>;
    fn update_preset(&self, preset: ScreeningPreset) -> Result<(), RepositoryError>;
}

pub trait TemplateRepository: Send + Sync {
    fn templates(&self) -> Result<Vec<EmailTemplate>, RepositoryError>;
    fn template(&self, id: &str) -> Result<Option<EmailTemplate>, RepositoryError>;
    fn insert_template(&self, template: EmailTemplate) -> Result<EmailTemplate, RepositoryError>;
    fn update_template(&self, template: EmailTemplate) -> Result<(), RepositoryError>;
}

pub trait OverrideRepository: Send + Sync {
    fn overrides(&self, position_id: &PositionId) -> Result<Vec<OverrideRecord>, RepositoryError>;
    /// Inserts or merges the override for the (candidate, position) pair.
    fn upsert_override(
        &self,
        candidate_id: &CandidateId,
        position_id: &PositionId,
        update: OverrideUpdate,
        at: DateTime<Utc>,
    ) -> Result<OverrideRecord, RepositoryError>;
}

pub trait ContactLogRepository: Send + Sync {
    /// Every contact attempt in append order.
    fn contact_log(&self) -> Result<Vec<ContactRecord>, RepositoryError>;
    fn append_contact(&self, record: ContactRecord) -> Result<ContactRecord, RepositoryError>;
}

/// Everything the screening service needs from persistence.
pub trait ScreeningStore:
    PositionRepository + PresetRepository + TemplateRepository + OverrideRepository + ContactLogRepository
{
}

impl<T> ScreeningStore for T where
    T: PositionRepository
        + PresetRepository
        + TemplateRepository
        + OverrideRepository
        + ContactLogRepository
{
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored collection {collection} is unreadable: {reason}")]
    Corrupt { collection: String, reason: String },
}
