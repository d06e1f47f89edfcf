use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::domain::{
    CandidateId, CandidateStatus, Position, PositionDefaults, PositionDraft, PositionId,
    PositionPatch,
};
use super::evaluation::{
    default_setter_preset, screen_all, PresetDraft, PresetPatch, PresetValidationError,
    ScreeningPreset,
};
use super::outreach::{
    compose_message, default_invitation_template, EmailTemplate, MessageTransport,
    OutreachSettings, TemplateDraft, TemplatePatch, TransportError,
};
use super::presentation::{present, CandidateStats, StatusFilter};
use super::repository::{
    ContactRecord, DeliveryOutcome, OverrideRecord, OverrideUpdate, RepositoryError,
    ScreeningStore,
};
use super::resolution::{resolve_all, ResolvedCandidate};
use crate::workflows::sheets::{CandidateSource, SheetImportError};

/// Query for the candidate dashboard. Without a position the first stored
/// position is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateQuery {
    pub position_id: Option<PositionId>,
    pub status: StatusFilter,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSnapshot {
    pub candidates: Vec<ResolvedCandidate>,
    pub stats: CandidateStats,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub candidate_id: CandidateId,
    pub position_id: PositionId,
    #[serde(flatten)]
    pub update: OverrideUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub candidate_ids: Vec<CandidateId>,
    pub template_id: String,
    pub position_id: PositionId,
}

/// Which collaborators are configured, without exposing their settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsStatus {
    pub sheet_configured: bool,
    pub transport_configured: bool,
    pub calendly_configured: bool,
}

/// Composes persistence, candidate import, screening and outreach.
pub struct ScreeningService<S, C, T> {
    store: Arc<S>,
    source: Arc<C>,
    transport: Arc<T>,
    defaults: PositionDefaults,
    outreach: OutreachSettings,
}

fn next_id() -> String {
    Uuid::new_v4().to_string()
}

impl<S, C, T> ScreeningService<S, C, T>
where
    S: ScreeningStore + 'static,
    C: CandidateSource + 'static,
    T: MessageTransport + 'static,
{
    pub fn new(
        store: Arc<S>,
        source: Arc<C>,
        transport: Arc<T>,
        defaults: PositionDefaults,
        outreach: OutreachSettings,
    ) -> Self {
        Self {
            store,
            source,
            transport,
            defaults,
            outreach,
        }
    }

    /// Seeds the default position, preset and template when no position exists.
    /// A conflicting insert means a concurrent caller seeded first.
    pub fn ensure_defaults(&self) -> Result<(), ScreeningServiceError> {
        if !self.store.positions()?.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let position = self.defaults.default_position(now);

        if self.store.preset(&position.screening_preset_id)?.is_none() {
            already_seeded(
                self.store
                    .insert_preset(default_setter_preset(position.id.clone(), now)),
            )?;
        }
        if self.store.template(&position.email_template_id)?.is_none() {
            already_seeded(
                self.store
                    .insert_template(default_invitation_template(position.id.clone(), now)),
            )?;
        }

        let position_id = position.id.clone();
        if already_seeded(self.store.insert_position(position))? {
            info!(position = %position_id, "seeded default position");
        }
        Ok(())
    }

    pub fn positions(&self) -> Result<Vec<Position>, ScreeningServiceError> {
        self.ensure_defaults()?;
        Ok(self.store.positions()?)
    }

    pub fn position(&self, id: &PositionId) -> Result<Position, ScreeningServiceError> {
        self.ensure_defaults()?;
        self.store
            .position(id)?
            .ok_or_else(|| ScreeningServiceError::not_found("position", &id.0))
    }

    pub fn create_position(&self, draft: PositionDraft) -> Result<Position, ScreeningServiceError> {
        let position = draft.into_position(PositionId(next_id()), Utc::now());
        Ok(self.store.insert_position(position)?)
    }

    pub fn update_position(
        &self,
        id: &PositionId,
        patch: PositionPatch,
    ) -> Result<Position, ScreeningServiceError> {
        let mut position = self
            .store
            .position(id)?
            .ok_or_else(|| ScreeningServiceError::not_found("position", &id.0))?;
        position.apply(patch, Utc::now());
        self.store.update_position(position.clone())?;
        Ok(position)
    }

    pub fn delete_position(&self, id: &PositionId) -> Result<(), ScreeningServiceError> {
        if self.store.delete_position(id)? {
            info!(position = %id, "deleted position");
            Ok(())
        } else {
            Err(ScreeningServiceError::not_found("position", &id.0))
        }
    }

    pub fn presets(&self) -> Result<Vec<ScreeningPreset>, ScreeningServiceError> {
        self.ensure_defaults()?;
        Ok(self.store.presets()?)
    }

    pub fn preset(&self, id: &str) -> Result<ScreeningPreset, ScreeningServiceError> {
        self.ensure_defaults()?;
        self.store
            .preset(id)?
            .ok_or_else(|| ScreeningServiceError::not_found("preset", id))
    }

    pub fn create_preset(
        &self,
        draft: PresetDraft,
    ) -> Result<ScreeningPreset, ScreeningServiceError> {
        let preset = draft.into_preset(next_id(), Utc::now());
        preset.validate()?;
        info!(preset = %preset.id, rules = preset.rules.len(), "created screening preset");
        Ok(self.store.insert_preset(preset)?)
    }

    pub fn update_preset(
        &self,
        id: &str,
        patch: PresetPatch,
    ) -> Result<ScreeningPreset, ScreeningServiceError> {
        let mut preset = self
            .store
            .preset(id)?
            .ok_or_else(|| ScreeningServiceError::not_found("preset", id))?;
        preset.apply(patch, Utc::now());
        preset.validate()?;
        self.store.update_preset(preset.clone())?;
        info!(preset = %preset.id, "updated screening preset");
        Ok(preset)
    }

    pub fn templates(&self) -> Result<Vec<EmailTemplate>, ScreeningServiceError> {
        self.ensure_defaults()?;
        Ok(self.store.templates()?)
    }

    pub fn template(&self, id: &str) -> Result<EmailTemplate, ScreeningServiceError> {
        self.store
            .template(id)?
            .ok_or_else(|| ScreeningServiceError::not_found("template", id))
    }

    pub fn create_template(
        &self,
        draft: TemplateDraft,
    ) -> Result<EmailTemplate, ScreeningServiceError> {
        let template = draft.into_template(next_id(), Utc::now());
        Ok(self.store.insert_template(template)?)
    }

    pub fn update_template(
        &self,
        id: &str,
        patch: TemplatePatch,
    ) -> Result<EmailTemplate, ScreeningServiceError> {
        let mut template = self.template(id)?;
        template.apply(patch, Utc::now());
        self.store.update_template(template.clone())?;
        Ok(template)
    }

    pub fn override_status(
        &self,
        request: OverrideRequest,
    ) -> Result<OverrideRecord, ScreeningServiceError> {
        self.override_status_at(request, Utc::now())
    }

    pub fn override_status_at(
        &self,
        request: OverrideRequest,
        at: DateTime<Utc>,
    ) -> Result<OverrideRecord, ScreeningServiceError> {
        let record = self.store.upsert_override(
            &request.candidate_id,
            &request.position_id,
            request.update,
            at,
        )?;
        info!(
            candidate = %record.candidate_id,
            position = %record.position_id,
            status = record.status.map(CandidateStatus::label).unwrap_or("-"),
            "stored candidate override"
        );
        Ok(record)
    }

    fn resolve_position(
        &self,
        position_id: Option<&PositionId>,
    ) -> Result<Position, ScreeningServiceError> {
        match position_id {
            Some(id) => self.position(id),
            None => self
                .positions()?
                .into_iter()
                .next()
                .ok_or_else(|| ScreeningServiceError::not_found("position", "default")),
        }
    }

    fn resolved_candidates(
        &self,
        position: &Position,
    ) -> Result<Vec<ResolvedCandidate>, ScreeningServiceError> {
        let candidates = self.source.fetch(position)?;
        let preset = self.store.preset(&position.screening_preset_id)?;
        if preset.is_none() {
            warn!(
                position = %position.id,
                preset = %position.screening_preset_id,
                "no screening preset, candidates left pending review"
            );
        }

        let results = screen_all(&candidates, preset.as_ref());
        let overrides = self.store.overrides(&position.id)?;
        let contacts = self.store.contact_log()?;

        Ok(resolve_all(
            candidates,
            &position.id,
            &results,
            &overrides,
            &contacts,
        ))
    }

    pub fn candidate_snapshot(
        &self,
        query: CandidateQuery,
    ) -> Result<CandidateSnapshot, ScreeningServiceError> {
        let position = self.resolve_position(query.position_id.as_ref())?;
        let views = self.resolved_candidates(&position)?;
        let snapshot = present(views, &query.status, query.search.as_deref(), Utc::now());

        info!(
            position = %position.id,
            total = snapshot.stats.total,
            listed = snapshot.candidates.len(),
            "built candidate snapshot"
        );

        Ok(CandidateSnapshot {
            candidates: snapshot.candidates,
            stats: snapshot.stats,
            position,
        })
    }

    /// Sends the template to every requested candidate, pausing between
    /// messages. Every attempt is logged; failed deliveries do not stop the run.
    /// Blocks the calling thread for the bulk delay.
    pub fn send_messages(
        &self,
        request: SendRequest,
    ) -> Result<Vec<ContactRecord>, ScreeningServiceError> {
        let template = self.template(&request.template_id)?;
        let position = self.position(&request.position_id)?;
        let candidates = self.source.fetch(&position)?;

        let mut recipients = Vec::with_capacity(request.candidate_ids.len());
        for id in &request.candidate_ids {
            let candidate = candidates
                .iter()
                .find(|candidate| &candidate.id == id)
                .ok_or_else(|| ScreeningServiceError::UnknownCandidate(id.clone()))?;
            recipients.push(candidate);
        }

        let mut records = Vec::with_capacity(recipients.len());
        for (index, candidate) in recipients.into_iter().enumerate() {
            if index > 0 && !self.outreach.bulk_delay.is_zero() {
                thread::sleep(self.outreach.bulk_delay);
            }

            let message = compose_message(candidate, &template, &position, &self.outreach);
            let (status, error) = match self.transport.deliver(&message) {
                Ok(()) => (DeliveryOutcome::Sent, None),
                Err(err) => {
                    warn!(candidate = %candidate.id, error = %err, "message delivery failed");
                    (DeliveryOutcome::Failed, Some(err.to_string()))
                }
            };

            let record = self.store.append_contact(ContactRecord {
                id: next_id(),
                candidate_id: candidate.id.clone(),
                candidate_email: candidate.email.clone(),
                candidate_name: candidate.name.clone(),
                template_id: template.id.clone(),
                position_id: position.id.clone(),
                subject: message.subject,
                sent_at: Utc::now(),
                status,
                error,
            })?;
            records.push(record);
        }

        let delivered = records.iter().filter(|record| record.delivered()).count();
        info!(
            position = %position.id,
            template = %template.id,
            attempted = records.len(),
            delivered,
            "outreach run finished"
        );

        Ok(records)
    }

    pub fn contact_log(&self) -> Result<Vec<ContactRecord>, ScreeningServiceError> {
        Ok(self.store.contact_log()?)
    }

    pub fn settings_status(&self) -> SettingsStatus {
        SettingsStatus {
            sheet_configured: !self.defaults.sheet_id.trim().is_empty(),
            transport_configured: self.transport.is_configured(),
            calendly_configured: self.defaults.calendly_link
                != PositionDefaults::default().calendly_link,
        }
    }

    /// Reads the header row of the position's spreadsheet.
    pub fn test_source(
        &self,
        position_id: Option<&PositionId>,
    ) -> Result<Vec<String>, ScreeningServiceError> {
        let position = self.resolve_position(position_id)?;
        Ok(self.source.headers(&position)?)
    }

    pub fn test_transport(&self) -> Result<(), ScreeningServiceError> {
        Ok(self.transport.verify()?)
    }
}

/// `Ok(false)` when the record was inserted by someone else in the meantime.
fn already_seeded<V>(outcome: Result<V, RepositoryError>) -> Result<bool, RepositoryError> {
    match outcome {
        Ok(_) => Ok(true),
        Err(RepositoryError::Conflict) => {
            debug!("default record already seeded");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Error raised by the screening service.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Import(#[from] SheetImportError),
    #[error(transparent)]
    Validation(#[from] PresetValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("candidate '{0}' is not part of the position's applicants")]
    UnknownCandidate(CandidateId),
}

impl ScreeningServiceError {
    fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
