use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::screening::domain::{
    Candidate, CandidateId, Position, PositionDefaults, PositionId, ScriptRelationship,
    SetterApproach, TimeSlot, VatNumberStatus, WeeklyHours,
};
use crate::workflows::screening::evaluation::ScreeningPreset;
use crate::workflows::screening::outreach::{
    EmailTemplate, MessageTransport, OutboundMessage, OutreachSettings, TransportError,
};
use crate::workflows::screening::repository::{
    ContactLogRepository, ContactRecord, OverrideRecord, OverrideRepository, OverrideUpdate,
    PositionRepository, PresetRepository, RepositoryError, TemplateRepository,
};
use crate::workflows::screening::{screening_router, ScreeningService};
use crate::workflows::sheets::{CandidateSource, SheetImportError};

pub(super) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// Applicant who satisfies every default setter rule.
pub(super) fn strong_candidate(token: &str, name: &str) -> Candidate {
    Candidate {
        id: CandidateId(token.to_string()),
        name: name.to_string(),
        email: format!("{}@example.com", token),
        phone: "+39 333 000 0000".to_string(),
        city: "Milano".to_string(),
        has_pc: true,
        stable_connection: true,
        quiet_environment: true,
        vat_number: VatNumberStatus::Registered,
        setter_experience: true,
        setter_experience_description: "Two years booking discovery calls".to_string(),
        call_center_experience: true,
        call_center_description: "Outbound telco".to_string(),
        setter_approach: SetterApproach::QualityOnly,
        script_relationship: ScriptRelationship::GuideAndAdapt,
        weekly_hours: WeeklyHours::Over25,
        motivation: "Crescita professionale".to_string(),
        time_slot: TimeSlot::Flexible,
        submitted_at: "2026-02-20 18:12:00".to_string(),
    }
}

/// Meets every required rule but only 5 of the 31 optional weight points (45 of 71, about 63%).
pub(super) fn doubtful_candidate(token: &str, name: &str) -> Candidate {
    Candidate {
        setter_experience: false,
        call_center_experience: true,
        setter_approach: SetterApproach::VolumeFirst,
        script_relationship: ScriptRelationship::Improvises,
        weekly_hours: WeeklyHours::From20To25,
        city: "Napoli".to_string(),
        ..strong_candidate(token, name)
    }
}

/// Fails the required PC rule.
pub(super) fn unsuitable_candidate(token: &str, name: &str) -> Candidate {
    Candidate {
        has_pc: false,
        city: "Roma".to_string(),
        ..strong_candidate(token, name)
    }
}

pub(super) fn position() -> Position {
    let mut position = PositionDefaults::default().default_position(at(0));
    position.sheet_id = "sheet-1".to_string();
    position
}

pub(super) fn outreach_settings() -> OutreachSettings {
    OutreachSettings {
        bulk_delay: Duration::ZERO,
        ..OutreachSettings::default()
    }
}

pub(super) fn position_defaults() -> PositionDefaults {
    PositionDefaults {
        sheet_id: "sheet-1".to_string(),
        ..PositionDefaults::default()
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) positions: Mutex<Vec<Position>>,
    pub(super) presets: Mutex<Vec<ScreeningPreset>>,
    pub(super) templates: Mutex<Vec<EmailTemplate>>,
    pub(super) overrides: Mutex<Vec<OverrideRecord>>,
    pub(super) contacts: Mutex<Vec<ContactRecord>>,
    /// Number of upcoming `positions()` calls that report an empty collection,
    /// as seen by a caller racing another seeder.
    pub(super) stale_position_reads: AtomicUsize,
}

impl PositionRepository for MemoryStore {
    fn positions(&self) -> Result<Vec<Position>, RepositoryError> {
        let stale = self
            .stale_position_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(Vec::new());
        }
        Ok(self.positions.lock().expect("positions mutex poisoned").clone())
    }

    fn position(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError> {
        let guard = self.positions.lock().expect("positions mutex poisoned");
        Ok(guard.iter().find(|position| &position.id == id).cloned())
    }

    fn insert_position(&self, position: Position) -> Result<Position, RepositoryError> {
        let mut guard = self.positions.lock().expect("positions mutex poisoned");
        if guard.iter().any(|existing| existing.id == position.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(position.clone());
        Ok(position)
    }

    fn update_position(&self, position: Position) -> Result<(), RepositoryError> {
        let mut guard = self.positions.lock().expect("positions mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == position.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = position;
        Ok(())
    }

    fn delete_position(&self, id: &PositionId) -> Result<bool, RepositoryError> {
        let mut guard = self.positions.lock().expect("positions mutex poisoned");
        let before = guard.len();
        guard.retain(|position| &position.id != id);
        Ok(guard.len() != before)
    }
}

impl PresetRepository for MemoryStore {
    fn presets(&self) -> Result<Vec<ScreeningPreset>, RepositoryError> {
        Ok(self.presets.lock().expect("presets mutex poisoned").clone())
    }

    fn preset(&self, id: &str) -> Result<Option<ScreeningPreset>, RepositoryError> {
        let guard = self.presets.lock().expect("presets mutex poisoned");
        Ok(guard.iter().find(|preset| preset.id == id).cloned())
    }

    fn insert_preset(&self, preset: ScreeningPreset) -> Result<ScreeningPreset, RepositoryError> {
        let mut guard = self.presets.lock().expect("presets mutex poisoned");
        if guard.iter().any(|existing| existing.id == preset.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(preset.clone());
        Ok(preset)
    }

    fn update_preset(&self, preset: ScreeningPreset) -> Result<(), RepositoryError> {
        let mut guard = self.presets.lock().expect("presets mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == preset.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = preset;
        Ok(())
    }
}

impl TemplateRepository for MemoryStore {
    fn templates(&self) -> Result<Vec<EmailTemplate>, RepositoryError> {
        Ok(self.templates.lock().expect("templates mutex poisoned").clone())
    }

    fn template(&self, id: &str) -> Result<Option<EmailTemplate>, RepositoryError> {
        let guard = self.templates.lock().expect("templates mutex poisoned");
        Ok(guard.iter().find(|template| template.id == id).cloned())
    }

    fn insert_template(&self, template: EmailTemplate) -> Result<EmailTemplate, RepositoryError> {
        let mut guard = self.templates.lock().expect("templates mutex poisoned");
        guard.push(template.clone());
        Ok(template)
    }

    fn update_template(&self, template: EmailTemplate) -> Result<(), RepositoryError> {
        let mut guard = self.templates.lock().expect("templates mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == template.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = template;
        Ok(())
    }
}

impl OverrideRepository for MemoryStore {
    fn overrides(&self, position_id: &PositionId) -> Result<Vec<OverrideRecord>, RepositoryError> {
        let guard = self.overrides.lock().expect("overrides mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.position_id == position_id)
            .cloned()
            .collect())
    }

    fn upsert_override(
        &self,
        candidate_id: &CandidateId,
        position_id: &PositionId,
        update: OverrideUpdate,
        at: DateTime<Utc>,
    ) -> Result<OverrideRecord, RepositoryError> {
        let mut guard = self.overrides.lock().expect("overrides mutex poisoned");
        if let Some(record) = guard.iter_mut().find(|record| {
            &record.candidate_id == candidate_id && &record.position_id == position_id
        }) {
            record.merge(update, at);
            return Ok(record.clone());
        }
        let record = OverrideRecord::new(candidate_id.clone(), position_id.clone(), update, at);
        guard.push(record.clone());
        Ok(record)
    }
}

impl ContactLogRepository for MemoryStore {
    fn contact_log(&self) -> Result<Vec<ContactRecord>, RepositoryError> {
        Ok(self.contacts.lock().expect("contacts mutex poisoned").clone())
    }

    fn append_contact(&self, record: ContactRecord) -> Result<ContactRecord, RepositoryError> {
        self.contacts
            .lock()
            .expect("contacts mutex poisoned")
            .push(record.clone());
        Ok(record)
    }
}

/// Store whose every call fails as if the backing files were unreachable.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("disk offline".to_string()))
}

impl PositionRepository for UnavailableStore {
    fn positions(&self) -> Result<Vec<Position>, RepositoryError> {
        offline()
    }
    fn position(&self, _id: &PositionId) -> Result<Option<Position>, RepositoryError> {
        offline()
    }
    fn insert_position(&self, _position: Position) -> Result<Position, RepositoryError> {
        offline()
    }
    fn update_position(&self, _position: Position) -> Result<(), RepositoryError> {
        offline()
    }
    fn delete_position(&self, _id: &PositionId) -> Result<bool, RepositoryError> {
        offline()
    }
}

impl PresetRepository for UnavailableStore {
    fn presets(&self) -> Result<Vec<ScreeningPreset>, RepositoryError> {
        offline()
    }
    fn preset(&self, _id: &str) -> Result<Option<ScreeningPreset>, RepositoryError> {
        offline()
    }
    fn insert_preset(&self, _preset: ScreeningPreset) -> Result<ScreeningPreset, RepositoryError> {
        offline()
    }
    fn update_preset(&self, _preset: ScreeningPreset) -> Result<(), RepositoryError> {
        offline()
    }
}

impl TemplateRepository for UnavailableStore {
    fn templates(&self) -> Result<Vec<EmailTemplate>, RepositoryError> {
        offline()
    }
    fn template(&self, _id: &str) -> Result<Option<EmailTemplate>, RepositoryError> {
        offline()
    }
    fn insert_template(&self, _template: EmailTemplate) -> Result<EmailTemplate, RepositoryError> {
        offline()
    }
    fn update_template(&self, _template: EmailTemplate) -> Result<(), RepositoryError> {
        offline()
    }
}

impl OverrideRepository for UnavailableStore {
    fn overrides(&self, _position_id: &PositionId) -> Result<Vec<OverrideRecord>, RepositoryError> {
        offline()
    }
    fn upsert_override(
        &self,
        _candidate_id: &CandidateId,
        _position_id: &PositionId,
        _update: OverrideUpdate,
        _at: DateTime<Utc>,
    ) -> Result<OverrideRecord, RepositoryError> {
        offline()
    }
}

impl ContactLogRepository for UnavailableStore {
    fn contact_log(&self) -> Result<Vec<ContactRecord>, RepositoryError> {
        offline()
    }
    fn append_contact(&self, _record: ContactRecord) -> Result<ContactRecord, RepositoryError> {
        offline()
    }
}

#[derive(Default)]
pub(super) struct MemorySource {
    pub(super) candidates: Mutex<Vec<Candidate>>,
    pub(super) fetch_threads: Mutex<Vec<ThreadId>>,
}

impl MemorySource {
    pub(super) fn with(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
            ..Self::default()
        }
    }
}

impl CandidateSource for MemorySource {
    fn fetch(&self, position: &Position) -> Result<Vec<Candidate>, SheetImportError> {
        if position.sheet_id.is_empty() {
            return Err(SheetImportError::NotConfigured);
        }
        self.fetch_threads
            .lock()
            .expect("source mutex poisoned")
            .push(thread::current().id());
        Ok(self.candidates.lock().expect("source mutex poisoned").clone())
    }

    fn headers(&self, _position: &Position) -> Result<Vec<String>, SheetImportError> {
        Ok(vec!["Nome".to_string(), "Email".to_string()])
    }
}

/// Transport that records delivered messages and rejects listed recipients.
#[derive(Default)]
pub(super) struct MemoryTransport {
    pub(super) sent: Mutex<Vec<OutboundMessage>>,
    pub(super) rejected: HashSet<String>,
    pub(super) offline: bool,
}

impl MemoryTransport {
    pub(super) fn rejecting(addresses: &[&str]) -> Self {
        Self {
            rejected: addresses.iter().map(|address| address.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

impl MessageTransport for MemoryTransport {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        if self.rejected.contains(&message.to) {
            return Err(TransportError::Rejected {
                recipient: message.to.clone(),
                reason: "mailbox unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(message.clone());
        Ok(())
    }

    fn verify(&self) -> Result<(), TransportError> {
        if self.offline {
            Err(TransportError::NotConfigured)
        } else {
            Ok(())
        }
    }

    fn is_configured(&self) -> bool {
        !self.offline
    }
}

pub(super) type MemoryService = ScreeningService<MemoryStore, MemorySource, MemoryTransport>;

pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) transport: Arc<MemoryTransport>,
}

pub(super) fn harness_with(candidates: Vec<Candidate>, transport: MemoryTransport) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let source = Arc::new(MemorySource::with(candidates));
    let transport = Arc::new(transport);
    let service = Arc::new(ScreeningService::new(
        store.clone(),
        source,
        transport.clone(),
        position_defaults(),
        outreach_settings(),
    ));
    Harness {
        service,
        store,
        transport,
    }
}

pub(super) fn harness(candidates: Vec<Candidate>) -> Harness {
    harness_with(candidates, MemoryTransport::default())
}

pub(super) fn mixed_batch() -> Vec<Candidate> {
    vec![
        unsuitable_candidate("tok-3", "Carla Verdi"),
        doubtful_candidate("tok-2", "Bruno Neri"),
        strong_candidate("tok-1", "Anna Galli"),
    ]
}

pub(super) fn router_for(harness: &Harness) -> axum::Router {
    screening_router(harness.service.clone())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
