//! Candidate screening: rule evaluation, status resolution, the dashboard
//! snapshot, and the persistence and outreach seams around them.

pub mod domain;
pub mod evaluation;
pub mod outreach;
pub mod presentation;
pub mod repository;
pub mod resolution;
pub mod router;
pub mod service;
pub mod smtp;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Candidate, CandidateField, CandidateId, CandidateStatus, FieldValue, Position,
    PositionDefaults, PositionDraft, PositionId, PositionPatch, ScriptRelationship,
    SetterApproach, TimeSlot, VatNumberStatus, WeeklyHours, DEFAULT_POSITION_ID,
    DEFAULT_PRESET_ID, DEFAULT_TEMPLATE_ID,
};
pub use evaluation::{
    default_setter_preset, default_setter_rules, evaluate_rule, rationale, score_candidate,
    screen_all, ComparisonValue, EvaluationResult, FieldRef, PresetDraft, PresetPatch,
    PresetValidationError, RuleOperator, RuleRef, ScoreAggregate, ScreeningEngine,
    ScreeningPreset, ScreeningResults, ScreeningRule,
};
pub use outreach::{
    compose_message, default_invitation_template, render_placeholders, EmailTemplate,
    MessageTransport, OutboundMessage, OutreachSettings, TemplateDraft, TemplatePatch,
    TransportError,
};
pub use presentation::{
    present, CandidateStats, PresentationSnapshot, StatusCounts, StatusFilter, StatusFilterError,
};
pub use repository::{
    ContactLogRepository, ContactRecord, DeliveryOutcome, OverrideRecord, OverrideRepository,
    OverrideUpdate, PositionRepository, PresetRepository, RepositoryError, ScreeningStore,
    TemplateRepository,
};
pub use resolution::{resolve, resolve_all, ResolvedCandidate};
pub use router::screening_router;
pub use service::{
    CandidateQuery, CandidateSnapshot, OverrideRequest, ScreeningService, ScreeningServiceError,
    SendRequest, SettingsStatus,
};
pub use smtp::{SmtpMessageTransport, SmtpSettings};
pub use store::JsonFileStore;
