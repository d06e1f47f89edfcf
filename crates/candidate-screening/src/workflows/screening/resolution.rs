use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Candidate, CandidateId, CandidateStatus, PositionId};
use super::evaluation::{EvaluationResult, ScreeningResults};
use super::repository::{ContactRecord, OverrideRecord};

/// Candidate as shown to operators: the raw record plus derived status,
/// notes, screening trail and contact flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub position_id: PositionId,
    pub status: CandidateStatus,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screening: Option<EvaluationResult>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
}

/// Combines one candidate with its optional evaluation, optional override and
/// contact history. Override status beats the computed status, which beats
/// pending review.
pub fn resolve<'a, I>(
    candidate: Candidate,
    position_id: &PositionId,
    evaluation: Option<&EvaluationResult>,
    override_record: Option<&OverrideRecord>,
    contacts: I,
) -> ResolvedCandidate
where
    I: IntoIterator<Item = &'a ContactRecord>,
{
    let status = override_record
        .and_then(|record| record.status)
        .or_else(|| evaluation.map(|result| result.status))
        .unwrap_or(CandidateStatus::PendingReview);

    let notes = override_record
        .and_then(|record| record.notes.clone())
        .unwrap_or_default();

    // storage order, not timestamp order
    let email_sent_at = contacts
        .into_iter()
        .filter(|record| record.delivered())
        .last()
        .map(|record| record.sent_at);

    ResolvedCandidate {
        candidate,
        position_id: position_id.clone(),
        status,
        notes,
        screening: evaluation.cloned(),
        email_sent: email_sent_at.is_some(),
        email_sent_at,
    }
}

/// Resolves a whole batch for one position. Overrides for other positions are
/// ignored; contact history is matched by candidate only.
pub fn resolve_all(
    candidates: Vec<Candidate>,
    position_id: &PositionId,
    results: &ScreeningResults,
    overrides: &[OverrideRecord],
    contacts: &[ContactRecord],
) -> Vec<ResolvedCandidate> {
    let overrides: HashMap<&CandidateId, &OverrideRecord> = overrides
        .iter()
        .filter(|record| &record.position_id == position_id)
        .map(|record| (&record.candidate_id, record))
        .collect();

    let mut history: HashMap<&CandidateId, Vec<&ContactRecord>> = HashMap::new();
    for record in contacts {
        history.entry(&record.candidate_id).or_default().push(record);
    }

    candidates
        .into_iter()
        .map(|candidate| {
            let override_record = overrides.get(&candidate.id).copied();
            let evaluation = results.get(&candidate.id);
            let contacts = history.get(&candidate.id).cloned().unwrap_or_default();
            resolve(
                candidate,
                position_id,
                evaluation,
                override_record,
                contacts,
            )
        })
        .collect()
}
