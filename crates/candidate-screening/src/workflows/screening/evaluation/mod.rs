mod config;
mod policy;
mod rules;

pub use config::{
    default_setter_preset, default_setter_rules, ComparisonValue, FieldRef, PresetDraft,
    PresetPatch, PresetValidationError, RuleOperator, ScreeningPreset, ScreeningRule,
};
pub use policy::rationale;
pub use rules::{evaluate_rule, score_candidate, RuleRef, ScoreAggregate};

use std::collections::HashMap;

use super::domain::{Candidate, CandidateId, CandidateStatus};
use policy::classify;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stateless evaluator that applies one preset to candidates.
#[derive(Debug, Clone)]
pub struct ScreeningEngine {
    preset: ScreeningPreset,
}

impl ScreeningEngine {
    pub fn new(preset: ScreeningPreset) -> Self {
        Self { preset }
    }

    pub fn preset(&self) -> &ScreeningPreset {
        &self.preset
    }

    pub fn aggregate(&self, candidate: &Candidate) -> ScoreAggregate {
        score_candidate(candidate, &self.preset.rules)
    }

    pub fn evaluate(&self, candidate: &Candidate) -> EvaluationResult {
        let aggregate = self.aggregate(candidate);
        let status = classify(&aggregate, &self.preset);

        EvaluationResult {
            candidate_id: candidate.id.clone(),
            status,
            matched_weight: aggregate.matched_weight,
            total_weight: aggregate.total_weight,
            percentage: aggregate.display_percentage(),
            matched_rules: aggregate.matched_rules,
            failed_rules: aggregate.failed_rules,
        }
    }

    pub fn screen_all(&self, candidates: &[Candidate]) -> ScreeningResults {
        let results = candidates
            .iter()
            .map(|candidate| (candidate.id.clone(), self.evaluate(candidate)))
            .collect();

        debug!(
            preset = %self.preset.id,
            candidates = candidates.len(),
            "screened candidate batch"
        );

        ScreeningResults { results }
    }
}

/// Screens every candidate against `preset`. Without a preset no results are
/// produced and callers fall back to pending review for everyone.
pub fn screen_all(candidates: &[Candidate], preset: Option<&ScreeningPreset>) -> ScreeningResults {
    match preset {
        Some(preset) => ScreeningEngine::new(preset.clone()).screen_all(candidates),
        None => ScreeningResults::default(),
    }
}

/// Per-candidate evaluation output, kept for audit and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub candidate_id: CandidateId,
    pub status: CandidateStatus,
    pub matched_weight: u32,
    pub total_weight: u32,
    pub percentage: u8,
    pub matched_rules: Vec<RuleRef>,
    pub failed_rules: Vec<RuleRef>,
}

/// Read-only lookup of evaluation results keyed by candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningResults {
    results: HashMap<CandidateId, EvaluationResult>,
}

impl ScreeningResults {
    pub fn get(&self, id: &CandidateId) -> Option<&EvaluationResult> {
        self.results.get(id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateId, &EvaluationResult)> {
        self.results.iter()
    }
}
