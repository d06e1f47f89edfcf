use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{
    Candidate, CandidateField, FieldValue, PositionId, DEFAULT_PRESET_ID,
};

/// Candidate attribute targeted by a rule, resolved once when the preset is loaded.
///
/// Names that do not map to a known field are kept verbatim so the rule can be
/// round-tripped, but such a rule never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Known(CandidateField),
    Unrecognized(String),
}

impl FieldRef {
    pub fn resolve<'a>(&self, candidate: &'a Candidate) -> Option<FieldValue<'a>> {
        match self {
            FieldRef::Known(field) => Some(field.value_of(candidate)),
            FieldRef::Unrecognized(_) => None,
        }
    }
}

impl From<CandidateField> for FieldRef {
    fn from(field: CandidateField) -> Self {
        FieldRef::Known(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsTrue,
    IsFalse,
    #[serde(other)]
    Unrecognized,
}

/// Literal a rule compares the candidate field against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComparisonValue {
    Flag(bool),
    Text(String),
}

impl ComparisonValue {
    pub fn normalized(&self) -> String {
        match self {
            ComparisonValue::Flag(flag) => flag.to_string(),
            ComparisonValue::Text(text) => text.trim().to_lowercase(),
        }
    }
}

impl From<&str> for ComparisonValue {
    fn from(value: &str) -> Self {
        ComparisonValue::Text(value.to_string())
    }
}

impl From<bool> for ComparisonValue {
    fn from(value: bool) -> Self {
        ComparisonValue::Flag(value)
    }
}

/// Weighted filter evaluated against every candidate of a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningRule {
    pub id: String,
    pub field: FieldRef,
    pub label: String,
    pub operator: RuleOperator,
    pub value: ComparisonValue,
    #[serde(alias = "isRequired")]
    pub is_required: bool,
    pub weight: u32,
}

/// Named rule set with the two percentage thresholds used for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "filters")]
    pub rules: Vec<ScreeningRule>,
    #[serde(alias = "minScoreForIdoneo")]
    pub suitable_threshold: u8,
    #[serde(alias = "minScoreForDubbio")]
    pub doubtful_threshold: u8,
    #[serde(alias = "positionId")]
    pub position_id: PositionId,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Accepted rule weights. Keeps aggregate sums far from `u32::MAX`.
pub const RULE_WEIGHT_RANGE: RangeInclusive<u32> = 1..=100;

impl ScreeningPreset {
    pub fn total_weight(&self) -> u32 {
        self.rules
            .iter()
            .fold(0u32, |total, rule| total.saturating_add(rule.weight))
    }

    /// Checks the invariants a preset must hold before it is stored.
    pub fn validate(&self) -> Result<(), PresetValidationError> {
        for threshold in [self.suitable_threshold, self.doubtful_threshold] {
            if threshold > 100 {
                return Err(PresetValidationError::ThresholdOutOfRange(threshold));
            }
        }

        if self.doubtful_threshold > self.suitable_threshold {
            return Err(PresetValidationError::ThresholdOrder {
                suitable: self.suitable_threshold,
                doubtful: self.doubtful_threshold,
            });
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !RULE_WEIGHT_RANGE.contains(&rule.weight) {
                return Err(PresetValidationError::WeightOutOfRange {
                    rule: rule.id.clone(),
                    weight: rule.weight,
                });
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(PresetValidationError::DuplicateRule(rule.id.clone()));
            }
        }

        Ok(())
    }

    pub fn apply(&mut self, patch: PresetPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(rules) = patch.rules {
            self.rules = rules;
        }
        if let Some(threshold) = patch.suitable_threshold {
            self.suitable_threshold = threshold;
        }
        if let Some(threshold) = patch.doubtful_threshold {
            self.doubtful_threshold = threshold;
        }
        if let Some(position_id) = patch.position_id {
            self.position_id = position_id;
        }
        self.updated_at = now;
    }
}

/// Preset fields accepted on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "filters")]
    pub rules: Vec<ScreeningRule>,
    #[serde(alias = "minScoreForIdoneo")]
    pub suitable_threshold: u8,
    #[serde(alias = "minScoreForDubbio")]
    pub doubtful_threshold: u8,
    #[serde(alias = "positionId")]
    pub position_id: PositionId,
}

impl PresetDraft {
    pub fn into_preset(self, id: String, now: DateTime<Utc>) -> ScreeningPreset {
        ScreeningPreset {
            id,
            name: self.name,
            description: self.description,
            rules: self.rules,
            suitable_threshold: self.suitable_threshold,
            doubtful_threshold: self.doubtful_threshold,
            position_id: self.position_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "filters")]
    pub rules: Option<Vec<ScreeningRule>>,
    #[serde(default, alias = "minScoreForIdoneo")]
    pub suitable_threshold: Option<u8>,
    #[serde(default, alias = "minScoreForDubbio")]
    pub doubtful_threshold: Option<u8>,
    #[serde(default, alias = "positionId")]
    pub position_id: Option<PositionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresetValidationError {
    #[error("threshold {0} is outside 0..=100")]
    ThresholdOutOfRange(u8),
    #[error("suitable threshold {suitable} is below doubtful threshold {doubtful}")]
    ThresholdOrder { suitable: u8, doubtful: u8 },
    #[error("rule {rule} has weight {weight}, expected 1..=100")]
    WeightOutOfRange { rule: String, weight: u32 },
    #[error("rule id {0} appears more than once")]
    DuplicateRule(String),
}

fn rule(
    id: &str,
    field: CandidateField,
    label: &str,
    operator: RuleOperator,
    value: ComparisonValue,
    is_required: bool,
    weight: u32,
) -> ScreeningRule {
    ScreeningRule {
        id: id.to_string(),
        field: FieldRef::Known(field),
        label: label.to_string(),
        operator,
        value,
        is_required,
        weight,
    }
}

/// Standard rules for the appointment setter position.
pub fn default_setter_rules() -> Vec<ScreeningRule> {
    use CandidateField::*;
    use RuleOperator::*;

    vec![
        rule("f1", HasPc, "Ha un PC adeguato", IsTrue, true.into(), true, 10),
        rule(
            "f2",
            StableConnection,
            "Connessione internet stabile",
            IsTrue,
            true.into(),
            true,
            10,
        ),
        rule(
            "f3",
            QuietEnvironment,
            "Ambiente tranquillo per lavorare",
            IsTrue,
            true.into(),
            true,
            10,
        ),
        rule(
            "f4",
            VatNumber,
            "Partita IVA (ha o è disposto ad aprirla)",
            NotEquals,
            "non_interessato".into(),
            true,
            10,
        ),
        rule(
            "f5",
            SetterExperience,
            "Esperienza come Appointment Setter",
            IsTrue,
            true.into(),
            false,
            8,
        ),
        rule(
            "f6",
            CallCenterExperience,
            "Esperienza in Call Center Outbound",
            IsTrue,
            true.into(),
            false,
            5,
        ),
        rule(
            "f7",
            SetterApproach,
            "Approccio qualitativo (non solo quantità)",
            NotEquals,
            "quantita".into(),
            false,
            7,
        ),
        rule(
            "f8",
            ScriptRelationship,
            "Usa script come guida (non improvvisa)",
            NotEquals,
            "improvvisa".into(),
            false,
            5,
        ),
        rule(
            "f9",
            WeeklyHours,
            "Disponibilità 25h+ settimanali",
            Equals,
            "25h+".into(),
            false,
            6,
        ),
    ]
}

pub fn default_setter_preset(position_id: PositionId, now: DateTime<Utc>) -> ScreeningPreset {
    ScreeningPreset {
        id: DEFAULT_PRESET_ID.to_string(),
        name: "Screening Appointment Setter - Standard".to_string(),
        description: "Criteri di screening standard per la posizione di Appointment Setter presso Leone Master School".to_string(),
        rules: default_setter_rules(),
        suitable_threshold: 85,
        doubtful_threshold: 55,
        position_id,
        created_at: now,
        updated_at: now,
    }
}
