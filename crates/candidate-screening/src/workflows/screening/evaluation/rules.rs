use serde::{Deserialize, Serialize};

use super::super::domain::{Candidate, FieldValue};
use super::config::{RuleOperator, ScreeningRule};

const AFFIRMATIVE_TOKENS: [&str; 5] = ["true", "yes", "si", "sì", "1"];
const NEGATIVE_TOKENS: [&str; 3] = ["false", "no", "0"];

/// Reference to a rule in an evaluation trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub rule_id: String,
    pub label: String,
}

impl From<&ScreeningRule> for RuleRef {
    fn from(rule: &ScreeningRule) -> Self {
        Self {
            rule_id: rule.id.clone(),
            label: rule.label.clone(),
        }
    }
}

/// Weighted tally of one candidate against every rule of a preset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreAggregate {
    pub matched_weight: u32,
    pub total_weight: u32,
    pub matched_rules: Vec<RuleRef>,
    pub failed_rules: Vec<RuleRef>,
    pub has_required_failure: bool,
}

impl ScoreAggregate {
    /// Unrounded match percentage. Threshold comparisons use this value.
    pub fn percentage(&self) -> f64 {
        if self.total_weight == 0 {
            return 0.0;
        }
        f64::from(self.matched_weight) / f64::from(self.total_weight) * 100.0
    }

    /// Percentage rounded half away from zero, as shown to operators.
    pub fn display_percentage(&self) -> u8 {
        self.percentage().round().clamp(0.0, 100.0) as u8
    }
}

/// Returns whether `candidate` satisfies `rule`. Missing fields and unknown
/// operators never match.
pub fn evaluate_rule(candidate: &Candidate, rule: &ScreeningRule) -> bool {
    let Some(value) = rule.field.resolve(candidate) else {
        return false;
    };

    let field = value.normalized();
    let expected = rule.value.normalized();

    match rule.operator {
        RuleOperator::Equals => field == expected,
        RuleOperator::NotEquals => field != expected,
        RuleOperator::Contains => field.contains(&expected),
        RuleOperator::NotContains => !field.contains(&expected),
        RuleOperator::IsTrue => {
            matches!(value, FieldValue::Flag(true)) || AFFIRMATIVE_TOKENS.contains(&field.as_str())
        }
        RuleOperator::IsFalse => {
            matches!(value, FieldValue::Flag(false)) || NEGATIVE_TOKENS.contains(&field.as_str())
        }
        RuleOperator::Unrecognized => false,
    }
}

pub fn score_candidate(candidate: &Candidate, rules: &[ScreeningRule]) -> ScoreAggregate {
    let mut aggregate = ScoreAggregate::default();

    for rule in rules {
        aggregate.total_weight = aggregate.total_weight.saturating_add(rule.weight);

        if evaluate_rule(candidate, rule) {
            aggregate.matched_weight = aggregate.matched_weight.saturating_add(rule.weight);
            aggregate.matched_rules.push(RuleRef::from(rule));
        } else {
            aggregate.failed_rules.push(RuleRef::from(rule));
            if rule.is_required {
                aggregate.has_required_failure = true;
            }
        }
    }

    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::screening::domain::{
        CandidateField, CandidateId, ScriptRelationship, SetterApproach, TimeSlot,
        VatNumberStatus, WeeklyHours,
    };
    use crate::workflows::screening::evaluation::config::{ComparisonValue, FieldRef};

    fn candidate() -> Candidate {
        Candidate {
            id: CandidateId("tok-1".to_string()),
            name: "Giulia Rossi".to_string(),
            email: "giulia@example.com".to_string(),
            phone: "+39 333 000 0000".to_string(),
            city: "Milano".to_string(),
            has_pc: true,
            stable_connection: false,
            quiet_environment: true,
            vat_number: VatNumberStatus::WillingToOpen,
            setter_experience: true,
            setter_experience_description: "Two years booking demos".to_string(),
            call_center_experience: false,
            call_center_description: String::new(),
            setter_approach: SetterApproach::QualityOnly,
            script_relationship: ScriptRelationship::GuideAndAdapt,
            weekly_hours: WeeklyHours::Over25,
            motivation: "  Voglio crescere  ".to_string(),
            time_slot: TimeSlot::Flexible,
            submitted_at: "2026-01-12 10:00:00".to_string(),
        }
    }

    fn rule_for(field: FieldRef, operator: RuleOperator, value: ComparisonValue) -> ScreeningRule {
        ScreeningRule {
            id: "r".to_string(),
            field,
            label: "rule".to_string(),
            operator,
            value,
            is_required: false,
            weight: 1,
        }
    }

    #[test]
    fn textual_operators_ignore_case_and_padding() {
        let candidate = candidate();
        let city = FieldRef::Known(CandidateField::City);

        assert!(evaluate_rule(
            &candidate,
            &rule_for(city.clone(), RuleOperator::Equals, " MILANO ".into())
        ));
        assert!(!evaluate_rule(
            &candidate,
            &rule_for(city.clone(), RuleOperator::NotEquals, "milano".into())
        ));
        assert!(evaluate_rule(
            &candidate,
            &rule_for(
                CandidateField::Motivation.into(),
                RuleOperator::Contains,
                "CRESCERE".into()
            )
        ));
        assert!(evaluate_rule(
            &candidate,
            &rule_for(city, RuleOperator::NotContains, "roma".into())
        ));
    }

    #[test]
    fn boolean_operators_accept_flags_and_tokens() {
        let candidate = candidate();

        assert!(evaluate_rule(
            &candidate,
            &rule_for(CandidateField::HasPc.into(), RuleOperator::IsTrue, true.into())
        ));
        assert!(evaluate_rule(
            &candidate,
            &rule_for(
                CandidateField::StableConnection.into(),
                RuleOperator::IsFalse,
                true.into()
            )
        ));
        assert!(!evaluate_rule(
            &candidate,
            &rule_for(
                CandidateField::StableConnection.into(),
                RuleOperator::IsTrue,
                true.into()
            )
        ));

        let mut affirmative = candidate.clone();
        affirmative.motivation = "Sì".to_string();
        assert!(evaluate_rule(
            &affirmative,
            &rule_for(
                CandidateField::Motivation.into(),
                RuleOperator::IsTrue,
                true.into()
            )
        ));
    }

    #[test]
    fn enumerated_fields_compare_by_token() {
        let candidate = candidate();
        assert!(evaluate_rule(
            &candidate,
            &rule_for(
                CandidateField::VatNumber.into(),
                RuleOperator::NotEquals,
                "non_interessato".into()
            )
        ));
        assert!(evaluate_rule(
            &candidate,
            &rule_for(
                CandidateField::WeeklyHours.into(),
                RuleOperator::Equals,
                "25h+".into()
            )
        ));
    }

    #[test]
    fn unknown_fields_and_operators_fail_closed() {
        let candidate = candidate();
        let unknown = FieldRef::Unrecognized("score".to_string());

        for operator in [
            RuleOperator::Equals,
            RuleOperator::NotEquals,
            RuleOperator::Contains,
            RuleOperator::NotContains,
            RuleOperator::IsTrue,
            RuleOperator::IsFalse,
        ] {
            assert!(
                !evaluate_rule(&candidate, &rule_for(unknown.clone(), operator, "x".into())),
                "{operator:?} matched a missing field"
            );
        }

        assert!(!evaluate_rule(
            &candidate,
            &rule_for(
                CandidateField::HasPc.into(),
                RuleOperator::Unrecognized,
                true.into()
            )
        ));
    }

    #[test]
    fn aggregate_tracks_weights_and_required_failures() {
        let candidate = candidate();
        let mut required_miss = rule_for(
            CandidateField::StableConnection.into(),
            RuleOperator::IsTrue,
            true.into(),
        );
        required_miss.id = "connection".to_string();
        required_miss.is_required = true;
        required_miss.weight = 10;

        let mut hit = rule_for(CandidateField::HasPc.into(), RuleOperator::IsTrue, true.into());
        hit.id = "pc".to_string();
        hit.weight = 5;

        let aggregate = score_candidate(&candidate, &[required_miss, hit]);

        assert_eq!(aggregate.matched_weight, 5);
        assert_eq!(aggregate.total_weight, 15);
        assert!(aggregate.has_required_failure);
        assert_eq!(aggregate.display_percentage(), 33);
        assert_eq!(aggregate.matched_rules[0].rule_id, "pc");
        assert_eq!(aggregate.failed_rules[0].rule_id, "connection");
    }

    #[test]
    fn empty_rule_set_scores_zero() {
        let aggregate = score_candidate(&candidate(), &[]);
        assert_eq!(aggregate.total_weight, 0);
        assert_eq!(aggregate.percentage(), 0.0);
        assert!(!aggregate.has_required_failure);
    }

    #[test]
    fn oversized_weights_saturate_instead_of_overflowing() {
        let candidate = candidate();
        let mut first = rule_for(CandidateField::HasPc.into(), RuleOperator::IsTrue, true.into());
        first.id = "pc".to_string();
        first.weight = 3_000_000_000;
        let mut second = first.clone();
        second.id = "pc-again".to_string();

        let aggregate = score_candidate(&candidate, &[first, second]);

        assert_eq!(aggregate.total_weight, u32::MAX);
        assert_eq!(aggregate.matched_weight, u32::MAX);
        assert_eq!(aggregate.display_percentage(), 100);
    }
}
