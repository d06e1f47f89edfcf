use super::super::domain::CandidateStatus;
use super::config::ScreeningPreset;
use super::rules::ScoreAggregate;

/// Maps an aggregate onto a status. A failed required rule vetoes any
/// percentage; otherwise the unrounded percentage is compared against the
/// suitable threshold first and the doubtful threshold second.
pub(crate) fn classify(aggregate: &ScoreAggregate, preset: &ScreeningPreset) -> CandidateStatus {
    if aggregate.has_required_failure {
        return CandidateStatus::Unsuitable;
    }

    let percentage = aggregate.percentage();

    if percentage >= f64::from(preset.suitable_threshold) {
        return CandidateStatus::Suitable;
    }

    if percentage >= f64::from(preset.doubtful_threshold) {
        return CandidateStatus::Doubtful;
    }

    CandidateStatus::Unsuitable
}

/// Human readable explanation of a classification for CLI and audit output.
pub fn rationale(aggregate: &ScoreAggregate, preset: &ScreeningPreset) -> String {
    if aggregate.has_required_failure {
        let required: Vec<&str> = preset
            .rules
            .iter()
            .filter(|rule| rule.is_required)
            .filter(|rule| {
                aggregate
                    .failed_rules
                    .iter()
                    .any(|failed| failed.rule_id == rule.id)
            })
            .map(|rule| rule.label.as_str())
            .collect();
        return format!("required criteria not met: {}", required.join(", "));
    }

    format!(
        "{:.1}% of weighted criteria met (suitable >= {}%, doubtful >= {}%)",
        aggregate.percentage(),
        preset.suitable_threshold,
        preset.doubtful_threshold
    )
}
