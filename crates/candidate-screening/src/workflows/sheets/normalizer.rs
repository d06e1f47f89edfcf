use crate::workflows::screening::domain::{
    ScriptRelationship, SetterApproach, TimeSlot, VatNumberStatus, WeeklyHours,
};

const AFFIRMATIVE: [&str; 5] = ["TRUE", "SI", "SÌ", "YES", "1"];

pub(crate) fn normalize_answer(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn parse_boolean(value: Option<&str>) -> bool {
    value
        .map(|raw| normalize_answer(raw).to_uppercase())
        .is_some_and(|answer| AFFIRMATIVE.contains(&answer.as_str()))
}

pub(crate) fn parse_vat_number(value: Option<&str>) -> VatNumberStatus {
    let Some(answer) = value.map(|raw| normalize_answer(raw).to_lowercase()) else {
        return VatNumberStatus::NotInterested;
    };

    if answer == "si" || answer == "sì" {
        VatNumberStatus::Registered
    } else if answer.contains("pronto") || answer.contains("aprirla") {
        VatNumberStatus::WillingToOpen
    } else {
        VatNumberStatus::NotInterested
    }
}

pub(crate) fn parse_setter_approach(value: Option<&str>) -> SetterApproach {
    let Some(answer) = value.map(|raw| normalize_answer(raw).to_lowercase()) else {
        return SetterApproach::Balanced;
    };

    if answer.contains("solo appuntamenti realmente qualificati") {
        SetterApproach::QualityOnly
    } else if answer.contains("mix") || answer.contains("quantità ma con un minimo di qualità") {
        SetterApproach::Balanced
    } else if answer.contains("chiudo più appuntamenti possibili") {
        SetterApproach::VolumeFirst
    } else {
        SetterApproach::Balanced
    }
}

pub(crate) fn parse_script_relationship(value: Option<&str>) -> ScriptRelationship {
    let Some(answer) = value.map(|raw| normalize_answer(raw).to_lowercase()) else {
        return ScriptRelationship::GuideAndAdapt;
    };

    if answer.contains("guida ma personalizzo") {
        ScriptRelationship::GuideAndAdapt
    } else if answer.contains("lettera") {
        ScriptRelationship::Verbatim
    } else if answer.contains("improvvis") {
        ScriptRelationship::Improvises
    } else if answer.contains("non mi piacciono") {
        ScriptRelationship::Dislikes
    } else {
        ScriptRelationship::GuideAndAdapt
    }
}

pub(crate) fn parse_weekly_hours(value: Option<&str>) -> WeeklyHours {
    match value {
        Some(answer) if answer.contains("25h+") || answer.contains("25+") => WeeklyHours::Over25,
        _ => WeeklyHours::From20To25,
    }
}

pub(crate) fn parse_time_slot(value: Option<&str>) -> TimeSlot {
    let Some(answer) = value.map(|raw| normalize_answer(raw).to_lowercase()) else {
        return TimeSlot::Flexible;
    };

    if answer.contains("mattina") || answer.contains("9-13") {
        TimeSlot::Morning
    } else if answer.contains("pomeriggio") || answer.contains("14-18") {
        TimeSlot::Afternoon
    } else {
        TimeSlot::Flexible
    }
}
