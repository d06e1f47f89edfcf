use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity token assigned to a candidate when the questionnaire row is ingested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the job position that owns presets, overrides and outreach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(pub String);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applicant record as exported by the questionnaire spreadsheet.
///
/// Records are never mutated once ingested; everything else in the screening
/// workflow derives data from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub has_pc: bool,
    pub stable_connection: bool,
    pub quiet_environment: bool,
    pub vat_number: VatNumberStatus,
    pub setter_experience: bool,
    pub setter_experience_description: String,
    pub call_center_experience: bool,
    pub call_center_description: String,
    pub setter_approach: SetterApproach,
    pub script_relationship: ScriptRelationship,
    pub weekly_hours: WeeklyHours,
    pub motivation: String,
    pub time_slot: TimeSlot,
    pub submitted_at: String,
}

/// Whether the applicant holds (or would open) an Italian VAT registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VatNumberStatus {
    #[serde(rename = "si")]
    Registered,
    #[serde(rename = "pronto_ad_aprirla")]
    WillingToOpen,
    #[serde(rename = "non_interessato")]
    NotInterested,
}

impl VatNumberStatus {
    pub const fn token(self) -> &'static str {
        match self {
            VatNumberStatus::Registered => "si",
            VatNumberStatus::WillingToOpen => "pronto_ad_aprirla",
            VatNumberStatus::NotInterested => "non_interessato",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetterApproach {
    #[serde(rename = "qualita")]
    QualityOnly,
    #[serde(rename = "quantita_qualita")]
    Balanced,
    #[serde(rename = "quantita")]
    VolumeFirst,
}

impl SetterApproach {
    pub const fn token(self) -> &'static str {
        match self {
            SetterApproach::QualityOnly => "qualita",
            SetterApproach::Balanced => "quantita_qualita",
            SetterApproach::VolumeFirst => "quantita",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptRelationship {
    #[serde(rename = "guida_personalizza")]
    GuideAndAdapt,
    #[serde(rename = "lettera")]
    Verbatim,
    #[serde(rename = "improvvisa")]
    Improvises,
    #[serde(rename = "non_piacciono")]
    Dislikes,
}

impl ScriptRelationship {
    pub const fn token(self) -> &'static str {
        match self {
            ScriptRelationship::GuideAndAdapt => "guida_personalizza",
            ScriptRelationship::Verbatim => "lettera",
            ScriptRelationship::Improvises => "improvvisa",
            ScriptRelationship::Dislikes => "non_piacciono",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeeklyHours {
    #[serde(rename = "25h+")]
    Over25,
    #[serde(rename = "20-25h")]
    From20To25,
}

impl WeeklyHours {
    pub const fn token(self) -> &'static str {
        match self {
            WeeklyHours::Over25 => "25h+",
            WeeklyHours::From20To25 => "20-25h",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "mattina")]
    Morning,
    #[serde(rename = "pomeriggio")]
    Afternoon,
    #[serde(rename = "flessibile")]
    Flexible,
}

impl TimeSlot {
    pub const fn token(self) -> &'static str {
        match self {
            TimeSlot::Morning => "mattina",
            TimeSlot::Afternoon => "pomeriggio",
            TimeSlot::Flexible => "flessibile",
        }
    }
}

/// Candidate attributes a screening rule may target.
///
/// Legacy presets addressed fields by their questionnaire key (`haPC`,
/// `partitaIVA`, ...); those keys are accepted as aliases so stored rule sets keep
/// resolving to the same accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateField {
    #[serde(alias = "nome")]
    Name,
    Email,
    #[serde(alias = "telefono")]
    Phone,
    #[serde(alias = "citta")]
    City,
    #[serde(alias = "haPC")]
    HasPc,
    #[serde(alias = "connessioneStabile")]
    StableConnection,
    #[serde(alias = "ambienteTranquillo")]
    QuietEnvironment,
    #[serde(alias = "partitaIVA")]
    VatNumber,
    #[serde(alias = "esperienzaSetter")]
    SetterExperience,
    #[serde(alias = "descrizioneEsperienza")]
    SetterExperienceDescription,
    #[serde(alias = "esperienzaCallCenter")]
    CallCenterExperience,
    #[serde(alias = "descrizioneCallCenter")]
    CallCenterDescription,
    #[serde(alias = "approccioSetter")]
    SetterApproach,
    #[serde(alias = "rapportoScript")]
    ScriptRelationship,
    #[serde(alias = "oreSettimanali")]
    WeeklyHours,
    #[serde(alias = "motivazione")]
    Motivation,
    #[serde(alias = "fasciaOraria")]
    TimeSlot,
    #[serde(alias = "submittedAt")]
    SubmittedAt,
    Token,
}

/// Borrowed view of a single candidate attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Flag(bool),
    Text(&'a str),
}

impl FieldValue<'_> {
    /// Lower-cased, trimmed string form used by every textual comparison.
    pub fn normalized(&self) -> String {
        match self {
            FieldValue::Flag(flag) => flag.to_string(),
            FieldValue::Text(text) => text.trim().to_lowercase(),
        }
    }
}

impl CandidateField {
    pub fn value_of(self, candidate: &Candidate) -> FieldValue<'_> {
        match self {
            CandidateField::Name => FieldValue::Text(&candidate.name),
            CandidateField::Email => FieldValue::Text(&candidate.email),
            CandidateField::Phone => FieldValue::Text(&candidate.phone),
            CandidateField::City => FieldValue::Text(&candidate.city),
            CandidateField::HasPc => FieldValue::Flag(candidate.has_pc),
            CandidateField::StableConnection => FieldValue::Flag(candidate.stable_connection),
            CandidateField::QuietEnvironment => FieldValue::Flag(candidate.quiet_environment),
            CandidateField::VatNumber => FieldValue::Text(candidate.vat_number.token()),
            CandidateField::SetterExperience => FieldValue::Flag(candidate.setter_experience),
            CandidateField::SetterExperienceDescription => {
                FieldValue::Text(&candidate.setter_experience_description)
            }
            CandidateField::CallCenterExperience => {
                FieldValue::Flag(candidate.call_center_experience)
            }
            CandidateField::CallCenterDescription => {
                FieldValue::Text(&candidate.call_center_description)
            }
            CandidateField::SetterApproach => FieldValue::Text(candidate.setter_approach.token()),
            CandidateField::ScriptRelationship => {
                FieldValue::Text(candidate.script_relationship.token())
            }
            CandidateField::WeeklyHours => FieldValue::Text(candidate.weekly_hours.token()),
            CandidateField::Motivation => FieldValue::Text(&candidate.motivation),
            CandidateField::TimeSlot => FieldValue::Text(candidate.time_slot.token()),
            CandidateField::SubmittedAt => FieldValue::Text(&candidate.submitted_at),
            CandidateField::Token => FieldValue::Text(&candidate.id.0),
        }
    }
}

/// Final or computed suitability of a candidate for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateStatus {
    #[serde(rename = "idoneo")]
    Suitable,
    #[serde(rename = "dubbio")]
    Doubtful,
    #[serde(rename = "da_valutare")]
    PendingReview,
    #[serde(rename = "contattato")]
    Contacted,
    #[serde(rename = "non_idoneo")]
    Unsuitable,
}

impl CandidateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CandidateStatus::Suitable => "idoneo",
            CandidateStatus::Doubtful => "dubbio",
            CandidateStatus::PendingReview => "da_valutare",
            CandidateStatus::Contacted => "contattato",
            CandidateStatus::Unsuitable => "non_idoneo",
        }
    }

    /// Position in the candidate list; lower ranks are listed first.
    pub const fn sort_rank(self) -> u8 {
        match self {
            CandidateStatus::Suitable => 0,
            CandidateStatus::Doubtful => 1,
            CandidateStatus::PendingReview => 2,
            CandidateStatus::Contacted => 3,
            CandidateStatus::Unsuitable => 4,
        }
    }

    pub const fn ordered() -> [CandidateStatus; 5] {
        [
            CandidateStatus::Suitable,
            CandidateStatus::Doubtful,
            CandidateStatus::PendingReview,
            CandidateStatus::Contacted,
            CandidateStatus::Unsuitable,
        ]
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Job position a spreadsheet of applicants is collected for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub name: String,
    pub description: String,
    pub sheet_id: String,
    pub sheet_name: String,
    pub calendly_link: String,
    pub email_template_id: String,
    pub screening_preset_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a position; identity and timestamps are assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sheet_id: String,
    pub sheet_name: String,
    #[serde(default)]
    pub calendly_link: String,
    #[serde(default)]
    pub email_template_id: String,
    #[serde(default)]
    pub screening_preset_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl PositionDraft {
    pub fn into_position(self, id: PositionId, now: DateTime<Utc>) -> Position {
        Position {
            id,
            name: self.name,
            description: self.description,
            sheet_id: self.sheet_id,
            sheet_name: self.sheet_name,
            calendly_link: self.calendly_link,
            email_template_id: self.email_template_id,
            screening_preset_id: self.screening_preset_id,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a position. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub calendly_link: Option<String>,
    #[serde(default)]
    pub email_template_id: Option<String>,
    #[serde(default)]
    pub screening_preset_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Position {
    pub fn apply(&mut self, patch: PositionPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(sheet_id) = patch.sheet_id {
            self.sheet_id = sheet_id;
        }
        if let Some(sheet_name) = patch.sheet_name {
            self.sheet_name = sheet_name;
        }
        if let Some(calendly_link) = patch.calendly_link {
            self.calendly_link = calendly_link;
        }
        if let Some(template_id) = patch.email_template_id {
            self.email_template_id = template_id;
        }
        if let Some(preset_id) = patch.screening_preset_id {
            self.screening_preset_id = preset_id;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }
}

/// Environment-driven values used when the default position is seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionDefaults {
    pub sheet_id: String,
    pub sheet_name: String,
    pub calendly_link: String,
}

impl Default for PositionDefaults {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            sheet_name: "Setter Appointment - 2026".to_string(),
            calendly_link: "https://calendly.com/tuo-link".to_string(),
        }
    }
}

pub const DEFAULT_POSITION_ID: &str = "default-setter-position";
pub const DEFAULT_PRESET_ID: &str = "default-setter";
pub const DEFAULT_TEMPLATE_ID: &str = "default-setter-email";

impl PositionDefaults {
    pub fn default_position(&self, now: DateTime<Utc>) -> Position {
        Position {
            id: PositionId(DEFAULT_POSITION_ID.to_string()),
            name: "Appointment Setter".to_string(),
            description: "Appointment Setter per Leone Master School - Ricerca da Indeed"
                .to_string(),
            sheet_id: self.sheet_id.clone(),
            sheet_name: self.sheet_name.clone(),
            calendly_link: self.calendly_link.clone(),
            email_template_id: DEFAULT_TEMPLATE_ID.to_string(),
            screening_preset_id: DEFAULT_PRESET_ID.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
