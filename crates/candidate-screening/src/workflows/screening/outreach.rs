use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, Position, PositionId, DEFAULT_TEMPLATE_ID};

/// HTML message template with `{{placeholder}}` markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub position_id: PositionId,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    pub subject: String,
    pub body: String,
    pub position_id: PositionId,
    #[serde(default)]
    pub is_default: bool,
}

impl TemplateDraft {
    pub fn into_template(self, id: String, now: DateTime<Utc>) -> EmailTemplate {
        EmailTemplate {
            id,
            name: self.name,
            subject: self.subject,
            body: self.body,
            position_id: self.position_id,
            is_default: self.is_default,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub position_id: Option<PositionId>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl EmailTemplate {
    pub fn apply(&mut self, patch: TemplatePatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(position_id) = patch.position_id {
            self.position_id = position_id;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
        self.updated_at = now;
    }
}

/// Sender identity and pacing for outbound messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutreachSettings {
    pub from_name: String,
    pub from_address: Option<String>,
    pub company_name: String,
    pub bulk_delay: Duration,
}

impl Default for OutreachSettings {
    fn default() -> Self {
        Self {
            from_name: "Leone Master School - HR".to_string(),
            from_address: None,
            company_name: "Leone Master School".to_string(),
            bulk_delay: Duration::from_millis(1000),
        }
    }
}

impl OutreachSettings {
    pub fn sender(&self) -> String {
        match &self.from_address {
            Some(address) => format!("\"{}\" <{}>", self.from_name, address),
            None => self.from_name.clone(),
        }
    }
}

/// Fully rendered message handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("message transport not configured")]
    NotConfigured,
    #[error("message rejected for {recipient}: {reason}")]
    Rejected { recipient: String, reason: String },
    #[error("message transport unavailable: {0}")]
    Unavailable(String),
}

/// Outbound delivery channel (SMTP relay, API provider, test double).
pub trait MessageTransport: Send + Sync {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError>;
    /// Round-trips to the remote end; may block on network I/O.
    fn verify(&self) -> Result<(), TransportError>;
    /// Whether credentials are present. Never touches the network.
    fn is_configured(&self) -> bool;
}

/// Replaces the supported placeholders in `text` with candidate and position data.
pub fn render_placeholders(
    text: &str,
    candidate: &Candidate,
    position: &Position,
    company_name: &str,
) -> String {
    text.replace("{{nome}}", &candidate.name)
        .replace("{{email}}", &candidate.email)
        .replace("{{telefono}}", &candidate.phone)
        .replace("{{citta}}", &candidate.city)
        .replace("{{posizione}}", &position.name)
        .replace("{{calendly_link}}", &position.calendly_link)
        .replace("{{azienda}}", company_name)
}

pub fn compose_message(
    candidate: &Candidate,
    template: &EmailTemplate,
    position: &Position,
    settings: &OutreachSettings,
) -> OutboundMessage {
    OutboundMessage {
        from: settings.sender(),
        to: candidate.email.clone(),
        subject: render_placeholders(&template.subject, candidate, position, &settings.company_name),
        html_body: render_placeholders(&template.body, candidate, position, &settings.company_name),
    }
}

const DEFAULT_INVITATION_BODY: &str = r#"<div style="font-family: 'Segoe UI', Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <div style="text-align: center; padding: 20px 0; border-bottom: 3px solid #4263eb;">
    <h1 style="color: #4263eb; margin: 0;">{{azienda}}</h1>
  </div>
  <div style="padding: 30px 0;">
    <p>Gentile <strong>{{nome}}</strong>,</p>
    <p>Grazie per aver completato il questionario di candidatura per la posizione di <strong>{{posizione}}</strong> presso {{azienda}}.</p>
    <p>Siamo lieti di comunicarti che il tuo profilo ha superato la fase di pre-screening e vorremmo invitarti a fissare un colloquio conoscitivo con il nostro team.</p>
    <p>Per fissare il tuo appuntamento, clicca sul pulsante qui sotto e scegli la data e l'orario che preferisci:</p>
    <div style="text-align: center; padding: 25px 0;">
      <a href="{{calendly_link}}" style="background-color: #4263eb; color: white; padding: 14px 35px; text-decoration: none; border-radius: 8px; font-weight: bold; font-size: 16px; display: inline-block;">Prenota il tuo Colloquio</a>
    </div>
    <p>Se hai domande prima del colloquio, non esitare a rispondere a questa email.</p>
    <p>A presto,<br><strong>Team HR - {{azienda}}</strong></p>
  </div>
</div>"#;

pub fn default_invitation_template(position_id: PositionId, now: DateTime<Utc>) -> EmailTemplate {
    EmailTemplate {
        id: DEFAULT_TEMPLATE_ID.to_string(),
        name: "Invito Colloquio - Appointment Setter".to_string(),
        subject: "{{azienda}} - Invito al colloquio per {{posizione}}".to_string(),
        body: DEFAULT_INVITATION_BODY.to_string(),
        position_id,
        is_default: true,
        created_at: now,
        updated_at: now,
    }
}
