//! SMTP relay delivery for invitation emails.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, warn};

use super::outreach::{MessageTransport, OutboundMessage, TransportError};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Implicit TLS from the first byte. When false the relay must offer STARTTLS.
    pub secure: bool,
}

/// Delivers messages through a blocking SMTP connection.
pub struct SmtpMessageTransport {
    mailer: SmtpTransport,
    host: String,
}

impl SmtpMessageTransport {
    /// Builds the relay client. No connection is opened until the first delivery.
    pub fn new(settings: &SmtpSettings) -> Result<Self, TransportError> {
        let builder = if settings.secure {
            SmtpTransport::relay(&settings.host)
        } else {
            SmtpTransport::starttls_relay(&settings.host)
        };
        let builder = builder.map_err(|err| TransportError::Unavailable(err.to_string()))?;

        let mut builder = builder.port(settings.port).timeout(Some(SMTP_TIMEOUT));
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            host: settings.host.clone(),
        })
    }
}

pub(crate) fn build_message(message: &OutboundMessage) -> Result<Message, TransportError> {
    let rejected = |reason: String| TransportError::Rejected {
        recipient: message.to.clone(),
        reason,
    };

    let from: Mailbox = message
        .from
        .parse()
        .map_err(|err| rejected(format!("invalid sender '{}': {err}", message.from)))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|err| rejected(format!("invalid address: {err}")))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(message.html_body.clone())
        .map_err(|err| rejected(err.to_string()))
}

impl MessageTransport for SmtpMessageTransport {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let email = build_message(message)?;

        match self.mailer.send(&email) {
            Ok(response) => {
                debug!(recipient = %message.to, code = %response.code(), "relay accepted message");
                Ok(())
            }
            Err(err) if err.is_permanent() => Err(TransportError::Rejected {
                recipient: message.to.clone(),
                reason: err.to_string(),
            }),
            Err(err) => {
                warn!(host = %self.host, error = %err, "smtp relay unavailable");
                Err(TransportError::Unavailable(err.to_string()))
            }
        }
    }

    fn verify(&self) -> Result<(), TransportError> {
        match self.mailer.test_connection() {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Unavailable(format!(
                "{} did not accept the connection",
                self.host
            ))),
            Err(err) => Err(TransportError::Unavailable(err.to_string())),
        }
    }

    fn is_configured(&self) -> bool {
        true
    }
}
