use candidate_screening::workflows::screening::{
    MessageTransport, OutboundMessage, SmtpMessageTransport, SmtpSettings, TransportError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Outreach channel chosen at startup. Without a relay every delivery fails
/// with `NotConfigured`, so contacts are logged as failed rather than sent.
pub(crate) enum OutboundMailer {
    Smtp(SmtpMessageTransport),
    Disabled,
}

impl OutboundMailer {
    pub(crate) fn from_settings(settings: Option<&SmtpSettings>) -> Result<Self, TransportError> {
        match settings {
            Some(settings) => {
                info!(host = %settings.host, port = settings.port, secure = settings.secure, "smtp relay configured");
                Ok(Self::Smtp(SmtpMessageTransport::new(settings)?))
            }
            None => {
                warn!("SMTP_HOST not set, invitation emails are disabled");
                Ok(Self::Disabled)
            }
        }
    }
}

impl MessageTransport for OutboundMailer {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        match self {
            Self::Smtp(transport) => transport.deliver(message),
            Self::Disabled => Err(TransportError::NotConfigured),
        }
    }

    fn verify(&self) -> Result<(), TransportError> {
        match self {
            Self::Smtp(transport) => transport.verify(),
            Self::Disabled => Err(TransportError::NotConfigured),
        }
    }

    fn is_configured(&self) -> bool {
        matches!(self, Self::Smtp(_))
    }
}
