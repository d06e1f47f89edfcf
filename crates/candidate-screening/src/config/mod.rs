use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::screening::{OutreachSettings, PositionDefaults, SmtpSettings};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub sheets: SheetsConfig,
    pub outreach: OutreachConfig,
    /// `None` when `SMTP_HOST` is unset; outreach then fails with a configuration error.
    pub smtp: Option<SmtpSettings>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let bulk_delay_ms = var_or("EMAIL_BULK_DELAY_MS", "1000")
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidBulkDelay)?;

        let smtp_port = var_or("SMTP_PORT", "587")
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidSmtpPort)?;
        let smtp_user = optional_var("SMTP_USER");
        let smtp = optional_var("SMTP_HOST").map(|host| SmtpSettings {
            host,
            port: smtp_port,
            username: smtp_user.clone(),
            password: optional_var("SMTP_PASSWORD"),
            secure: var_or("SMTP_SECURE", "false").trim().eq_ignore_ascii_case("true"),
        });

        let position_defaults = PositionDefaults::default();
        let outreach_defaults = OutreachSettings::default();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from(var_or("APP_DATA_DIR", "data")),
            },
            sheets: SheetsConfig {
                export_dir: PathBuf::from(var_or("SHEETS_EXPORT_DIR", "sheets")),
                default_sheet_id: optional_var("GOOGLE_SHEET_ID").unwrap_or_default(),
                default_sheet_name: optional_var("GOOGLE_SHEET_NAME")
                    .unwrap_or(position_defaults.sheet_name),
                calendly_link: optional_var("CALENDLY_LINK")
                    .unwrap_or(position_defaults.calendly_link),
            },
            outreach: OutreachConfig {
                from_name: optional_var("EMAIL_FROM_NAME").unwrap_or(outreach_defaults.from_name),
                from_address: optional_var("EMAIL_FROM_ADDRESS").or(smtp_user),
                company_name: optional_var("COMPANY_NAME")
                    .unwrap_or(outreach_defaults.company_name),
                bulk_delay: Duration::from_millis(bulk_delay_ms),
            },
            smtp,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Where the JSON collections live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Spreadsheet export location and the values used to seed the default position.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub export_dir: PathBuf,
    pub default_sheet_id: String,
    pub default_sheet_name: String,
    pub calendly_link: String,
}

impl SheetsConfig {
    pub fn position_defaults(&self) -> PositionDefaults {
        PositionDefaults {
            sheet_id: self.default_sheet_id.clone(),
            sheet_name: self.default_sheet_name.clone(),
            calendly_link: self.calendly_link.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutreachConfig {
    pub from_name: String,
    pub from_address: Option<String>,
    pub company_name: String,
    pub bulk_delay: Duration,
}

impl OutreachConfig {
    pub fn settings(&self) -> OutreachSettings {
        OutreachSettings {
            from_name: self.from_name.clone(),
            from_address: self.from_address.clone(),
            company_name: self.company_name.clone(),
            bulk_delay: self.bulk_delay,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBulkDelay,
    InvalidSmtpPort,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBulkDelay => {
                write!(f, "EMAIL_BULK_DELAY_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidBulkDelay
            | ConfigError::InvalidSmtpPort => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    const KEYS: [&str; 18] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "APP_DATA_DIR",
        "SHEETS_EXPORT_DIR",
        "GOOGLE_SHEET_ID",
        "GOOGLE_SHEET_NAME",
        "CALENDLY_LINK",
        "EMAIL_FROM_NAME",
        "EMAIL_FROM_ADDRESS",
        "COMPANY_NAME",
        "EMAIL_BULK_DELAY_MS",
        "SMTP_HOST",
        "SMTP_PORT",
        "SMTP_USER",
        "SMTP_PASSWORD",
        "SMTP_SECURE",
    ];

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.sheets.export_dir, PathBuf::from("sheets"));
        assert_eq!(config.outreach.bulk_delay, Duration::from_millis(1000));
        assert_eq!(config.smtp, None);
        assert_eq!(
            config.sheets.position_defaults(),
            PositionDefaults::default()
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn outreach_and_sheet_values_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GOOGLE_SHEET_ID", "sheet-42");
        env::set_var("CALENDLY_LINK", "https://calendly.com/hr/intro");
        env::set_var("EMAIL_FROM_ADDRESS", "hr@example.com");
        env::set_var("COMPANY_NAME", "ACME Academy");
        env::set_var("EMAIL_BULK_DELAY_MS", "250");

        let config = AppConfig::load().expect("config loads");
        let defaults = config.sheets.position_defaults();
        assert_eq!(defaults.sheet_id, "sheet-42");
        assert_eq!(defaults.calendly_link, "https://calendly.com/hr/intro");

        let settings = config.outreach.settings();
        assert_eq!(settings.company_name, "ACME Academy");
        assert_eq!(settings.sender(), "\"Leone Master School - HR\" <hr@example.com>");
        assert_eq!(settings.bulk_delay, Duration::from_millis(250));
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_bulk_delay() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EMAIL_BULK_DELAY_MS", "soon");
        let err = AppConfig::load().expect_err("invalid delay");
        assert!(matches!(err, ConfigError::InvalidBulkDelay));
        reset_env();
    }

    #[test]
    fn smtp_relay_is_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_HOST", "smtp.example.com");
        env::set_var("SMTP_PORT", "465");
        env::set_var("SMTP_USER", "hr@example.com");
        env::set_var("SMTP_PASSWORD", "app-password");
        env::set_var("SMTP_SECURE", "true");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.smtp,
            Some(SmtpSettings {
                host: "smtp.example.com".to_string(),
                port: 465,
                username: Some("hr@example.com".to_string()),
                password: Some("app-password".to_string()),
                secure: true,
            })
        );
        // sender falls back to the relay account
        assert_eq!(
            config.outreach.settings().sender(),
            "\"Leone Master School - HR\" <hr@example.com>"
        );
        reset_env();
    }

    #[test]
    fn smtp_defaults_to_starttls_on_587() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_HOST", "smtp.example.com");
        let smtp = AppConfig::load()
            .expect("config loads")
            .smtp
            .expect("relay configured");
        assert_eq!(smtp.port, 587);
        assert!(!smtp.secure);
        assert_eq!(smtp.username, None);
        reset_env();
    }

    #[test]
    fn rejects_invalid_smtp_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_PORT", "smtp");
        let err = AppConfig::load().expect_err("invalid smtp port");
        assert!(matches!(err, ConfigError::InvalidSmtpPort));
        reset_env();
    }
}
