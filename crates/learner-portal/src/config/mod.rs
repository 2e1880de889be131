use chrono::{NaiveDate, NaiveDateTime};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Last instant at which new applications are accepted when nothing else is configured.
pub const DEFAULT_CLOSING_DATE: (i32, u32, u32) = (2026, 3, 30);
pub const DEFAULT_COOLDOWN_MONTHS: u32 = 5;
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

const CLOSES_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

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
    pub enrolment: EnrolmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            enrolment: EnrolmentConfig::from_env()?,
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
}

/// Intake window and upload limits for new enrolment applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolmentConfig {
    pub closes_at: NaiveDateTime,
    pub cooldown_months: u32,
    pub max_document_bytes: u64,
}

impl Default for EnrolmentConfig {
    fn default() -> Self {
        let (year, month, day) = DEFAULT_CLOSING_DATE;
        let closes_at = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .unwrap_or(NaiveDateTime::MAX);

        Self {
            closes_at,
            cooldown_months: DEFAULT_COOLDOWN_MONTHS,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl EnrolmentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let closes_at = match env::var("ENROLMENT_CLOSES_AT") {
            Ok(raw) => parse_closes_at(&raw).ok_or(ConfigError::InvalidClosingDate(raw))?,
            Err(_) => defaults.closes_at,
        };

        let cooldown_months = match env::var("ENROLMENT_COOLDOWN_MONTHS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidCooldown)?,
            Err(_) => defaults.cooldown_months,
        };

        let max_document_bytes = match env::var("ENROLMENT_MAX_DOCUMENT_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::InvalidDocumentLimit)?,
            Err(_) => defaults.max_document_bytes,
        };

        Ok(Self {
            closes_at,
            cooldown_months,
            max_document_bytes,
        })
    }
}

/// Accepts a full timestamp or a bare date, which closes at the end of that day.
fn parse_closes_at(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, CLOSES_AT_FORMAT) {
        return Some(timestamp);
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidClosingDate(String),
    InvalidCooldown,
    InvalidDocumentLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidClosingDate(raw) => write!(
                f,
                "ENROLMENT_CLOSES_AT must be YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD (found '{raw}')"
            ),
            ConfigError::InvalidCooldown => {
                write!(f, "ENROLMENT_COOLDOWN_MONTHS must be a whole number of months")
            }
            ConfigError::InvalidDocumentLimit => {
                write!(f, "ENROLMENT_MAX_DOCUMENT_BYTES must be a positive byte count")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidClosingDate(_)
            | ConfigError::InvalidCooldown
            | ConfigError::InvalidDocumentLimit => None,
        }
    }
}
