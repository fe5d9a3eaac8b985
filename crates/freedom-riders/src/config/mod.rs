use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Rider intake endpoint used when `RIDER_INTAKE_URL` is not set.
pub const DEFAULT_INTAKE_ENDPOINT: &str = "https://api-freedom.com/api/v2/riders/apply";

/// How long an untouched application form survives when `RIDER_SESSION_IDLE_SECS`
/// is not set.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

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
    pub intake: IntakeConfig,
    pub sessions: SessionConfig,
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

        let endpoint =
            env::var("RIDER_INTAKE_URL").unwrap_or_else(|_| DEFAULT_INTAKE_ENDPOINT.to_string());
        let timeout = match env::var("RIDER_INTAKE_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_seconds(&raw).ok_or(ConfigError::InvalidIntakeTimeout {
                value: raw,
            })?),
            Err(_) => None,
        };
        let intake = IntakeConfig::new(endpoint, timeout)?;

        let idle_timeout = match env::var("RIDER_SESSION_IDLE_SECS") {
            Ok(raw) => parse_seconds(&raw).ok_or(ConfigError::InvalidSessionIdle { value: raw })?,
            Err(_) => DEFAULT_SESSION_IDLE,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            intake,
            sessions: SessionConfig { idle_timeout },
        })
    }
}

fn parse_seconds(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where finished rider applications are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

impl IntakeConfig {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        let trimmed = endpoint.trim();
        reqwest::Url::parse(trimmed).map_err(|err| ConfigError::InvalidIntakeUrl {
            value: endpoint.clone(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            endpoint: trimmed.to_string(),
            timeout,
        })
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_INTAKE_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

/// Lifetime of open application forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_SESSION_IDLE,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidIntakeUrl { value: String, reason: String },
    InvalidIntakeTimeout { value: String },
    InvalidSessionIdle { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidIntakeUrl { value, reason } => {
                write!(f, "RIDER_INTAKE_URL '{value}' is not a valid URL ({reason})")
            }
            ConfigError::InvalidIntakeTimeout { value } => write!(
                f,
                "RIDER_INTAKE_TIMEOUT_SECS must be a positive number of seconds, got '{value}'"
            ),
            ConfigError::InvalidSessionIdle { value } => write!(
                f,
                "RIDER_SESSION_IDLE_SECS must be a positive number of seconds, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidIntakeUrl { .. }
            | ConfigError::InvalidIntakeTimeout { .. }
            | ConfigError::InvalidSessionIdle { .. } => None,
        }
    }
}
