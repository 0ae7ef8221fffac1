use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::hiring::{InterviewStatusWrites, LifecyclePolicy, TransitionMode};

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
    pub lifecycle: LifecyclePolicy,
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
        let include_targets = environment != AppEnvironment::Production;

        let database_path = env::var("APP_DATABASE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let lifecycle = LifecyclePolicy {
            transitions: parse_transitions(env::var("HIRING_STRICT_TRANSITIONS").ok())?,
            interview_writes: parse_interview_writes(
                env::var("HIRING_INTERVIEW_STATUS_WRITES").ok(),
            )?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                include_targets,
            },
            storage: StorageConfig { database_path },
            lifecycle,
        })
    }
}

fn parse_transitions(raw: Option<String>) -> Result<TransitionMode, ConfigError> {
    let Some(raw) = raw else {
        return Ok(TransitionMode::Lenient);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(TransitionMode::Lenient),
        "1" | "true" | "yes" => Ok(TransitionMode::Strict),
        _ => Err(ConfigError::InvalidStrictTransitions(raw)),
    }
}

fn parse_interview_writes(raw: Option<String>) -> Result<InterviewStatusWrites, ConfigError> {
    let Some(raw) = raw else {
        return Ok(InterviewStatusWrites::Legacy);
    };
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "" | "legacy" => Ok(InterviewStatusWrites::Legacy),
        "forward_only" => Ok(InterviewStatusWrites::ForwardOnly),
        _ => Err(ConfigError::InvalidInterviewWrites(raw)),
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
    pub include_targets: bool,
}

/// Where applications and interviews are persisted. `None` keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub database_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidStrictTransitions(String),
    InvalidInterviewWrites(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidStrictTransitions(value) => write!(
                f,
                "HIRING_STRICT_TRANSITIONS must be a boolean, got '{value}'"
            ),
            ConfigError::InvalidInterviewWrites(value) => write!(
                f,
                "HIRING_INTERVIEW_STATUS_WRITES must be 'legacy' or 'forward_only', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidStrictTransitions(_)
            | ConfigError::InvalidInterviewWrites(_) => None,
        }
    }
}
