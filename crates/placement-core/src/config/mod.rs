use std::env;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_NOTIFICATION_BUFFER: usize = 64;

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

    /// Log filter used when neither `APP_LOG_LEVEL` nor `RUST_LOG` is set.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Test => "warn",
            Self::Production => "info",
        }
    }
}

/// Top-level configuration for the placement tooling.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub notifications: NotificationConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL")
            .unwrap_or_else(|_| environment.default_log_level().to_string());
        let ansi = env::var("APP_LOG_ANSI")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        let buffer = match env::var("PLACEMENT_NOTIFICATION_BUFFER") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidNotificationBuffer { value: raw })?,
            Err(_) => DEFAULT_NOTIFICATION_BUFFER,
        };

        let data = DataConfig {
            students_csv: optional_path("PLACEMENT_STUDENTS_CSV"),
            drives_csv: optional_path("PLACEMENT_DRIVES_CSV"),
            applications_csv: optional_path("PLACEMENT_APPLICATIONS_CSV"),
            expected_companies_csv: optional_path("PLACEMENT_EXPECTED_COMPANIES_CSV"),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level, ansi },
            notifications: NotificationConfig { buffer },
            data,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Sizing for the asynchronous notification queue.
#[derive(Debug, Clone, Copy)]
pub struct NotificationConfig {
    pub buffer: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_NOTIFICATION_BUFFER,
        }
    }
}

/// Default roster locations used when the CLI is not given explicit paths.
#[derive(Debug, Clone, Default)]
pub struct DataConfig {
    pub students_csv: Option<PathBuf>,
    pub drives_csv: Option<PathBuf>,
    pub applications_csv: Option<PathBuf>,
    pub expected_companies_csv: Option<PathBuf>,
}

fn optional_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNotificationBuffer { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNotificationBuffer { value } => write!(
                f,
                "PLACEMENT_NOTIFICATION_BUFFER must be a positive integer (got '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
