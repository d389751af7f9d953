use std::env;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;

const DEFAULT_ADMIN_SECRET: &str = "admin2024";
const DEFAULT_FIRST_YEAR: i32 = 2020;
const DEFAULT_LAST_YEAR: i32 = 2050;

/// Distinguishes runtime behavior for different stages of the tool.
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
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub admin: AdminConfig,
    pub calendar: CalendarConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir = env::var("APP_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let secret =
            env::var("APP_ADMIN_SECRET").unwrap_or_else(|_| DEFAULT_ADMIN_SECRET.to_string());
        if secret.trim().is_empty() {
            return Err(ConfigError::EmptyAdminSecret);
        }

        let first_year = parse_year("APP_FIRST_YEAR", DEFAULT_FIRST_YEAR)?;
        let last_year = parse_year("APP_LAST_YEAR", DEFAULT_LAST_YEAR)?;
        if first_year > last_year {
            return Err(ConfigError::InvalidYearRange {
                first: first_year,
                last: last_year,
            });
        }

        Ok(Self {
            environment,
            storage: StorageConfig {
                data_dir: PathBuf::from(data_dir),
            },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            admin: AdminConfig { secret },
            calendar: CalendarConfig {
                first_year,
                last_year,
            },
        })
    }
}

fn parse_year(key: &'static str, default: i32) -> Result<i32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i32>()
            .map_err(|_| ConfigError::InvalidYear { key }),
        Err(_) => Ok(default),
    }
}

/// Where the dossier snapshot and uploaded blobs live on disk.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("dossiers.json")
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

/// Tracing controls. Colours are only used in development.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Shared secret guarding the administration commands.
#[derive(Clone)]
pub struct AdminConfig {
    pub secret: String,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Fiscal years offered for selection and listed in the admin overview.
#[derive(Debug, Clone, Copy)]
pub struct CalendarConfig {
    pub first_year: i32,
    pub last_year: i32,
}

impl CalendarConfig {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyAdminSecret,
    InvalidYear { key: &'static str },
    InvalidYearRange { first: i32, last: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyAdminSecret => write!(f, "APP_ADMIN_SECRET must not be empty"),
            ConfigError::InvalidYear { key } => write!(f, "{key} must be a valid year"),
            ConfigError::InvalidYearRange { first, last } => write!(
                f,
                "APP_FIRST_YEAR ({first}) must not be after APP_LAST_YEAR ({last})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
