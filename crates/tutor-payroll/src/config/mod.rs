use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEVELOPMENT_ADMIN_SECRET: &str = "development-admin-secret";

/// West Africa Time, the zone the tutoring business operates in.
const DEFAULT_REFERENCE_OFFSET_MINUTES: i32 = 60;
const MAX_REFERENCE_OFFSET_MINUTES: i32 = 18 * 60;

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
    pub admin: AdminConfig,
    pub payroll: PayrollPolicy,
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

        let admin = match env::var("APP_ADMIN_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => AdminConfig {
                secret,
                is_development_default: false,
            },
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingAdminSecret)
            }
            _ => AdminConfig {
                secret: DEVELOPMENT_ADMIN_SECRET.to_string(),
                is_development_default: true,
            },
        };

        let offset_minutes = match env::var("APP_REFERENCE_UTC_OFFSET_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidReferenceOffset { value: raw.clone() })?,
            Err(_) => DEFAULT_REFERENCE_OFFSET_MINUTES,
        };
        let payroll = PayrollPolicy::with_offset_minutes(offset_minutes).ok_or(
            ConfigError::InvalidReferenceOffset {
                value: offset_minutes.to_string(),
            },
        )?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            admin,
            payroll,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Shared credential guarding the admin endpoints.
#[derive(Clone)]
pub struct AdminConfig {
    pub secret: String,
    pub is_development_default: bool,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("secret", &"<redacted>")
            .field("is_development_default", &self.is_development_default)
            .finish()
    }
}

/// Business-calendar settings shared by the record validator and the report aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayrollPolicy {
    reference_offset: FixedOffset,
}

impl PayrollPolicy {
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        if minutes.abs() > MAX_REFERENCE_OFFSET_MINUTES {
            return None;
        }
        FixedOffset::east_opt(minutes * 60).map(|reference_offset| Self { reference_offset })
    }

    /// Offset used to decide which calendar day an instant belongs to.
    pub fn reference_offset(&self) -> FixedOffset {
        self.reference_offset
    }
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self::with_offset_minutes(DEFAULT_REFERENCE_OFFSET_MINUTES).unwrap_or(Self {
            reference_offset: Utc.fix(),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingAdminSecret,
    InvalidReferenceOffset { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingAdminSecret => {
                write!(f, "APP_ADMIN_SECRET must be set in production")
            }
            ConfigError::InvalidReferenceOffset { value } => write!(
                f,
                "APP_REFERENCE_UTC_OFFSET_MINUTES must be whole minutes within +/-1080 (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingAdminSecret
            | ConfigError::InvalidReferenceOffset { .. } => None,
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

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_ADMIN_SECRET");
        env::remove_var("APP_REFERENCE_UTC_OFFSET_MINUTES");
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
        assert!(config.admin.is_development_default);
        assert_eq!(
            config.payroll.reference_offset().local_minus_utc(),
            DEFAULT_REFERENCE_OFFSET_MINUTES * 60
        );
    }

    #[test]
    fn production_requires_admin_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::MissingAdminSecret)
        ));

        env::set_var("APP_ADMIN_SECRET", "s3cret");
        let config = AppConfig::load().expect("config loads with secret");
        assert_eq!(config.admin.secret, "s3cret");
        assert!(!config.admin.is_development_default);
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_reference_offset() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_REFERENCE_UTC_OFFSET_MINUTES", "1500");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidReferenceOffset { .. })
        ));

        env::set_var("APP_REFERENCE_UTC_OFFSET_MINUTES", "west africa");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidReferenceOffset { .. })
        ));
        reset_env();
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
    fn admin_secret_is_redacted_in_debug_output() {
        let admin = AdminConfig {
            secret: "hunter2".to_string(),
            is_development_default: false,
        };
        assert!(!format!("{admin:?}").contains("hunter2"));
    }
}
