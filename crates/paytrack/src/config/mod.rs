use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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

    /// Built-in sample records are never served in production.
    pub fn allows_sample_records(self) -> bool {
        !matches!(self, Self::Production)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
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

        let dir = env::var("APP_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let upcoming_window_days = match env::var("APP_UPCOMING_WINDOW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidUpcomingWindow)?,
            Err(_) => DashboardConfig::DEFAULT_UPCOMING_WINDOW_DAYS,
        };

        let score_lookback_days = match env::var("APP_SCORE_LOOKBACK_DAYS") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidScoreLookback)?,
            ),
            _ => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig { dir },
            dashboard: DashboardConfig {
                upcoming_window_days,
                score_lookback_days,
            },
        })
    }

    /// Checks that a data directory is configured wherever sample records are
    /// not allowed. Call after applying command-line overrides.
    pub fn ensure_data_source(&self) -> Result<(), ConfigError> {
        if self.data.dir.is_none() && !self.environment.allows_sample_records() {
            return Err(ConfigError::MissingDataDir);
        }
        Ok(())
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

/// Where client, order and payment exports live. `None` selects the
/// built-in sample records.
#[derive(Debug, Clone, Default)]
pub struct DataConfig {
    pub dir: Option<PathBuf>,
}

/// Knobs for dashboard assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub upcoming_window_days: u32,
    /// Limits the payments feeding trust scores to those due within the
    /// last N days.
    pub score_lookback_days: Option<u32>,
}

impl DashboardConfig {
    pub const DEFAULT_UPCOMING_WINDOW_DAYS: u32 = 14;
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            upcoming_window_days: Self::DEFAULT_UPCOMING_WINDOW_DAYS,
            score_lookback_days: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUpcomingWindow,
    InvalidScoreLookback,
    MissingDataDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUpcomingWindow => {
                write!(f, "APP_UPCOMING_WINDOW_DAYS must be a non-negative integer")
            }
            ConfigError::InvalidScoreLookback => {
                write!(f, "APP_SCORE_LOOKBACK_DAYS must be a non-negative integer")
            }
            ConfigError::MissingDataDir => {
                write!(f, "APP_DATA_DIR is required when APP_ENV is production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidUpcomingWindow
            | ConfigError::InvalidScoreLookback
            | ConfigError::MissingDataDir => None,
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
        env::remove_var("APP_DATA_DIR");
        env::remove_var("APP_UPCOMING_WINDOW_DAYS");
        env::remove_var("APP_SCORE_LOOKBACK_DAYS");
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
        assert!(config.data.dir.is_none());
        assert_eq!(config.dashboard, DashboardConfig::default());
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
    fn reads_data_and_dashboard_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_DATA_DIR", "/var/lib/paytrack");
        env::set_var("APP_UPCOMING_WINDOW_DAYS", "30");
        env::set_var("APP_SCORE_LOOKBACK_DAYS", "180");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.data.dir, Some(PathBuf::from("/var/lib/paytrack")));
        assert_eq!(config.dashboard.upcoming_window_days, 30);
        assert_eq!(config.dashboard.score_lookback_days, Some(180));
        reset_env();
    }

    #[test]
    fn production_requires_a_data_dir() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        let mut config = AppConfig::load().expect("config loads");
        assert!(matches!(
            config.ensure_data_source(),
            Err(ConfigError::MissingDataDir)
        ));

        config.data.dir = Some(PathBuf::from("/srv/exports"));
        assert!(config.ensure_data_source().is_ok());
        reset_env();

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert!(config.ensure_data_source().is_ok());
    }

    #[test]
    fn rejects_invalid_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "not-a-port");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPort)));
        reset_env();

        env::set_var("APP_UPCOMING_WINDOW_DAYS", "-3");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidUpcomingWindow)
        ));
        reset_env();
    }
}
