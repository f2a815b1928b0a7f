//! Application-level configuration loading: admin access, rate limiting and quiz defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCADE_QUIZ_CONFIG_PATH";
/// Environment variable overriding the admin access code.
const ADMIN_CODE_ENV: &str = "ADMIN_ACCESS_CODE";
/// Environment variable naming the deployment environment (`development` exposes error details).
const APP_ENV: &str = "APP_ENV";
/// Environment variable selecting the storage backend.
const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";

const DEFAULT_ADMIN_CODE: &str = "techteammode";
const DEFAULT_RATE_WINDOW_SECS: u64 = 15 * 60;
const DEFAULT_RATE_MAX_REQUESTS: u32 = 100;
const DEFAULT_TIME_LIMIT_SECS: u32 = 300;
const DEFAULT_GENERATION_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Shared secret granting the admin pseudo-mode and the admin API.
    pub admin_access_code: String,
    /// When set, `/admin/*` requires the `x-admin-code` header.
    pub require_admin_header: bool,
    /// Length of one rate limiting window.
    pub rate_limit_window: Duration,
    /// Requests allowed per caller within one window.
    pub rate_limit_max_requests: u32,
    /// Quiz time limit used when no timer settings have been stored.
    pub default_time_limit_secs: u32,
    /// Artificial delay applied by the question generator.
    pub question_generation_delay: Duration,
    /// Development mode exposes internal error messages to clients.
    pub development: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        rate_limit_max_requests = app_config.rate_limit_max_requests,
                        "loaded configuration file"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(code) = non_empty_env(ADMIN_CODE_ENV) {
            self.admin_access_code = code;
        }
        if let Some(environment) = non_empty_env(APP_ENV) {
            self.development = environment.eq_ignore_ascii_case("development");
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    admin: RawAdmin,
    rate_limit: RawRateLimit,
    quiz: RawQuiz,
    development: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawAdmin {
    access_code: String,
    require_header: bool,
}

impl Default for RawAdmin {
    fn default() -> Self {
        Self {
            access_code: DEFAULT_ADMIN_CODE.to_owned(),
            require_header: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawRateLimit {
    window_secs: u64,
    max_requests: u32,
}

impl Default for RawRateLimit {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_RATE_WINDOW_SECS,
            max_requests: DEFAULT_RATE_MAX_REQUESTS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawQuiz {
    default_time_limit_secs: u32,
    generation_delay_ms: u64,
}

impl Default for RawQuiz {
    fn default() -> Self {
        Self {
            default_time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            generation_delay_ms: DEFAULT_GENERATION_DELAY_MS,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            admin_access_code: value.admin.access_code,
            require_admin_header: value.admin.require_header,
            rate_limit_window: Duration::from_secs(value.rate_limit.window_secs.max(1)),
            rate_limit_max_requests: value.rate_limit.max_requests,
            default_time_limit_secs: value.quiz.default_time_limit_secs,
            question_generation_delay: Duration::from_millis(value.quiz.generation_delay_ms),
            development: value.development,
        }
    }
}

/// Storage backend the server connects to at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// MongoDB (`MONGO_URI`, `MONGO_DB`).
    Mongo,
    /// CouchDB (`COUCH_BASE_URL`, `COUCH_DB`, optional credentials).
    Couch,
    /// Process-local maps; data is lost on restart.
    Memory,
}

impl StorageBackend {
    /// Read [`STORAGE_BACKEND_ENV`], defaulting to MongoDB.
    pub fn from_env() -> Self {
        match non_empty_env(STORAGE_BACKEND_ENV) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!(value = %value, "unknown storage backend; using mongo");
                StorageBackend::Mongo
            }),
            None => StorageBackend::Mongo,
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "couch" | "couchdb" => Ok(StorageBackend::Couch),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(other.to_owned()),
        }
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_event_settings() {
        let config = AppConfig::default();
        assert_eq!(config.admin_access_code, "techteammode");
        assert!(config.require_admin_header);
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.default_time_limit_secs, 300);
        assert!(!config.development);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"rateLimit":{"maxRequests":5},"development":true}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.rate_limit_max_requests, 5);
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert_eq!(config.admin_access_code, "techteammode");
        assert!(config.development);
    }

    #[test]
    fn storage_backend_names() {
        assert_eq!("MongoDB".parse(), Ok(StorageBackend::Mongo));
        assert_eq!("couch".parse(), Ok(StorageBackend::Couch));
        assert_eq!("memory".parse(), Ok(StorageBackend::Memory));
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
