use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::update::source::AuthConfig;
use crate::update::target::{TargetMap, TargetSource};

// =============================================================================
// Remote constants
// =============================================================================

/// Default base URL for the GitHub API
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// User agent sent with every request
pub const USER_AGENT: &str = "plugin-updater";

/// Timeout for each remote request in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Extension of installable assets when no asset name override is set
pub const DEFAULT_ASSET_EXTENSION: &str = ".dll";

// =============================================================================
// Schedule constants
// =============================================================================

/// Default hours between scheduled update checks
pub const DEFAULT_CHECK_INTERVAL_HOURS: f64 = 12.0;

/// Scheduled checks never run more often than this
pub const MIN_CHECK_INTERVAL_HOURS: f64 = 1.0;

/// Scheduled checks never wait longer than one year
pub const MAX_CHECK_INTERVAL_HOURS: f64 = 24.0 * 365.0;

// =============================================================================
// Reporting constants
// =============================================================================

/// Inner width of the console summary box, borders excluded
pub const SUMMARY_WIDTH: usize = 80;

const APP_NAME: &str = "plugin-updater";
const SETTINGS_FILE: &str = "settings.json";
const REPOSITORIES_FILE: &str = "repositories.json";
const GITHUB_FILE: &str = "github.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read or write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Updater settings, read from `settings.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub debug: bool,
    /// Path to the repositories file; relative paths resolve against the config dir
    pub repositories_config_path: PathBuf,
    /// Path to the GitHub token file; relative paths resolve against the config dir
    pub github_config_path: PathBuf,
    /// Directory holding the installed plugins and their `plugins.json` manifest
    pub plugins_dir: PathBuf,
    pub api_base_url: String,
    pub run_updater_at_start: bool,
    pub schedule_enabled: bool,
    pub check_interval_hours: f64,
    /// Upper bound on concurrently checked targets (0 = unbounded)
    pub max_concurrent_checks: usize,
    pub request_timeout_secs: u64,
    pub discord_webhook_enabled: bool,
    pub discord_webhook_url: String,
    pub webhook_username: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            repositories_config_path: PathBuf::from(REPOSITORIES_FILE),
            github_config_path: PathBuf::from(GITHUB_FILE),
            plugins_dir: PathBuf::from("plugins"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            run_updater_at_start: true,
            schedule_enabled: false,
            check_interval_hours: DEFAULT_CHECK_INTERVAL_HOURS,
            max_concurrent_checks: 0,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            discord_webhook_enabled: false,
            discord_webhook_url: String::new(),
            webhook_username: "AutoUpdate Bot".to_string(),
        }
    }
}

impl Settings {
    /// Schedule period, clamped between the minimum and maximum interval
    pub fn check_interval(&self) -> Duration {
        let hours = if self.check_interval_hours.is_finite() {
            self.check_interval_hours
                .clamp(MIN_CHECK_INTERVAL_HOURS, MAX_CHECK_INTERVAL_HOURS)
        } else {
            DEFAULT_CHECK_INTERVAL_HOURS
        };
        Duration::from_secs_f64(hours * 3600.0)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Webhook URL, only when the webhook is enabled and configured
    pub fn webhook_url(&self) -> Option<&str> {
        (self.discord_webhook_enabled && !self.discord_webhook_url.is_empty())
            .then_some(self.discord_webhook_url.as_str())
    }
}

/// Config and data locations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Paths {
    /// Default locations, optionally with an explicit config directory
    pub fn new(config_dir: Option<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.unwrap_or_else(default_config_dir),
            data_dir: data_dir(),
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.log", APP_NAME))
    }

    /// Resolve a configured path against the config directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }
}

/// Returns the config directory for plugin-updater.
/// Uses $XDG_CONFIG_HOME/plugin-updater if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/plugin-updater,
/// or ./plugin-updater if neither is available.
pub fn default_config_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
}

/// Returns the data directory for plugin-updater.
/// Uses $XDG_DATA_HOME/plugin-updater if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/plugin-updater,
/// or ./plugin-updater if neither is available.
pub fn data_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

fn dir_with_env(xdg_home: Option<String>, home_dir: Option<PathBuf>, home_suffix: &str) -> PathBuf {
    let base = xdg_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(home_suffix)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_NAME)
}

// =============================================================================
// JSON files
// =============================================================================

/// Read a JSON file, writing `default()` to it first when it does not exist.
///
/// Never fails: unreadable or unparseable files are logged and replaced by
/// the default value in memory (the file on disk is left alone).
pub fn load_or_create<T, F>(path: &Path, default: F) -> T
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    match try_load(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            let value = default();
            if let Err(e) = write_json(path, &value) {
                warn!("{}", e);
            } else {
                info!("Created default {}", path.display());
            }
            value
        }
        Err(e) => {
            error!("{}. Using default values.", e);
            default()
        }
    }
}

/// Read and parse a JSON file; `Ok(None)` when it does not exist
pub fn try_load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `value` as pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(io_err)
}

pub fn load_settings(paths: &Paths) -> Settings {
    load_or_create(&paths.settings_path(), Settings::default)
}

/// File-declared targets, freshly read on every call
pub fn load_repositories(path: &Path) -> TargetMap {
    load_or_create(path, || {
        warn!(
            "Repositories config not found. Creating an example '{}'. Please configure it.",
            path.display()
        );
        default_repositories()
    })
}

/// GitHub credentials, freshly read on every call
pub fn load_auth(path: &Path) -> AuthConfig {
    let auth = load_or_create(path, || {
        info!(
            "GitHub config not found. Creating a default '{}'. Configure a personal access token to raise the API rate limit.",
            path.display()
        );
        AuthConfig {
            enabled: false,
            token: Some("Your-GitHub-PAT-Here".to_string()),
        }
    });

    if auth.active_token().is_some() {
        tracing::debug!("GitHub token loaded and enabled.");
    } else {
        tracing::debug!("GitHub token disabled or not provided. Using unauthenticated requests.");
    }
    auth
}

fn default_repositories() -> TargetMap {
    IndexMap::from([
        (
            "SCPStats".to_string(),
            TargetSource::new("PintTheDragon", "SCPStats", None),
        ),
        (
            "AutoUpdate".to_string(),
            TargetSource::new("DiabeloDev", "AutoUpdate", Some("AutoUpdate.dll")),
        ),
        (
            "ExamplePluginWithSpecificFile".to_string(),
            TargetSource::new("YourUser", "YourRepo", Some("ExamplePlugin-Exiled.dll")),
        ),
    ])
}
