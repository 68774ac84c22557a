use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};
use crate::models::TransactionConflictPolicy;

/// Start of the default transaction window (2001-01-01).
pub const DEFAULT_START_DATE: i64 = 978_360_153;

pub const DEFAULT_CONFIG_FILE: &str = "budget-tool.toml";

/// A point in time for the SimpleFIN query window, in epoch seconds.
///
/// Accepts an integer epoch, `YYYY-MM-DD`, or `YYYYMMDD` (dates are taken at
/// midnight UTC). Any other all-digit string is read as an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryDate", into = "i64")]
pub struct QueryDate(i64);

impl QueryDate {
    pub fn from_epoch(epoch: i64) -> Self {
        Self(epoch)
    }

    pub fn epoch(&self) -> i64 {
        self.0
    }
}

impl Default for QueryDate {
    fn default() -> Self {
        Self(DEFAULT_START_DATE)
    }
}

impl FromStr for QueryDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let all_digits = !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

        if all_digits && s.len() == 8 {
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                return Ok(Self::from(date));
            }
        }
        if all_digits || s.starts_with('-') {
            let epoch = s
                .parse::<i64>()
                .with_context(|| format!("Invalid epoch timestamp: {s:?}"))?;
            return Ok(Self(epoch));
        }

        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date {s:?}: expected epoch, YYYY-MM-DD or YYYYMMDD"))?;
        Ok(Self::from(date))
    }
}

impl From<NaiveDate> for QueryDate {
    fn from(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp())
    }
}

impl From<QueryDate> for i64 {
    fn from(value: QueryDate) -> Self {
        value.0
    }
}

impl fmt::Display for QueryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::from_timestamp(self.0, 0) {
            Some(dt) => write!(f, "{} ({})", self.0, dt.format("%Y-%m-%d")),
            None => write!(f, "{}", self.0),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQueryDate {
    Epoch(i64),
    Text(String),
}

impl TryFrom<RawQueryDate> for QueryDate {
    type Error = String;

    fn try_from(raw: RawQueryDate) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawQueryDate::Epoch(epoch) => Ok(Self(epoch)),
            RawQueryDate::Text(text) => text.parse().map_err(|e: anyhow::Error| e.to_string()),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> Duration {
    Duration::from_secs(1)
}

/// SimpleFIN request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleFinConfig {
    /// Earliest transaction date requested.
    pub start_date: QueryDate,

    /// Latest transaction date requested; open-ended when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<QueryDate>,

    /// Per-request timeout.
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,

    /// Retries for connection failures and 429/5xx responses.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries, doubled after each attempt.
    #[serde(
        default = "default_retry_backoff",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub retry_backoff: Duration,
}

impl Default for SimpleFinConfig {
    fn default() -> Self {
        Self {
            start_date: QueryDate::default(),
            end_date: None,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

/// Accounts that are persisted during a sync.
///
/// An account is tracked when its display name is in `names` or its
/// provider ID is in `ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackedAccounts {
    pub names: Vec<String>,
    pub ids: Vec<String>,
}

impl TrackedAccounts {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ids: Vec::new(),
        }
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Behavior when a known transaction ID shows up again.
    pub transaction_conflict: TransactionConflictPolicy,
}

/// Display/output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Round amounts to this many decimal places when printing.
    pub currency_decimals: Option<u32>,

    /// Render amounts with thousands separators.
    pub currency_grouping: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_decimals: Some(2),
            currency_grouping: true,
        }
    }
}

fn default_busy_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Application configuration as written in the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for the database and snapshot. If relative, resolved from
    /// the config file location; defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// SQLite database file. Defaults to `<data_dir>/budget.db`.
    pub database_path: Option<PathBuf>,

    /// SimpleFIN snapshot file. Defaults to `<data_dir>/simplefin.json`.
    pub cache_path: Option<PathBuf>,

    /// How long a query waits on a locked database.
    #[serde(
        default = "default_busy_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub busy_timeout: Duration,

    /// Bridge access URL. Prefer the `ACCESS_URL` environment variable.
    #[serde(skip_serializing)]
    pub access_url: Option<String>,

    pub simplefin: SimpleFinConfig,

    pub tracked: TrackedAccounts,

    pub sync: SyncConfig,

    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_path: None,
            cache_path: None,
            busy_timeout: default_busy_timeout(),
            access_url: None,
            simplefin: SimpleFinConfig::default(),
            tracked: TrackedAccounts::default(),
            sync: SyncConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// `lookup` is usually `std::env::var(..).ok()`; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ACCESS_URL").filter(|v| !v.trim().is_empty()) {
            self.access_url = Some(url);
        }

        if let Some(raw) = lookup("TRACKED_ACCOUNTS") {
            self.tracked.names = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(raw) = lookup("START_DATE") {
            self.simplefin.start_date = raw
                .parse()
                .context("Invalid START_DATE environment variable")?;
        }

        if let Some(path) = lookup("BUDGET_TOOL_DB") {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("BUDGET_TOOL_CACHE") {
            self.cache_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Resolve the data directory path.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }

    fn resolve(self, config_dir: &Path) -> ResolvedConfig {
        let data_dir = self.resolve_data_dir(config_dir);
        let resolve_file = |path: Option<PathBuf>, default: &str| match path {
            Some(p) if p.is_absolute() => p,
            Some(p) => config_dir.join(p),
            None => data_dir.join(default),
        };

        ResolvedConfig {
            database_path: resolve_file(self.database_path, "budget.db"),
            cache_path: resolve_file(self.cache_path, "simplefin.json"),
            data_dir,
            busy_timeout: self.busy_timeout,
            access_url: self.access_url.map(SecretString::from),
            simplefin: self.simplefin,
            tracked: self.tracked,
            sync: self.sync,
            display: self.display,
        }
    }
}

/// Loaded configuration with resolved paths and environment applied.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub cache_path: PathBuf,
    pub busy_timeout: Duration,
    pub access_url: Option<SecretString>,
    pub simplefin: SimpleFinConfig,
    pub tracked: TrackedAccounts,
    pub sync: SyncConfig,
    pub display: DisplayConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./budget-tool.toml` if it exists in current directory
/// 2. `~/.local/share/budget-tool/budget-tool.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("budget-tool").join(DEFAULT_CONFIG_FILE);
    }

    local_config
}

impl ResolvedConfig {
    /// Load the config file (or defaults if it is missing) and apply the
    /// process environment.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        Self::load_or_default_with_env(config_path, |key| std::env::var(key).ok())
    }

    pub fn load_or_default_with_env<F>(config_path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let mut config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            Config::default()
        };
        config.apply_env(lookup)?;

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(config.resolve(config_dir))
    }

    /// The bridge access URL, or an error explaining how to set it.
    pub fn require_access_url(&self) -> Result<&SecretString> {
        self.access_url.as_ref().context(
            "No SimpleFIN access URL configured. Set ACCESS_URL or run `budget-tool claim`.",
        )
    }
}
