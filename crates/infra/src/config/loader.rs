//! Configuration loader
//!
//! Loads the dereference pipeline configuration from a file and the
//! environment.
//!
//! ## Loading Strategy
//! 1. Read the given file, or the first file found by
//!    [`find_config_file`], or start from defaults when there is none
//! 2. Apply environment overrides on top
//! 3. Validate the result
//!
//! ## Environment Variables
//! - `GROUPDEREF_ATTRIBUTES`: Comma-separated watched attribute names
//! - `GROUPDEREF_MAX_GROUP_SIZE`: Whole-group size limit
//! - `GROUPDEREF_WORKER_COUNT`: Number of workers
//! - `GROUPDEREF_MAX_RATE_PER_SECOND`: Aggregate operations per second
//! - `GROUPDEREF_PARSE_MODE`: `parse-whole-group` or `parse-group-change`
//! - `GROUPDEREF_STRATEGY`: `enqueue-member-dn`, `enqueue-member-entry` or
//!   `touch-member-entry`
//! - `GROUPDEREF_ABORT_GROUP_SYNC`: Whether to stop group propagation
//!   (true/false)
//! - `GROUPDEREF_QUEUE_CAPACITY`: Bound on the operation queue
//! - `GROUPDEREF_VERBOSE`: Per-reference logs at info level (true/false)
//!
//! ## File Locations
//! The loader looks for the following files (in order):
//! 1. `./groupderef.toml`
//! 2. `./groupderef.json`
//! 3. `./config/groupderef.toml`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use groupderef_domain::{DereferenceConfig, DerefError, ParseMode, Result, Strategy};

pub const ENV_ATTRIBUTES: &str = "GROUPDEREF_ATTRIBUTES";
pub const ENV_MAX_GROUP_SIZE: &str = "GROUPDEREF_MAX_GROUP_SIZE";
pub const ENV_WORKER_COUNT: &str = "GROUPDEREF_WORKER_COUNT";
pub const ENV_MAX_RATE_PER_SECOND: &str = "GROUPDEREF_MAX_RATE_PER_SECOND";
pub const ENV_PARSE_MODE: &str = "GROUPDEREF_PARSE_MODE";
pub const ENV_STRATEGY: &str = "GROUPDEREF_STRATEGY";
pub const ENV_ABORT_GROUP_SYNC: &str = "GROUPDEREF_ABORT_GROUP_SYNC";
pub const ENV_QUEUE_CAPACITY: &str = "GROUPDEREF_QUEUE_CAPACITY";
pub const ENV_VERBOSE: &str = "GROUPDEREF_VERBOSE";

const CANDIDATE_FILES: [&str; 3] = ["groupderef.toml", "groupderef.json", "config/groupderef.toml"];

/// Load configuration: file (explicit or found) or defaults, then
/// environment overrides, then validation.
///
/// # Errors
/// Returns `DerefError::Config` if:
/// - The explicit file does not exist or cannot be parsed
/// - An environment override has an invalid value
/// - The resulting configuration fails validation
pub fn load(path: Option<PathBuf>) -> Result<DereferenceConfig> {
    let base = match path.or_else(find_config_file) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::info!("No config file found, starting from defaults");
            DereferenceConfig::default()
        }
    };

    let config = apply_env_overrides(base, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from defaults and environment variables only.
///
/// # Errors
/// Returns `DerefError::Config` for invalid variable values or an invalid
/// resulting configuration.
pub fn load_from_env() -> Result<DereferenceConfig> {
    let config = apply_env_overrides(DereferenceConfig::default(), |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// Supports both JSON and TOML formats (detected by file extension).
/// The result is not validated.
///
/// # Errors
/// Returns `DerefError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<DereferenceConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DerefError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| DerefError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `DerefError::Config` if the format is unsupported or parsing
/// fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<DereferenceConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DerefError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DerefError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DerefError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Search the working directory for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn find_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    CANDIDATE_FILES.iter().map(|file| cwd.join(file)).find(|path| path.exists())
}

/// Apply `GROUPDEREF_*` overrides read through `lookup`.
///
/// Unset or blank variables leave the value from `config` untouched.
///
/// # Errors
/// Returns `DerefError::Config` naming the variable with an invalid value.
pub fn apply_env_overrides<F>(mut config: DereferenceConfig, lookup: F) -> Result<DereferenceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(value) = var(ENV_ATTRIBUTES) {
        config.attributes = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .collect();
    }
    if let Some(value) = var(ENV_MAX_GROUP_SIZE) {
        config.max_group_size = Some(parse_value(ENV_MAX_GROUP_SIZE, &value)?);
    }
    if let Some(value) = var(ENV_WORKER_COUNT) {
        config.worker_count = parse_value(ENV_WORKER_COUNT, &value)?;
    }
    if let Some(value) = var(ENV_MAX_RATE_PER_SECOND) {
        config.max_rate_per_second = Some(parse_value(ENV_MAX_RATE_PER_SECOND, &value)?);
    }
    if let Some(value) = var(ENV_PARSE_MODE) {
        config.parse_mode = value
            .parse::<ParseMode>()
            .map_err(|e| DerefError::Config(format!("Invalid {ENV_PARSE_MODE}: {e}")))?;
    }
    if let Some(value) = var(ENV_STRATEGY) {
        config.strategy = value
            .parse::<Strategy>()
            .map_err(|e| DerefError::Config(format!("Invalid {ENV_STRATEGY}: {e}")))?;
    }
    if let Some(value) = var(ENV_ABORT_GROUP_SYNC) {
        config.abort_group_sync = parse_bool(ENV_ABORT_GROUP_SYNC, &value)?;
    }
    if let Some(value) = var(ENV_QUEUE_CAPACITY) {
        config.queue_capacity = Some(parse_value(ENV_QUEUE_CAPACITY, &value)?);
    }
    if let Some(value) = var(ENV_VERBOSE) {
        config.verbose = parse_bool(ENV_VERBOSE, &value)?;
    }

    Ok(config)
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| DerefError::Config(format!("Invalid {key} '{value}': {e}")))
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DerefError::Config(format!("Invalid {key} '{value}': expected a boolean"))),
    }
}
