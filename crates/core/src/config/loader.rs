//! Loads monitor configuration from `driftwatch.toml` and the environment.
//!
//! The file is optional; defaults cover a standard deployment. Recognized
//! environment overrides:
//! - `DRIFTWATCH_THRESHOLD`: retrain trigger ratio
//! - `DRIFTWATCH_INTERVAL_SECS`: seconds between cycle starts
//! - `DRIFTWATCH_STEP_TIMEOUT_SECS`: per-step timeout
//! - `EMAIL_USER` / `EMAIL_PASS` / `TO_EMAIL`: alert transport identity

use std::path::Path;
use std::str::FromStr;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::MonitorConfig;

/// Name of the optional configuration file under the monitor root.
pub const CONFIG_FILE: &str = "driftwatch.toml";

/// Loads configuration for the monitor rooted at `root`.
///
/// Reads `driftwatch.toml` if present, applies environment overrides, and
/// validates the result. A missing file yields the default configuration
/// rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// if an override value does not parse, or if validation fails.
pub fn load_config(root: &Path) -> ConfigResult<MonitorConfig> {
    load_config_with_env(root, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an injected environment lookup, so tests
/// never mutate process-global state.
pub fn load_config_with_env(
    root: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<MonitorConfig> {
    let config_path = root.join(CONFIG_FILE);

    let mut config = if config_path.exists() {
        let content =
            std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
                path: config_path.clone(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path,
            source,
        })?
    } else {
        MonitorConfig::default()
    };

    if config.base_dir.is_relative() {
        config.base_dir = root.join(&config.base_dir);
    }

    apply_env_overrides(&mut config, &lookup)?;
    config.validate()?;

    Ok(config)
}

fn apply_env_overrides(
    config: &mut MonitorConfig,
    lookup: &impl Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    if let Some(value) = lookup("DRIFTWATCH_THRESHOLD") {
        config.threshold = parse_override("DRIFTWATCH_THRESHOLD", &value)?;
    }
    if let Some(value) = lookup("DRIFTWATCH_INTERVAL_SECS") {
        config.interval_secs = parse_override("DRIFTWATCH_INTERVAL_SECS", &value)?;
    }
    if let Some(value) = lookup("DRIFTWATCH_STEP_TIMEOUT_SECS") {
        config.step_timeout_secs = parse_override("DRIFTWATCH_STEP_TIMEOUT_SECS", &value)?;
    }
    if let Some(value) = lookup("EMAIL_USER") {
        config.mail.user = value;
    }
    if let Some(value) = lookup("EMAIL_PASS") {
        config.mail.pass = value;
    }
    if let Some(value) = lookup("TO_EMAIL") {
        config.mail.to = value;
    }
    Ok(())
}

fn parse_override<T: FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value.parse().map_err(|_| ConfigError::InvalidOverride {
        name: name.to_string(),
        value: value.to_string(),
    })
}
