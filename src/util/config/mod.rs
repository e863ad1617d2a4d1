//! Scheduler configuration loading
//!
//! Configuration is written in RON. Every field of [`SchedulerConfig`] has a
//! default, so a file only needs the values it overrides.
//!
//! # Lookup order
//!
//! ```text
//! 1. Explicit path passed to `load_config`
//! 2. Path in the TICKFLOW_CONFIG environment variable
//! 3. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use tickflow::util::config::load_config_str;
//!
//! let config = load_config_str("(prewarm_records: 8)").unwrap();
//! assert_eq!(config.prewarm_records, 8);
//! ```

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::runtime::scheduler::SchedulerConfig;

/// Environment variable holding the path of a configuration file.
pub const CONFIG_ENV: &str = "TICKFLOW_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("config serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Parse a configuration from RON text.
pub fn load_config_str(text: &str) -> Result<SchedulerConfig, ConfigError> {
    Ok(ron::from_str(text)?)
}

/// Load a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SchedulerConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), "loaded scheduler config");
    load_config_str(&content)
}

/// Load the file named by `TICKFLOW_CONFIG`, or defaults when it is unset.
pub fn load_default_config() -> Result<SchedulerConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => load_config(path),
        _ => Ok(SchedulerConfig::default()),
    }
}

/// Render a configuration as pretty-printed RON.
pub fn config_to_string(config: &SchedulerConfig) -> Result<String, ConfigError> {
    Ok(ron::ser::to_string_pretty(
        config,
        ron::ser::PrettyConfig::new(),
    )?)
}

/// Write a configuration file, creating parent directories as needed.
pub fn save_config(
    path: impl AsRef<Path>,
    config: &SchedulerConfig,
) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    fs::write(path, config_to_string(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests;
