//! Server configuration module.
//!
//! Handles loading, validating, and merging `imgvar.toml`. Stock defaults are
//! overridden by the user's file; command-line flags override both.
//!
//! ## Config File Location
//!
//! `imgvar.toml` is read from the working directory, or from the file given
//! with `--config`. A missing default file is not an error.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! root = "./data"            # Image root; overridden by --root / DATA_PATH
//!
//! [variants]
//! preview_size = 256         # Long edge of the `preview` variant (1-8192)
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//!
//! [logging]
//! filter = "imgvar=info"     # tracing filter; RUST_LOG takes precedence
//! json = false               # One JSON object per log event
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [variants]
//! preview_size = 384
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DEFAULT_PREVIEW_SIZE, MAX_PREVIEW_SIZE};
use crate::logging::{DEFAULT_FILTER, LogFormat};
use crate::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "imgvar.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration loaded from `imgvar.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Image root directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Variant transform settings.
    pub variants: VariantsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            variants: VariantsConfig::default(),
            processing: ProcessingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation("root must not be empty".into()));
        }
        if !(1..=MAX_PREVIEW_SIZE).contains(&self.variants.preview_size) {
            return Err(ConfigError::Validation(format!(
                "variants.preview_size must be 1-{MAX_PREVIEW_SIZE}"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Immutable settings handed to the resolver.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::new(&self.root).with_preview_size(self.variants.preview_size)
    }

    pub fn log_format(&self) -> LogFormat {
        if self.logging.json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Variant transform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    /// Longer edge of the `preview` variant, in pixels.
    pub preview_size: u32,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel normalization workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ServerConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a TOML file as a raw value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ServerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `imgvar.toml` from the given directory, falling back to defaults
/// when the file does not exist.
pub fn load_config(dir: &Path) -> Result<ServerConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    let overlay = if path.exists() {
        Some(load_raw_config(&path)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Load an explicitly named config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    resolve_config(Some(load_raw_config(path)?))
}

/// Returns a fully-commented stock `imgvar.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgvar Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Image root directory. Requests are resolved inside it; derived variants
# are written next to their sources.
# Overridden by --root or the DATA_PATH environment variable.
root = "./data"

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
[variants]
# Longer edge of the `preview` variant, in pixels (1-8192).
# Changing it does not refresh previews already on disk.
preview_size = 256

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `normalize`.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# tracing filter directive. RUST_LOG takes precedence when set.
filter = "imgvar=info"

# Emit one JSON object per log event instead of human-readable lines.
json = false
"##
}
