//! Configuration types for the Colloquy harness

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the evaluation harness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Directory holding report artifacts and externally captured images
    pub results_dir: PathBuf,

    /// Capacity of the agent signal channel
    pub signal_buffer: usize,

    /// Report artifact configuration
    pub report: ReportConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("eval-results"),
            signal_buffer: 256,
            report: ReportConfig::default(),
        }
    }
}

/// Report artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write the machine-readable aggregate JSON
    pub write_json: bool,

    /// Write the human-readable HTML report
    pub write_html: bool,

    /// Aggregate JSON filename within the results directory
    #[serde(default = "default_json_file")]
    pub json_file: String,

    /// HTML report filename within the results directory
    #[serde(default = "default_html_file")]
    pub html_file: String,
}

fn default_json_file() -> String {
    "judge-input.json".to_string()
}

fn default_html_file() -> String {
    "report.html".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            write_json: true,
            write_html: true,
            json_file: default_json_file(),
            html_file: default_html_file(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (colloquy.toml or path from COLLOQUY_CONFIG_PATH)
    /// 3. Environment variable overrides: `COLLOQUY_` plus the field name
    ///    (`COLLOQUY_SIGNAL_BUFFER`), with `__` descending into sections
    ///    (`COLLOQUY_REPORT__WRITE_HTML`)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is invalid.
    pub fn load() -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(HarnessConfig::default()))
            .merge(Toml::file("colloquy.toml"))
            .merge(Env::prefixed("COLLOQUY_").split("__"));

        // Check for custom config path
        if let Ok(path) = std::env::var("COLLOQUY_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: HarnessConfig = figment.extract().map_err(|e| {
            crate::error::ColloquyError::Configuration(format!(
                "Failed to load configuration: {}",
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let config: HarnessConfig = Figment::from(Serialized::defaults(HarnessConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                crate::error::ColloquyError::Configuration(format!(
                    "Failed to load configuration file: {}",
                    e
                ))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    fn validate(&self) -> crate::error::Result<()> {
        if self.signal_buffer == 0 {
            return Err(crate::error::ColloquyError::Configuration(
                "signal_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
