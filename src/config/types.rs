use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (default: "info").
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Log file; logs go to stderr when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Event routing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Upper bound on dispatches routed after one entry point (default: 10000).
    #[serde(default = "default_max_dispatches")]
    pub max_dispatches_per_pass: usize,
}

/// Reporting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Hand events to the reporting sink (default: true).
    #[serde(default = "default_reporting_enabled")]
    pub enabled: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_max_dispatches() -> usize {
    10_000
}

fn default_reporting_enabled() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            file: None,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_dispatches_per_pass: default_max_dispatches(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            enabled: default_reporting_enabled(),
        }
    }
}
