//! Tracing subscriber setup for hosts embedding translators.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, e.g. `info,t2t_accessor=debug`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::Compact,
        }
    }
}

impl TelemetryConfig {
    /// Uses `RUST_LOG` as the filter when it is set.
    pub fn from_env() -> Self {
        let filter = std::env::var(EnvFilter::DEFAULT_ENV)
            .ok()
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| "info".to_owned());
        Self {
            filter,
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("could not install tracing subscriber: {0}")]
    Install(String),
}

/// Installs the global tracing subscriber. Fails if one is already set.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.filter)?;
    let installed = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
    };
    installed.map_err(|error| TelemetryError::Install(error.to_string()))
}
