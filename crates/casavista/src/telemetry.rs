//! Tracing setup for the admin backend.

use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    Filter {
        directive: String,
        source: ParseError,
    },
    Init(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Filter { directive, .. } => {
                write!(f, "APP_LOG_LEVEL '{directive}' is not a valid filter directive")
            }
            TelemetryError::Init(err) => write!(f, "tracing subscriber failed to install: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Filter { source, .. } => Some(source),
            TelemetryError::Init(err) => Some(&**err),
        }
    }
}

/// Install the process-wide subscriber. Request handling is the only
/// workload, so the format keeps targets visible for tracing a failing
/// endpoint and drops ANSI codes for log shippers.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_from(config)?)
        .with_target(true)
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Init)
}

/// `RUST_LOG` wins over the configured `APP_LOG_LEVEL` so an operator can
/// raise verbosity without editing the .env.
fn filter_from(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::Filter {
        directive: config.log_level.clone(),
        source,
    })
}
