//! Environment-driven logging: compact or JSON output with a level filter.
//!
//! - `HS_LOG_FORMAT`: `compact` (default) or `json`
//! - `HS_LOG_LEVEL`: an `EnvFilter` directive, default `info`
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("HS_LOG_FORMAT").ok().as_deref(),
            std::env::var("HS_LOG_LEVEL").ok().as_deref(),
        )
    }

    fn from_vars(format: Option<&str>, level: Option<&str>) -> Self {
        let format = match format.unwrap_or("compact") {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        let level = level
            .filter(|l| !l.trim().is_empty())
            .unwrap_or("info")
            .to_string();
        Self { format, level }
    }
}

/// Install the global subscriber. Fails if one is already installed or the
/// level directive does not parse.
pub fn init_logging() -> Result<()> {
    let config = LoggingConfig::from_env();
    let filter = EnvFilter::try_new(&config.level)?;

    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}
