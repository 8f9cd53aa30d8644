//! Logging for the MedLab Lambdas
//!
//! Every function logs through `tracing` to stdout, which the Lambda runtime
//! forwards to its log stream. A binary picks its defaults with
//! [`LogConfig::for_lambda`], the environment may override them, and
//! [`init_logging`] installs the global subscriber once per process.
//!
//! | Variable       | Meaning                                   | Default |
//! |----------------|-------------------------------------------|---------|
//! | `LOG_LEVEL`    | trace, debug, info, warn, error           | info    |
//! | `LOG_FORMAT`   | `text` or `json`                          | text    |
//! | `LOG_FILTER`   | extra directives, e.g. `sqlx=debug`       | none    |
//! | `LOG_ANSI`     | colourise text output                     | false   |
//! | `LOG_LOCATION` | include file and line                     | false   |
//!
//! Prefer structured fields over formatted messages:
//!
//! ```rust
//! use tracing::info;
//!
//! let key = "olympus/run.log";
//! info!(%key, rows = 10_000, "Committed batch");
//! ```
//!
//! # Example
//!
//! ```no_run
//! use medlab_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> medlab_common::Result<()> {
//!     let config = LogConfig::for_lambda("sqlx=warn").merge_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("Function started");
//!     Ok(())
//! }
//! ```

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::env;
use crate::error::{MedlabError, Result};

/// Output encoding of log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = MedlabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(MedlabError::InvalidEnv {
                name: "LOG_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    /// `target=level` directives layered over `level`
    pub directives: Vec<String>,
    pub ansi: bool,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
            directives: Vec::new(),
            ansi: false,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Info level with the given comma separated directives, typically used to
    /// quiet chatty dependencies (`"sqlx=warn,aws_config=warn"`).
    pub fn for_lambda(directives: &str) -> Self {
        Self {
            directives: split_directives(directives),
            ..Self::default()
        }
    }

    /// Overlay the `LOG_*` environment variables. `LOG_FILTER` directives are
    /// appended, so they win over the defaults for the same target.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(level) = env::optional("LOG_LEVEL") {
            self.level = level.trim().parse().map_err(|_| MedlabError::InvalidEnv {
                name: "LOG_LEVEL".to_string(),
                value: level.clone(),
            })?;
        }

        if let Some(format) = env::optional("LOG_FORMAT") {
            self.format = format.parse()?;
        }

        if let Some(filter) = env::optional("LOG_FILTER") {
            self.directives.extend(split_directives(&filter));
        }

        self.ansi = env::parsed_or("LOG_ANSI", self.ansi)?;
        self.include_location = env::parsed_or("LOG_LOCATION", self.include_location)?;

        Ok(self)
    }
}

fn split_directives(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// `RUST_LOG` first, then the configured level, then each directive.
fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env().add_directive(config.level.into());

    for directive in &config.directives {
        let parsed = directive
            .parse()
            .map_err(|e| MedlabError::config(format!("Bad log directive {:?}: {}", directive, e)))?;
        filter = filter.add_directive(parsed);
    }

    Ok(filter)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_ansi(config.ansi);

    let installed = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init(),
    };

    installed.map_err(|e| MedlabError::config(format!("Logging already initialized: {}", e)))
}
