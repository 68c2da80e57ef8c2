//! `log:` section of the CLI config and subscriber setup.
//!
//! Command output owns stdout, so every log line is written to stderr.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LEVEL: &str = "warn";

/// How chatty `rollupindex` is, and in which format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Level for everything without an override. `-v` raises it to `debug`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-crate levels, keyed by package name (`rollupindex-storage: debug`).
    #[serde(default)]
    pub components: HashMap<String, String>,
    /// One JSON object per line, for log shippers.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: HashMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Filter string in `EnvFilter` syntax. Package names are turned into
    /// crate paths and overrides come out sorted.
    pub fn directives(&self) -> String {
        let mut overrides: Vec<String> = self
            .components
            .iter()
            .map(|(package, level)| format!("{}={level}", package.replace('-', "_")))
            .collect();
        overrides.sort();

        std::iter::once(self.level.clone())
            .chain(overrides)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber. A malformed filter falls back to `warn`.
pub fn init_tracing(config: &LogConfig) {
    let filter =
        EnvFilter::try_new(config.directives()).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
