//! Runtime configuration
//!
//! Loaded from JSON (file or string) and overridable through environment
//! variables:
//!
//! | Variable          | Field        |
//! |-------------------|--------------|
//! | `TRUENO_AB_SEED`  | `seed`       |
//! | `TRUENO_AB_LOG`   | `log_filter` |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable holding the RNG seed.
pub const SEED_ENV: &str = "TRUENO_AB_SEED";

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "TRUENO_AB_LOG";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed RNG seed for reproducible assignment; `None` draws from entropy.
    pub seed: Option<u64>,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or
    /// `"trueno_ab=debug"`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed JSON or mistyped fields.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(format!("invalid config JSON: {e}")))
    }

    /// Read and parse a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file can't be read and `Error::Config` if
    /// it doesn't parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Defaults overlaid with the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `TRUENO_AB_SEED` isn't a `u64`.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (keyed by the `*_ENV` names).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the seed value isn't a `u64`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(SEED_ENV) {
            let seed = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{SEED_ENV}={raw:?}: {e}")))?;
            self.seed = Some(seed);
        }
        if let Some(filter) = lookup(LOG_ENV) {
            self.log_filter = filter;
        }
        Ok(self)
    }
}
