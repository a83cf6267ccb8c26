//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Install a global `fmt` subscriber filtered by `filter`.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// embedding applications that configure tracing themselves are left alone.
///
/// # Errors
///
/// Returns `Error::Config` if `filter` isn't a valid directive.
pub fn init(filter: &str) -> Result<bool> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| Error::Config(format!("invalid log filter {filter:?}: {e}")))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok())
}
