//! # Extension Entry Point
//!
//! What a debugger calls when it loads the extension.
//!
//! [`initialize`] sets up logging through `ferros-utils` and builds the
//! registry of Rust formatters under the configured category. A host
//! integration calls it once, then creates a [`crate::Formatter`] per query
//! batch with the returned registry.

use ferros_utils::logging::{init_logging, LoggingError};
use tracing::{debug, info};

use crate::config::FormatterConfig;
use crate::error::FormatResult;
use crate::registry::FormatterRegistry;

/// Set up logging and build the Rust formatter registry.
///
/// Logging is best effort: when the embedding debugger already installed a
/// subscriber, that one is kept.
///
/// ## Errors
///
/// [`crate::FormatError::InvalidPattern`] if a built-in pattern fails to
/// compile.
pub fn initialize(config: &FormatterConfig) -> FormatResult<FormatterRegistry>
{
    match init_logging() {
        Ok(()) => {}
        Err(LoggingError::InitializationFailed(reason)) => debug!(%reason, "keeping existing log subscriber"),
        Err(err) => eprintln!("ferros-pretty: logging disabled: {err}"),
    }
    info!(category = %config.category, "Initializing");

    let registry = FormatterRegistry::rust_in(config.category.clone())?;
    debug!(registrations = registry.len(), "formatters registered");
    Ok(registry)
}
