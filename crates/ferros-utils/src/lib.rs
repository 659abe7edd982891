//! # Ferros Utilities
//!
//! Shared utilities for the Ferros debugger extensions.
//!
//! Currently this is the logging setup: `tracing` subscribers that write to
//! stderr or to a file, never to the debugger's own console.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_in_dir, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel, LoggingError,
};
pub use tracing::{debug, error, info, trace, warn};
