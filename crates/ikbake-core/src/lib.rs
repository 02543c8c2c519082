//! # ikbake Core
//!
//! Foundational pieces shared by every ikbake crate.
//!
//! This crate provides:
//! - Common error types and result aliases
//! - Logging and tracing infrastructure
//! - Math extensions for baking (on top of glam)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod logger;
pub mod math;

pub use error::{Error, Result};
pub use logger::LogLevel;
pub use math::{separate_local_qq, AxisParts, QuatExt};

/// ikbake version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize core systems (logging, etc.)
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., logging already initialized)
pub fn init() -> Result<()> {
    init_with_level(LogLevel::Info)
}

/// Initialize core systems with an explicit log level
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., logging already initialized)
pub fn init_with_level(level: LogLevel) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.to_tracing_level().into()),
        )
        .try_init()
        .map_err(|e| Error::Internal(e.to_string()))?;

    tracing::info!("ikbake v{VERSION} initialized");
    Ok(())
}
