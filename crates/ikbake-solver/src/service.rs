//! The bake run surface: options and orchestration

use std::path::PathBuf;

use ikbake_core::{Error, LogLevel, Result};
use ikbake_motion::Motion;
use ikbake_rig::Model;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::pool;
use crate::transfer::ParentKey;

/// Options for one bake run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BakeOptions {
    /// Where the caller will write the baked motion
    pub output_path: PathBuf,
    /// Path of the source motion, for log output only
    pub motion_path: PathBuf,
    /// Upper bound on bake worker threads (further capped by the pool)
    pub max_workers: usize,
    /// Log verbosity of the run
    pub logging_level: LogLevel,
    /// Tool version string echoed in the run header
    pub version_name: String,
    /// Lookup convention for IK-parent bones
    pub parent_key: ParentKey,
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self {
            output_path: PathBuf::new(),
            motion_path: PathBuf::new(),
            max_workers: pool::default_max_workers(false),
            logging_level: LogLevel::Info,
            version_name: ikbake_core::VERSION.to_string(),
            parent_key: ParentKey::default(),
        }
    }
}

/// Runs an IK-to-FK bake and reports progress and outcome
///
/// The service owns logging and scheduling; reading the model and motion
/// and writing the result file belong to the caller.
#[derive(Debug)]
pub struct BakeService {
    options: BakeOptions,
}

impl BakeService {
    /// Create a service for one run
    #[must_use]
    pub fn new(options: BakeOptions) -> Self {
        Self { options }
    }

    /// The options this service runs with
    #[must_use]
    pub fn options(&self) -> &BakeOptions {
        &self.options
    }

    /// Bake every eligible IK bone of `model` in `motion`
    ///
    /// On success the motion holds the baked result, ready for the caller
    /// to write to `output_path`.
    ///
    /// # Errors
    ///
    /// Propagates the first job failure; domain errors identify the
    /// offending IK bone.
    pub fn execute(&self, model: &Model, motion: &mut Motion) -> Result<bool> {
        info!("------------------------");
        info!("IK bake run");
        info!("  version: {}", self.options.version_name);
        info!("  motion: {}", file_label(&self.options.motion_path));
        info!("  model: {}", model.name);
        info!("------------------------");

        match pool::bake_all(model, motion, &self.options) {
            Ok(result) => {
                info!(
                    "bake finished, ready to write: {}",
                    file_label(&self.options.output_path)
                );
                Ok(result)
            }
            Err(e @ (Error::IkTarget { .. } | Error::IkLink { .. })) => {
                error!("bake aborted on invalid data: {e}");
                Err(e)
            }
            Err(e) => {
                error!("bake aborted on an unexpected error: {e}");
                Err(e)
            }
        }
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_bounded() {
        let options = BakeOptions::default();
        assert!(options.max_workers >= 1);
        assert!(options.max_workers <= 32);
        assert_eq!(options.parent_key.suffix, "親");
    }

    #[test]
    fn exec_saving_pins_one_worker() {
        assert_eq!(pool::default_max_workers(true), 1);
    }
}
