//! `config`
//!
//! Settings for a run of the generator, read from an optional JSON file.

use std::{
    fmt, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    artifact::DEFAULT_FILE_PREFIX,
    batch::{BatchOptions, FailurePolicy},
    raster::Fit,
    sizes::TargetSizes,
};

/// The SVG rendered when no source is configured.
pub const DEFAULT_SOURCE: &str = "public/icon.svg";

/// The directory icons are written to when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "public";

/// Everything needed to run the generator.
///
/// Any field missing from a config file takes its default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::module_name_repetitions)]
pub struct GeneratorConfig {
    /// The SVG to render.
    pub source: PathBuf,
    /// The existing directory to write icons to.
    pub output_dir: PathBuf,
    /// The sizes to render.
    pub sizes: TargetSizes,
    /// Prefix of every output file name.
    pub file_prefix: String,
    /// How non-square sources are placed on the icon.
    pub fit: Fit,
    /// How many icons may be rendered at once.
    pub workers: NonZeroUsize,
    /// Whether to carry on after an icon fails.
    pub keep_going: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            source: PathBuf::from(DEFAULT_SOURCE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            sizes: TargetSizes::reference(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            fit: Fit::default(),
            workers: NonZeroUsize::MIN,
            keep_going: false,
        }
    }
}

impl GeneratorConfig {
    /// Reads a config file.
    ///
    /// # Arguments
    /// * `path`: The JSON file to read.
    ///
    /// # Returns
    /// The config.
    ///
    /// # Errors
    /// A [`ConfigError`] if the file cannot be read or is not a valid config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|cause| {
            ConfigError::FailedToReadConfig {
                path: path.to_path_buf(),
                cause,
            }
        })?;

        serde_json::from_str(&json).map_err(|cause| ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            cause,
        })
    }

    /// Gets the batch settings described by this config.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            file_prefix: self.file_prefix.clone(),
            failure_policy: if self.keep_going {
                FailurePolicy::CollectAll
            } else {
                FailurePolicy::HaltOnFirst
            },
            workers: self.workers,
            cancel: None,
        }
    }
}

/// Errors that can occur when loading a config file.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ConfigError {
    /// The file could not be read.
    FailedToReadConfig {
        /// The file we tried to read.
        path: PathBuf,
        /// Why reading failed.
        cause: io::Error,
    },
    /// The file is not valid JSON or does not describe a config.
    InvalidConfig {
        /// The file we tried to parse.
        path: PathBuf,
        /// Why parsing failed.
        cause: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FailedToReadConfig { path, cause } => {
                write!(f, "could not read config {}: {cause}", path.display())
            }
            ConfigError::InvalidConfig { path, cause } => {
                write!(f, "invalid config {}: {cause}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FailedToReadConfig { cause, .. } => Some(cause),
            ConfigError::InvalidConfig { cause, .. } => Some(cause),
        }
    }
}
