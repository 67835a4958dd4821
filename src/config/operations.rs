//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{ForgeError, Result};
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(ForgeError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ForgeError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| ForgeError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `jobs`, when set, must be positive
    /// - `objdir_name` and `events_file` must be plain, non-empty file names
    /// - `autoconf`, when set, must parse into at least one word
    pub fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(ForgeError::UserError(
                "config validation failed: jobs must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("objdir_name", &self.objdir_name),
            ("events_file", &self.events_file),
        ] {
            if value.is_empty() || value.contains('/') || value.contains('\\') {
                return Err(ForgeError::UserError(format!(
                    "config validation failed: {} must be a plain file name (found '{}')",
                    key, value
                )));
            }
        }

        if let Some(autoconf) = &self.autoconf {
            let words = shell_words::split(autoconf).map_err(|e| {
                ForgeError::UserError(format!(
                    "config validation failed: cannot parse autoconf '{}': {}",
                    autoconf, e
                ))
            })?;
            if words.is_empty() {
                return Err(ForgeError::UserError(
                    "config validation failed: autoconf must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Parallel make jobs: configured value, or 1.5x available parallelism.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            (cpus * 3 / 2).max(1)
        })
    }

    /// Destination directory, defaulting to the current directory.
    pub fn dest_dir_or_cwd(&self) -> Result<PathBuf> {
        match &self.dest_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|e| {
                ForgeError::UserError(format!("failed to get current working directory: {}", e))
            }),
        }
    }
}
