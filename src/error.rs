//! Error types for the shellforge CLI.
//!
//! Uses thiserror for derive macros. Every variant carries enough context
//! (binary path, probe source, observed exit code) to act on without rerunning.

use crate::exit_codes;
use crate::profile::BuildMode;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for shellforge operations.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// The build profile cannot be mapped to a legal switch combination.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The external build did not produce a binary, or a build tool failed.
    #[error("Build failed: {0}")]
    BuildFailure(String),

    /// Mercurial operation failed.
    #[error("Version control operation failed: {0}")]
    Vcs(String),

    /// A probe exited with a code outside the expected set.
    #[error(
        "unclassifiable binary '{}': probe `{probe}` exited with code {exit_code}",
        .binary.display()
    )]
    UnclassifiableBinary {
        binary: PathBuf,
        probe: String,
        exit_code: i32,
    },

    /// The probe process could not be spawned at all.
    #[error("failed to run probe `{probe}` against '{}': {source}", .binary.display())]
    ProbeProcess {
        binary: PathBuf,
        probe: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiled binary does not match the requested build mode.
    #[error(
        "'{}' does not match the requested {expected} build: gczeal() probe exited with code {exit_code}, expected {}",
        .binary.display(),
        .expected.expected_probe_code()
    )]
    VerificationMismatch {
        binary: PathBuf,
        expected: BuildMode,
        exit_code: i32,
    },
}

impl ForgeError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ForgeError::UserError(_) => exit_codes::USER_ERROR,
            ForgeError::Configuration(_) => exit_codes::CONFIGURATION_FAILURE,
            ForgeError::BuildFailure(_) => exit_codes::BUILD_FAILURE,
            ForgeError::Vcs(_) => exit_codes::VCS_FAILURE,
            ForgeError::UnclassifiableBinary { .. } | ForgeError::ProbeProcess { .. } => {
                exit_codes::CLASSIFICATION_FAILURE
            }
            ForgeError::VerificationMismatch { .. } => exit_codes::VERIFICATION_FAILURE,
        }
    }
}

/// Result type alias for shellforge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
