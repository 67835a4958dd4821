//! Config struct definition and default implementation.

use super::types::*;
use crate::profile::MemcheckPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for shellforge builds.
///
/// This struct represents the contents of `shellforge.yaml`. Every field is
/// optional; command-line flags take precedence over file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Locations
    // =========================================================================
    /// Directory shells, build directories and the event log go to.
    /// Defaults to the current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_dir: Option<PathBuf>,

    /// Name of the object directory inside each build directory.
    #[serde(default = "default_objdir_name")]
    pub objdir_name: String,

    // =========================================================================
    // Build tools
    // =========================================================================
    /// Make implementation to compile with.
    #[serde(default)]
    pub make_backend: MakeBackend,

    /// Parallel make jobs. Defaults to 1.5x the available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Autoconf 2.13 command line, overriding the per-platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoconf: Option<String>,

    // =========================================================================
    // Configure switches
    // =========================================================================
    /// Memory-checker policy when the command line does not set one.
    #[serde(default)]
    pub memcheck: MemcheckPolicy,

    /// Whether `--with-ccache` may be emitted on platforms that support it.
    #[serde(default = "default_true")]
    pub use_ccache: bool,

    // =========================================================================
    // Bookkeeping
    // =========================================================================
    /// Whether to append build and verification events to the event log.
    #[serde(default = "default_true")]
    pub record_events: bool,

    /// File name of the event log inside the destination directory.
    #[serde(default = "default_events_file")]
    pub events_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dest_dir: None,
            objdir_name: default_objdir_name(),
            make_backend: MakeBackend::default(),
            jobs: None,
            autoconf: None,
            memcheck: MemcheckPolicy::default(),
            use_ccache: default_true(),
            record_events: default_true(),
            events_file: default_events_file(),
        }
    }
}
