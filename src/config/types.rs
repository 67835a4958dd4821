//! Configuration enums and default value functions.

use serde::{Deserialize, Serialize};

/// Which make implementation compiles the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MakeBackend {
    /// System `make` (default).
    #[default]
    Make,
    /// The in-tree pymake driver, used on Windows.
    Pymake,
}

/// Default file name of the event log inside the destination directory.
pub fn default_events_file() -> String {
    "shellforge-events.ndjson".to_string()
}

/// Default name of the object directory inside a build directory.
pub fn default_objdir_name() -> String {
    "objdir-js".to_string()
}

pub fn default_true() -> bool {
    true
}
