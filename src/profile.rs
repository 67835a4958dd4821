//! Build profile: the axes a shell variant is requested along.

use crate::platform::PlatformProfile;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CPU word width of the shell to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum WordWidth {
    #[value(name = "32")]
    #[serde(rename = "32")]
    W32,
    #[value(name = "64")]
    #[serde(rename = "64")]
    W64,
}

impl WordWidth {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordWidth::W32 => "32",
            WordWidth::W64 => "64",
        }
    }
}

impl fmt::Display for WordWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debug-instrumented or optimized build. Doubles as the build-mode verdict
/// reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum BuildMode {
    #[value(name = "dbg")]
    #[serde(rename = "dbg")]
    Debug,
    #[value(name = "opt")]
    #[serde(rename = "opt")]
    Optimized,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Debug => "dbg",
            BuildMode::Optimized => "opt",
        }
    }

    /// Exit code the gczeal() probe yields on a binary of this mode.
    pub fn expected_probe_code(&self) -> i32 {
        match self {
            BuildMode::Debug => 0,
            BuildMode::Optimized => crate::classify::UNBOUND_REFERENCE_CODE,
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the memory-checker (valgrind) switch is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemcheckPolicy {
    /// Emit when the platform supports it.
    #[default]
    Auto,
    /// Emit, and fail planning when the platform does not support it.
    Require,
    /// Never emit.
    Off,
}

/// A complete request for one shell variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildProfile {
    pub width: WordWidth,
    pub mode: BuildMode,
    pub threadsafe: bool,
    pub memcheck: MemcheckPolicy,
    pub allow_ccache: bool,
    pub platform: PlatformProfile,
}

impl BuildProfile {
    /// Profile with the default memcheck policy and ccache allowed.
    pub fn new(width: WordWidth, mode: BuildMode, threadsafe: bool, platform: PlatformProfile) -> Self {
        Self {
            width,
            mode,
            threadsafe,
            memcheck: MemcheckPolicy::default(),
            allow_ccache: true,
            platform,
        }
    }

    pub fn with_memcheck(mut self, memcheck: MemcheckPolicy) -> Self {
        self.memcheck = memcheck;
        self
    }

    pub fn with_ccache(mut self, allow: bool) -> Self {
        self.allow_ccache = allow;
        self
    }
}
