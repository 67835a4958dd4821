//! Behavioral classification of compiled shells.
//!
//! A shell is classified purely by running it against tiny probe scripts and
//! looking at the exit code. The runtime exits with [`UNBOUND_REFERENCE_CODE`]
//! when a script references an identifier the build does not have, so:
//!
//! - `Components` only resolves in an embedding host (xpcshell),
//! - `gczeal()` only exists in debug builds.
//!
//! Any exit code outside [`EXPECTED_EXIT_CODES`] is an error, never a default.

mod probe;

pub use probe::{Invocation, ProbeResult, Prober};

use crate::error::{ForgeError, Result};
use crate::profile::BuildMode;
use serde::Serialize;
use std::fmt;

/// Exit code of the runtime when a script references an undefined identifier.
pub const UNBOUND_REFERENCE_CODE: i32 = 3;

/// The only exit codes a classifiable probe may produce.
pub const EXPECTED_EXIT_CODES: [i32; 2] = [0, UNBOUND_REFERENCE_CODE];

/// References a global only embedding hosts define.
pub const CAPABILITY_PROBE: &str = "Components";

/// Calls a diagnostic entry point only debug builds define.
pub const BUILD_MODE_PROBE: &str = "gczeal()";

/// What kind of program the binary is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Standalone `js` shell.
    BareInterpreter,
    /// Embedding host with extended APIs, such as xpcshell.
    HostEmbedding,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::BareInterpreter => write!(f, "bare interpreter (js shell)"),
            Capability::HostEmbedding => write!(f, "host embedding (xpcshell)"),
        }
    }
}

/// Classifies one binary. Every call re-probes; nothing is cached.
#[derive(Debug, Clone)]
pub struct Classifier {
    invocation: Invocation,
    prober: Prober,
}

impl Classifier {
    pub fn new(invocation: Invocation) -> Self {
        Self {
            invocation,
            prober: Prober::default(),
        }
    }

    /// Use a custom prober (scratch directory, output handling).
    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = prober;
        self
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Bare interpreter or embedding host.
    pub fn capability(&self) -> Result<Capability> {
        let result = self.prober.run(&self.invocation, CAPABILITY_PROBE)?;
        match result.exit_code {
            0 => Ok(Capability::HostEmbedding),
            UNBOUND_REFERENCE_CODE => Ok(Capability::BareInterpreter),
            _ => Err(self.unclassifiable(result)),
        }
    }

    /// Debug or optimized.
    pub fn build_mode(&self) -> Result<BuildMode> {
        let result = self.prober.run(&self.invocation, BUILD_MODE_PROBE)?;
        match result.exit_code {
            0 => Ok(BuildMode::Debug),
            UNBOUND_REFERENCE_CODE => Ok(BuildMode::Optimized),
            _ => Err(self.unclassifiable(result)),
        }
    }

    /// Post-build gate: fail unless the binary behaves like an `expected` build.
    pub fn verify_build_mode(&self, expected: BuildMode) -> Result<()> {
        let result = self.prober.run(&self.invocation, BUILD_MODE_PROBE)?;
        tracing::debug!(
            binary = %self.invocation.binary().display(),
            expected = %expected,
            exit_code = result.exit_code,
            "build mode cross-check"
        );

        if result.exit_code == expected.expected_probe_code() {
            Ok(())
        } else {
            Err(ForgeError::VerificationMismatch {
                binary: self.invocation.binary().to_path_buf(),
                expected,
                exit_code: result.exit_code,
            })
        }
    }

    fn unclassifiable(&self, result: ProbeResult) -> ForgeError {
        debug_assert!(!EXPECTED_EXIT_CODES.contains(&result.exit_code));
        ForgeError::UnclassifiableBinary {
            binary: self.invocation.binary().to_path_buf(),
            probe: result.source,
            exit_code: result.exit_code,
        }
    }
}
