//! The probe mechanism: run a binary against a scratch script, keep only the
//! exit code.

use crate::error::{ForgeError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tempfile::NamedTempFile;

/// How the binary under test is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `binary <probe>`
    Direct { binary: PathBuf },
    /// `wrapper binary <probe>`, e.g. `run-mozilla.sh ./xpcshell probe.js`.
    ///
    /// The binary must occupy the wrapper's first positional slot, otherwise
    /// the wrapper would try to execute the probe script itself.
    Wrapped { wrapper: PathBuf, binary: PathBuf },
}

impl Invocation {
    pub fn direct(binary: impl Into<PathBuf>) -> Self {
        Self::Direct {
            binary: binary.into(),
        }
    }

    pub fn wrapped(wrapper: impl Into<PathBuf>, binary: impl Into<PathBuf>) -> Self {
        Self::Wrapped {
            wrapper: wrapper.into(),
            binary: binary.into(),
        }
    }

    /// The binary being classified.
    pub fn binary(&self) -> &Path {
        match self {
            Invocation::Direct { binary } | Invocation::Wrapped { binary, .. } => binary,
        }
    }

    /// Program and arguments for running `script`; the script is always last.
    pub fn argv(&self, script: &Path) -> (PathBuf, Vec<PathBuf>) {
        match self {
            Invocation::Direct { binary } => (binary.clone(), vec![script.to_path_buf()]),
            Invocation::Wrapped { wrapper, binary } => {
                (wrapper.clone(), vec![binary.clone(), script.to_path_buf()])
            }
        }
    }
}

/// Outcome of one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub exit_code: i32,
    /// Literal text of the probe script.
    pub source: String,
}

/// Runs probes. Holds no state between runs besides its settings.
#[derive(Debug, Clone)]
pub struct Prober {
    scratch_dir: PathBuf,
    show_output: bool,
}

impl Default for Prober {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            show_output: false,
        }
    }
}

impl Prober {
    /// Directory scratch scripts are created in.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Let the probed binary write to our stdout/stderr instead of discarding.
    pub fn with_output(mut self, show: bool) -> Self {
        self.show_output = show;
        self
    }

    /// Write `source` to a scratch file, run the binary on it and return the
    /// exit code. Blocks until the process exits; there is no timeout.
    ///
    /// The scratch file is removed when this returns, on every path.
    pub fn run(&self, invocation: &Invocation, source: &str) -> Result<ProbeResult> {
        let scratch_err = |e: std::io::Error| ForgeError::ProbeProcess {
            binary: invocation.binary().to_path_buf(),
            probe: source.to_string(),
            source: e,
        };

        let mut script = tempfile::Builder::new()
            .prefix("shellforge-probe-")
            .suffix(".js")
            .tempfile_in(&self.scratch_dir)
            .map_err(scratch_err)?;
        script.write_all(source.as_bytes()).map_err(scratch_err)?;
        script.flush().map_err(scratch_err)?;

        let status = self.spawn(invocation, &script).map_err(scratch_err)?;
        let exit_code = exit_code_of(status);

        tracing::debug!(
            binary = %invocation.binary().display(),
            probe = source,
            exit_code,
            "probe finished"
        );

        Ok(ProbeResult {
            exit_code,
            source: source.to_string(),
        })
    }

    fn spawn(&self, invocation: &Invocation, script: &NamedTempFile) -> std::io::Result<ExitStatus> {
        let (program, args) = invocation.argv(script.path());
        let mut command = Command::new(&program);
        command.args(&args).stdin(Stdio::null());

        if self.show_output {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        tracing::trace!(program = %program.display(), ?args, "spawning probe");
        command.status()
    }
}

/// Exit code of a finished process; signal deaths map to `128 + signal` the
/// way shells report them.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
