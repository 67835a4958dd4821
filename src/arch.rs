//! Word-width detection from `file(1)` output.

use crate::error::{ForgeError, Result};
use crate::profile::WordWidth;
use std::path::Path;
use std::process::Command;

/// Run `file` on `binary` and report its word width.
pub fn binary_word_width(binary: &Path) -> Result<WordWidth> {
    let output = Command::new("file").arg(binary).output().map_err(|e| {
        ForgeError::BuildFailure(format!(
            "failed to execute file on '{}': {}\n\nFix: install file(1).",
            binary.display(),
            e
        ))
    })?;

    if !output.status.success() {
        return Err(ForgeError::BuildFailure(format!(
            "file '{}' failed (exit code {}): {}",
            binary.display(),
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_file_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse a `file` description such as
/// `js: ELF 64-bit LSB executable, x86-64, ...`.
pub fn parse_file_output(output: &str) -> Result<WordWidth> {
    let description = output
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(output)
        .trim();

    if description.contains("universal binary") {
        return Err(ForgeError::BuildFailure(format!(
            "multiple-architecture binaries are not supported: {}",
            description
        )));
    }

    let is_32 = description.contains("386") || description.contains("32-bit");
    let is_64 = description.contains("64-bit");

    match (is_32, is_64) {
        (true, false) => Ok(WordWidth::W32),
        (false, true) => Ok(WordWidth::W64),
        _ => Err(ForgeError::BuildFailure(format!(
            "cannot determine word width from file output: {}",
            description
        ))),
    }
}
