//! Installing a compiled shell at its destination name.
//!
//! The binary is copied to a temporary file in the destination directory and
//! then renamed over the target, so a fuzzing driver polling the directory
//! never sees a half-written shell.

use crate::error::{ForgeError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Copy `artifact` to `dest_dir/name`, preserving its permissions.
pub fn install_binary(artifact: &Path, dest_dir: &Path, name: &str) -> Result<PathBuf> {
    let target = dest_dir.join(name);
    let install_err = |what: &str, e: io::Error| {
        ForgeError::BuildFailure(format!(
            "failed to {} while installing '{}' as '{}': {}",
            what,
            artifact.display(),
            target.display(),
            e
        ))
    };

    fs::create_dir_all(dest_dir).map_err(|e| install_err("create destination directory", e))?;

    let mut source = File::open(artifact).map_err(|e| install_err("open artifact", e))?;
    let permissions = source
        .metadata()
        .map_err(|e| install_err("read artifact metadata", e))?
        .permissions();

    let mut temp = NamedTempFile::new_in(dest_dir).map_err(|e| install_err("create temp file", e))?;
    io::copy(&mut source, temp.as_file_mut()).map_err(|e| install_err("copy artifact", e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| install_err("sync temp file", e))?;
    fs::set_permissions(temp.path(), permissions)
        .map_err(|e| install_err("set permissions", e))?;

    temp.persist(&target)
        .map_err(|e| install_err("rename temp file", e.error))?;

    tracing::info!(shell = %target.display(), "installed shell");
    Ok(target)
}
