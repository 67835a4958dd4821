//! Mercurial command runner for shellforge.
//!
//! Wraps the handful of `hg` operations a build needs: identifying the
//! checkout, updating it, and applying a patch through Mercurial Queues.

use crate::error::{ForgeError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;

/// `hg identify -i -n -b` output: `<hash>[+] <num>[+] <branch>`.
static IDENTIFY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<hash>[0-9a-f]{12,40})\+?\s+(?P<num>\d+)\+?\s+(?P<branch>\S+)")
        .expect("Invalid hg identify regex")
});

/// Result of a successful hg command execution.
#[derive(Debug, Clone)]
pub struct HgOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl HgOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

/// The checked-out changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Local revision number.
    pub local_num: String,
    /// Short changeset hash.
    pub hash: String,
    pub branch: String,
    /// Whether the working copy is at `tip`.
    pub on_tip: bool,
}

impl Revision {
    /// Suffix identifying this revision in directory names: `<num>-<hash>`.
    pub fn dir_suffix(&self) -> String {
        format!("{}-{}", self.local_num, self.hash)
    }
}

/// Run an hg command in `repo`.
///
/// Non-zero exit codes become `ForgeError::Vcs` carrying stderr (or stdout).
pub fn run_hg<P: AsRef<Path>>(repo: P, args: &[&str]) -> Result<HgOutput> {
    let repo = repo.as_ref();
    tracing::debug!(repo = %repo.display(), ?args, "running hg");

    let output = Command::new("hg")
        .current_dir(repo)
        .args(args)
        .output()
        .map_err(|e| {
            ForgeError::Vcs(format!(
                "failed to execute hg {}: {} (is Mercurial installed?)",
                args.first().unwrap_or(&""),
                e
            ))
        })?;

    let hg_output = HgOutput::from_output(&output);

    if output.status.success() {
        Ok(hg_output)
    } else {
        let error_msg = if hg_output.stderr.is_empty() {
            hg_output.stdout.clone()
        } else {
            hg_output.stderr.clone()
        };

        Err(ForgeError::Vcs(format!(
            "hg {} failed (exit code {}): {}",
            args.first().unwrap_or(&""),
            output.status.code().unwrap_or(-1),
            error_msg
        )))
    }
}

/// Identify the working copy's changeset and whether it is at tip.
pub fn identify<P: AsRef<Path>>(repo: P) -> Result<Revision> {
    let repo = repo.as_ref();
    let id = run_hg(repo, &["identify", "-i", "-n", "-b"])?;
    let tags = run_hg(repo, &["id", "-t"])?;
    parse_identify(&id.stdout, &tags.stdout)
}

/// Parse `hg identify -i -n -b` and `hg id -t` output.
pub fn parse_identify(identify: &str, tags: &str) -> Result<Revision> {
    let caps = IDENTIFY_RE.captures(identify.trim()).ok_or_else(|| {
        ForgeError::Vcs(format!("unexpected hg identify output: '{}'", identify.trim()))
    })?;

    Ok(Revision {
        local_num: caps["num"].to_string(),
        hash: caps["hash"].to_string(),
        branch: caps["branch"].to_string(),
        on_tip: tags.split_whitespace().any(|t| t == "tip"),
    })
}

/// Update the working copy to `rev` (bookmark, branch, tag or changeset).
pub fn update<P: AsRef<Path>>(repo: P, rev: &str) -> Result<()> {
    run_hg(repo, &["update", rev])?;
    Ok(())
}

/// Import `patch` into the queue and push it. Returns the patch name.
///
/// When the push fails the patch is popped and deleted from the queue again,
/// so the repository is left on its original changeset. The push error is
/// always reported, together with any step of the rollback that failed.
pub fn apply_patch<P: AsRef<Path>>(repo: P, patch: &Path) -> Result<String> {
    let repo = repo.as_ref();
    let patch = absolute_path(patch)?;
    let name = patch
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ForgeError::UserError(format!("invalid patch path '{}'", patch.display())))?;

    let patch_str = patch.to_string_lossy().to_string();
    run_hg(repo, &["qimport", &patch_str])?;
    tracing::debug!(patch = %name, "patch imported");

    if let Err(push_err) = run_hg(repo, &["qpush", &name]) {
        let rollback_errors: Vec<String> = [vec!["qpop"], vec!["qdelete", name.as_str()]]
            .iter()
            .filter_map(|args| run_hg(repo, args).err())
            .map(|e| e.to_string())
            .collect();

        let status = if rollback_errors.is_empty() {
            "The patch was removed from the queue again.".to_string()
        } else {
            format!(
                "Removing the patch from the queue also failed:\n  - {}\n\n\
                 Fix: hg -R {repo} qpop && hg -R {repo} qdelete {name}",
                rollback_errors.join("\n  - "),
                repo = repo.display(),
                name = name
            )
        };
        return Err(ForgeError::Vcs(format!(
            "{}\n\n{}\n\nThe working copy may contain untracked .rej files; \
             check with: hg -R {} status",
            push_err,
            status,
            repo.display()
        )));
    }

    tracing::info!(patch = %name, "patch applied");
    Ok(name)
}

/// Pop `name` off the queue and delete it, undoing [`apply_patch`].
pub fn unapply_patch<P: AsRef<Path>>(repo: P, name: &str) -> Result<()> {
    let repo = repo.as_ref();
    run_hg(repo, &["qpop"])?;
    run_hg(repo, &["qdelete", name])?;
    tracing::info!(patch = %name, "patch removed from the queue");
    Ok(())
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| {
        ForgeError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    Ok(cwd.join(path))
}
