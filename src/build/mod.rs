//! Building a shell variant end to end.
//!
//! [`build_shell`] lays out a fresh build directory, plans and runs configure,
//! compiles, checks that the compiled binary really is what was asked for, and
//! only then installs it under its variant name.

pub mod install;
pub mod naming;
pub mod tools;

use crate::arch;
use crate::classify::{Classifier, Invocation};
use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::planner::{self, ConfigurationPlan};
use crate::profile::BuildProfile;
use crate::vcs::Revision;
use std::path::{Path, PathBuf};

/// Everything needed to build one shell variant.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Root of the source checkout.
    pub repo: PathBuf,
    pub profile: BuildProfile,
    /// Optional caller-supplied name token.
    pub extra_id: Option<String>,
    pub dest_dir: PathBuf,
    /// Checkout the build is made from; names the build directory.
    pub revision: Revision,
}

impl BuildRequest {
    /// `js/src` inside the checkout.
    pub fn js_src_dir(&self) -> PathBuf {
        self.repo.join("js").join("src")
    }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Installed shell, named by [`naming::shell_name`].
    pub shell: PathBuf,
    /// Build directory holding the object directory.
    pub build_dir: PathBuf,
    pub plan: ConfigurationPlan,
}

/// Plan the request and resolve the names it will produce.
pub fn prepare(
    request: &BuildRequest,
    config: &Config,
) -> Result<(ConfigurationPlan, String, PathBuf)> {
    let configure = request.js_src_dir().join("configure");
    let plan = planner::plan(&request.profile, &configure)?;

    let profile = &request.profile;
    let name = naming::shell_name(
        profile.width,
        profile.mode,
        plan.memcheck,
        request.extra_id.as_deref(),
        &profile.platform,
    );
    let stem = name
        .strip_suffix(profile.platform.exe_suffix())
        .unwrap_or(&name);
    let build_dir = request
        .dest_dir
        .join(format!("{}-{}", stem, request.revision.dir_suffix()));

    tracing::debug!(
        command = %plan.command_line(),
        build_dir = %build_dir.display(),
        objdir = %config.objdir_name,
        "prepared build"
    );
    Ok((plan, name, build_dir))
}

/// Configure, compile, verify and install one shell.
pub fn build_shell(request: &BuildRequest, config: &Config) -> Result<BuildOutcome> {
    let (plan, name, build_dir) = prepare(request, config)?;
    let objdir = build_dir.join(&config.objdir_name);
    create_fresh_dir(&objdir)?;

    let platform = &request.profile.platform;
    let src_dir = request.js_src_dir();

    tools::run_autoconf(&src_dir, platform, config.autoconf.as_deref())?;
    tools::run_configure(&plan, &objdir)?;
    let artifact = tools::compile(
        config.make_backend,
        config.effective_jobs(),
        &request.repo,
        &objdir,
        platform,
    )?;

    // A shell that fails either check must never appear under the variant name.
    verify_shell(&artifact, &request.profile)?;
    let shell = install::install_binary(&artifact, &request.dest_dir, &name)?;

    Ok(BuildOutcome {
        shell,
        build_dir,
        plan,
    })
}

/// Check a compiled shell against the profile it was built for: build mode
/// through the classifier, word width through `file`.
pub fn verify_shell(shell: &Path, profile: &BuildProfile) -> Result<()> {
    Classifier::new(Invocation::direct(shell)).verify_build_mode(profile.mode)?;

    let width = arch::binary_word_width(shell)?;
    if width != profile.width {
        return Err(ForgeError::BuildFailure(format!(
            "'{}' is a {}-bit binary, but a {}-bit shell was requested",
            shell.display(),
            width,
            profile.width
        )));
    }

    tracing::info!(
        shell = %shell.display(),
        mode = %profile.mode,
        width = %width,
        "shell verified"
    );
    Ok(())
}

/// Create `dir`, refusing to reuse one that already exists so stale
/// configure caches cannot leak into the build.
fn create_fresh_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Err(ForgeError::UserError(format!(
            "build directory '{}' already exists.\n\n\
             Remove it, or pass --extra-id to build into a different directory.",
            dir.display()
        )));
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        ForgeError::BuildFailure(format!(
            "failed to create object directory '{}': {}",
            dir.display(),
            e
        ))
    })
}
