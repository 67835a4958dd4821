//! Command implementations for shellforge.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the few helpers several commands share.

mod build;
mod inspect;
mod plan;

use crate::cli::{Command, VariantArgs};
use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::platform::PlatformProfile;
use crate::profile::BuildProfile;
use std::path::{Path, PathBuf};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Plan(args) => plan::cmd_plan(args),
        Command::Build(args) => build::cmd_build(args),
        Command::Classify(args) => inspect::cmd_classify(args),
        Command::Verify(args) => inspect::cmd_verify(args),
        Command::Arch(args) => inspect::cmd_arch(args),
    }
}

/// Resolve the requested variant against the config file and host.
///
/// Command-line flags win over config values: `--memcheck` replaces the
/// configured policy, and `--no-ccache` disables ccache even when the config
/// allows it.
fn variant_profile(
    variant: &VariantArgs,
    config: &Config,
    platform: PlatformProfile,
) -> BuildProfile {
    BuildProfile::new(variant.arch, variant.mode, variant.threadsafe, platform)
        .with_memcheck(variant.memcheck.unwrap_or(config.memcheck))
        .with_ccache(config.use_ccache && !variant.no_ccache)
}

/// Event log for commands that only record when a destination is configured.
fn configured_event_log(config: &Config) -> Option<PathBuf> {
    if !config.record_events {
        return None;
    }
    config
        .dest_dir
        .as_ref()
        .map(|dest| dest.join(&config.events_file))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        ForgeError::UserError(format!("failed to resolve path '{}': {}", path.display(), e))
    })
}
