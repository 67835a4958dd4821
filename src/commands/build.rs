//! Implementation of the `shellforge build` command.
//!
//! Prepares the checkout (optional update, tip check, optional patch), builds
//! and verifies the shell, then records a build event next to it. A failed
//! build takes an applied patch back off the queue.

use super::{absolute, variant_profile};
use crate::build::{self, BuildOutcome, BuildRequest};
use crate::cli::BuildArgs;
use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::events::{Event, EventAction, record_best_effort};
use crate::platform::PlatformProfile;
use crate::vcs::{self, Revision};
use serde_json::json;

/// Execute the `shellforge build` command.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
    let config = Config::load_or_default(args.variant.config.as_deref())?;
    let repo = absolute(&args.repo)?;
    let dest_dir = match &args.dest {
        Some(dest) => absolute(dest)?,
        None => absolute(&config.dest_dir_or_cwd()?)?,
    };

    let platform = PlatformProfile::detect()?;
    let profile = variant_profile(&args.variant, &config, platform);

    if let Some(rev) = &args.update {
        tracing::info!(rev = %rev, "updating checkout");
        vcs::update(&repo, rev)?;
    }

    let revision = vcs::identify(&repo)?;
    check_tip(&revision, args.allow_non_tip)?;

    let patch = match &args.patch {
        Some(patch) => Some(vcs::apply_patch(&repo, patch)?),
        None => None,
    };

    let request = BuildRequest {
        repo,
        profile,
        extra_id: args.extra_id,
        dest_dir,
        revision,
    };
    tracing::info!(
        platform = %request.profile.platform,
        revision = %request.revision.dir_suffix(),
        "building shell"
    );
    let outcome = build_or_unapply(&request, &config, patch.as_deref())?;

    if config.record_events {
        let log = request.dest_dir.join(&config.events_file);
        record_best_effort(&log, &build_event(&request, &outcome, patch.as_deref()));
    }

    println!("{}", outcome.shell.display());
    Ok(())
}

/// Build, taking `patch` back off the queue when the build fails so the same
/// `--patch` can be imported again on the next run.
fn build_or_unapply(
    request: &BuildRequest,
    config: &Config,
    patch: Option<&str>,
) -> Result<BuildOutcome> {
    build::build_shell(request, config).inspect_err(|_| {
        let Some(name) = patch else { return };
        if let Err(e) = vcs::unapply_patch(&request.repo, name) {
            tracing::warn!(
                patch = %name,
                "build failed and the patch is still applied: {}\n\n\
                 Fix: hg -R {repo} qpop && hg -R {repo} qdelete {name}",
                e,
                repo = request.repo.display(),
                name = name
            );
        }
    })
}

/// Refuse a checkout that is not at tip unless explicitly allowed.
fn check_tip(revision: &Revision, allow_non_tip: bool) -> Result<()> {
    if revision.on_tip {
        return Ok(());
    }
    if allow_non_tip {
        tracing::warn!(
            revision = %revision.dir_suffix(),
            "working copy is not at tip, building anyway"
        );
        return Ok(());
    }
    Err(ForgeError::UserError(format!(
        "working copy is at revision {} ({}), which is not tip.\n\n\
         Update with --update tip, or pass --allow-non-tip to build it anyway.",
        revision.local_num, revision.hash
    )))
}

fn build_event(request: &BuildRequest, outcome: &BuildOutcome, patch: Option<&str>) -> Event {
    let profile = &request.profile;
    Event::new(EventAction::Build)
        .with_binary(&outcome.shell)
        .with_details(json!({
            "repo": request.repo,
            "revision": request.revision.hash,
            "local_num": request.revision.local_num,
            "branch": request.revision.branch,
            "arch": profile.width,
            "mode": profile.mode,
            "threadsafe": profile.threadsafe,
            "memcheck": outcome.plan.memcheck,
            "extra_id": request.extra_id,
            "patch": patch,
            "platform": profile.platform.platform_name(),
            "build_dir": outcome.build_dir,
            "configure": outcome.plan.command_line(),
        }))
}
