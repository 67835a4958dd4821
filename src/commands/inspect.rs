//! Implementations of the `classify`, `verify` and `arch` commands, which
//! inspect an already compiled binary.

use super::configured_event_log;
use crate::arch;
use crate::classify::{Capability, Classifier, Invocation, Prober};
use crate::cli::{ArchArgs, ClassifyArgs, VerifyArgs};
use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::events::{Event, EventAction, record_best_effort};
use crate::profile::BuildMode;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Verdicts for one binary.
#[derive(Debug, Serialize)]
struct Classification {
    binary: PathBuf,
    capability: Capability,
    build_mode: BuildMode,
}

impl Classification {
    fn render_text(&self) -> String {
        format!(
            "Binary:     {}\nCapability: {}\nBuild mode: {}\n",
            self.binary.display(),
            self.capability,
            self.build_mode
        )
    }
}

fn invocation(binary: &Path, wrapper: Option<&Path>) -> Invocation {
    match wrapper {
        Some(wrapper) => Invocation::wrapped(wrapper, binary),
        None => Invocation::direct(binary),
    }
}

fn classifier(binary: &Path, wrapper: Option<&Path>, show_output: bool) -> Classifier {
    Classifier::new(invocation(binary, wrapper))
        .with_prober(Prober::default().with_output(show_output))
}

fn classify(classifier: &Classifier) -> Result<Classification> {
    Ok(Classification {
        binary: classifier.invocation().binary().to_path_buf(),
        capability: classifier.capability()?,
        build_mode: classifier.build_mode()?,
    })
}

/// Execute the `shellforge classify` command.
pub fn cmd_classify(args: ClassifyArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let classifier = classifier(&args.binary, args.wrapper.as_deref(), args.show_output);
    let classification = classify(&classifier)?;

    if let Some(log) = configured_event_log(&config) {
        let event = Event::new(EventAction::Classify)
            .with_binary(&classification.binary)
            .with_details(json!({
                "capability": classification.capability,
                "build_mode": classification.build_mode,
                "wrapper": args.wrapper,
            }));
        record_best_effort(&log, &event);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&classification).map_err(|e| {
            ForgeError::UserError(format!("failed to serialize classification to JSON: {}", e))
        })?;
        println!("{}", json);
    } else {
        print!("{}", classification.render_text());
    }
    Ok(())
}

/// Execute the `shellforge verify` command.
pub fn cmd_verify(args: VerifyArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let classifier = classifier(&args.binary, args.wrapper.as_deref(), args.show_output);
    let result = classifier.verify_build_mode(args.mode);

    // Probe failures are not verdicts; only record matches and mismatches.
    let matched = match &result {
        Ok(()) => Some(true),
        Err(ForgeError::VerificationMismatch { .. }) => Some(false),
        Err(_) => None,
    };
    if let (Some(log), Some(matched)) = (configured_event_log(&config), matched) {
        let event = Event::new(EventAction::Verify)
            .with_binary(&args.binary)
            .with_details(json!({
                "expected": args.mode,
                "matched": matched,
                "wrapper": args.wrapper,
            }));
        record_best_effort(&log, &event);
    }

    result?;
    println!("{}: {} build confirmed", args.binary.display(), args.mode);
    Ok(())
}

/// Execute the `shellforge arch` command.
pub fn cmd_arch(args: ArchArgs) -> Result<()> {
    let width = arch::binary_word_width(&args.binary)?;
    println!("{}", width);
    Ok(())
}
