//! CLI argument parsing for shellforge.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::profile::{BuildMode, MemcheckPolicy, WordWidth};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shellforge: build, classify and verify JavaScript engine shells for fuzzing.
///
/// Plans the configure invocation for a requested shell variant on the
/// current host, drives the build, and tells compiled shells apart by
/// running tiny probe scripts against them.
#[derive(Parser, Debug)]
#[command(name = "shellforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log progress at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for shellforge.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the configure plan for a shell variant on this host.
    ///
    /// Nothing is run; the command line, environment overrides and the
    /// name the shell would be installed under are printed.
    Plan(PlanArgs),

    /// Build a shell variant from a Mercurial checkout.
    ///
    /// Runs autoconf, configure and make in a fresh build directory,
    /// verifies the shell and installs it under its variant name.
    Build(BuildArgs),

    /// Classify a compiled binary.
    ///
    /// Reports whether it is a bare js shell or an embedding host, and
    /// whether it is a debug or optimized build.
    Classify(ClassifyArgs),

    /// Check that a binary is the requested build mode.
    ///
    /// Exits non-zero when the binary does not match.
    Verify(VerifyArgs),

    /// Print the word width of a compiled binary.
    Arch(ArchArgs),
}

/// The axes every shell variant is requested along.
#[derive(Parser, Debug, Clone)]
pub struct VariantArgs {
    /// CPU word width.
    #[arg(long, value_enum)]
    pub arch: WordWidth,

    /// Build mode.
    #[arg(long, value_enum)]
    pub mode: BuildMode,

    /// Build a threadsafe shell against the system NSPR.
    #[arg(long)]
    pub threadsafe: bool,

    /// Memory-checker policy. Defaults to the config file value.
    #[arg(long, value_enum)]
    pub memcheck: Option<MemcheckPolicy>,

    /// Never pass --with-ccache to configure.
    #[arg(long)]
    pub no_ccache: bool,

    /// Path to a shellforge.yaml config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `plan` command.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub variant: VariantArgs,

    /// Configure script to plan for.
    #[arg(long, default_value = "js/src/configure")]
    pub configure: PathBuf,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `build` command.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub variant: VariantArgs,

    /// Root of the Mercurial checkout.
    #[arg(long)]
    pub repo: PathBuf,

    /// Extra token appended to the shell name.
    #[arg(long)]
    pub extra_id: Option<String>,

    /// Destination directory. Overrides the config file value.
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Update the checkout to this revision before building.
    #[arg(long)]
    pub update: Option<String>,

    /// Apply this patch through Mercurial Queues before building.
    #[arg(long)]
    pub patch: Option<PathBuf>,

    /// Build even when the working copy is not at tip.
    #[arg(long)]
    pub allow_non_tip: bool,
}

/// Arguments for the `classify` command.
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Binary to classify.
    pub binary: PathBuf,

    /// Run the binary through this wrapper (e.g. valgrind).
    #[arg(long)]
    pub wrapper: Option<PathBuf>,

    /// Let the probed binary write to the terminal.
    #[arg(long)]
    pub show_output: bool,

    /// Print the verdicts as JSON.
    #[arg(long)]
    pub json: bool,

    /// Path to a shellforge.yaml config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `verify` command.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Binary to check.
    pub binary: PathBuf,

    /// Build mode the binary must be.
    #[arg(long, value_enum)]
    pub mode: BuildMode,

    /// Run the binary through this wrapper (e.g. valgrind).
    #[arg(long)]
    pub wrapper: Option<PathBuf>,

    /// Let the probed binary write to the terminal.
    #[arg(long)]
    pub show_output: bool,

    /// Path to a shellforge.yaml config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `arch` command.
#[derive(Parser, Debug)]
pub struct ArchArgs {
    /// Binary to inspect.
    pub binary: PathBuf,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
