//! Runners for the external build tools: autoconf, configure, make.

use crate::config::MakeBackend;
use crate::error::{ForgeError, Result};
use crate::planner::ConfigurationPlan;
use crate::platform::{HostOs, PlatformProfile};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Maximum number of output lines kept in build failure messages.
const FAILURE_MAX_LINES: usize = 50;

/// Maximum total characters kept in build failure messages.
const FAILURE_MAX_CHARS: usize = 4096;

/// Old pymake drivers reject `-s`; the build is retried without it.
const PYMAKE_NO_SILENT: &str = "no such option: -s";

/// Captured result of one tool run.
#[derive(Debug)]
pub struct ToolRun {
    /// Whether the tool exited 0.
    pub success: bool,
    pub exit_code: i32,
    /// Stdout followed by stderr.
    pub output: String,
}

/// Run `argv` in `cwd` with `env` layered over the inherited environment.
pub fn run_tool<'a>(
    argv: &[String],
    cwd: &Path,
    env: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Result<ToolRun> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| ForgeError::BuildFailure("empty tool command".to_string()))?;
    let rendered = shell_words::join(argv);

    tracing::info!(cwd = %cwd.display(), "running `{}`", rendered);
    let started = Instant::now();

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(env)
        .output()
        .map_err(|e| {
            ForgeError::BuildFailure(format!(
                "failed to execute `{}`: {}\n\nFix: ensure {} is installed and in PATH.",
                rendered, e, program
            ))
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = if stderr.is_empty() {
        stdout.to_string()
    } else {
        format!("{}\n{}", stdout, stderr)
    };

    let run = ToolRun {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        output: combined,
    };
    tracing::info!(
        exit_code = run.exit_code,
        "`{}` took {:.3} seconds",
        rendered,
        started.elapsed().as_secs_f64()
    );
    Ok(run)
}

/// Default autoconf 2.13 invocation for the platform, if it has one.
pub fn default_autoconf(platform: &PlatformProfile) -> Option<Vec<String>> {
    match platform.os {
        HostOs::Darwin => Some(vec!["autoconf213".to_string()]),
        HostOs::Linux => Some(vec!["autoconf2.13".to_string()]),
        HostOs::Windows => Some(vec!["sh".to_string(), "autoconf-2.13".to_string()]),
        HostOs::Other(_) => None,
    }
}

/// Regenerate `configure` in `src_dir`.
///
/// `command` overrides the platform default and is split with shell rules.
pub fn run_autoconf(
    src_dir: &Path,
    platform: &PlatformProfile,
    command: Option<&str>,
) -> Result<()> {
    let argv = match command {
        Some(cmd) => shell_words::split(cmd).map_err(|e| {
            ForgeError::UserError(format!("failed to parse autoconf command '{}': {}", cmd, e))
        })?,
        None => match default_autoconf(platform) {
            Some(argv) => argv,
            None => {
                tracing::warn!(%platform, "no autoconf known for this platform, skipping");
                return Ok(());
            }
        },
    };

    let run = run_tool(&argv, src_dir, std::iter::empty())?;
    require_success("autoconf", &run)
}

/// Run the planned configure invocation inside `objdir`.
pub fn run_configure(plan: &ConfigurationPlan, objdir: &Path) -> Result<()> {
    tracing::debug!(env = ?plan.env, "configure environment overrides");
    let run = run_tool(&plan.args, objdir, &plan.env)?;
    require_success("configure", &run)
}

/// argv for compiling in `objdir`.
pub fn compile_command(
    backend: MakeBackend,
    jobs: usize,
    repo: &Path,
    objdir: &Path,
    silent: bool,
) -> Vec<String> {
    let mut argv = match backend {
        MakeBackend::Make => vec![
            "make".to_string(),
            "-C".to_string(),
            objdir.to_string_lossy().to_string(),
        ],
        MakeBackend::Pymake => vec![
            "python".to_string(),
            "-OO".to_string(),
            repo.join("build")
                .join("pymake")
                .join("make.py")
                .to_string_lossy()
                .to_string(),
        ],
    };
    argv.push(format!("-j{}", jobs));
    if silent {
        argv.push("-s".to_string());
    }
    argv
}

/// Compile the shell and return the path of the artifact.
pub fn compile(
    backend: MakeBackend,
    jobs: usize,
    repo: &Path,
    objdir: &Path,
    platform: &PlatformProfile,
) -> Result<PathBuf> {
    let artifact = objdir.join(format!("js{}", platform.exe_suffix()));

    let silent = compile_command(backend, jobs, repo, objdir, true);
    let mut run = run_tool(&silent, objdir, std::iter::empty())?;
    if backend == MakeBackend::Pymake && run.output.contains(PYMAKE_NO_SILENT) {
        tracing::debug!("pymake does not support -s, retrying without it");
        let verbose = compile_command(backend, jobs, repo, objdir, false);
        run = run_tool(&verbose, objdir, std::iter::empty())?;
    }

    check_artifact(&artifact, &run)?;
    Ok(artifact)
}

/// Decide whether a compile run produced a usable shell.
///
/// Make's exit code is not a reliable signal: a failing run that still left
/// a shell behind is only worth a warning.
pub fn check_artifact(artifact: &Path, run: &ToolRun) -> Result<()> {
    match (run.success, artifact.exists()) {
        (_, false) => Err(ForgeError::BuildFailure(format!(
            "compilation did not produce '{}' (exit code {}){}",
            artifact.display(),
            run.exit_code,
            output_excerpt(&run.output)
        ))),
        (false, true) => {
            tracing::warn!(
                exit_code = run.exit_code,
                artifact = %artifact.display(),
                "a shell was compiled even though make exited non-zero, continuing"
            );
            Ok(())
        }
        (true, true) => Ok(()),
    }
}

fn require_success(step: &str, run: &ToolRun) -> Result<()> {
    if run.success {
        return Ok(());
    }
    Err(ForgeError::BuildFailure(format!(
        "{} failed with exit code {}{}",
        step,
        run.exit_code,
        output_excerpt(&run.output)
    )))
}

fn output_excerpt(output: &str) -> String {
    let truncated = truncate_output(output, FAILURE_MAX_LINES, FAILURE_MAX_CHARS);
    if truncated.trim().is_empty() {
        String::new()
    } else {
        format!("\n\nOutput (truncated):\n{}", truncated)
    }
}

/// Keep the tail of `output`, where build errors usually are.
fn truncate_output(output: &str, max_lines: usize, max_chars: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    let relevant_lines: Vec<&str> = if lines.len() > max_lines {
        lines[lines.len() - max_lines..].to_vec()
    } else {
        lines
    };

    let mut result = relevant_lines.join("\n");

    if result.len() > max_chars {
        let mut cut = result.len() - max_chars;
        while !result.is_char_boundary(cut) {
            cut += 1;
        }
        result = format!("...(truncated)...\n{}", &result[cut..]);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::CpuArch;
    use serial_test::serial;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn linux() -> PlatformProfile {
        PlatformProfile::new(HostOs::Linux, CpuArch::X86_64, None, "box")
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_truncate_output_keeps_tail() {
        let output = "line1\nline2\nline3\nline4\nline5";
        assert_eq!(truncate_output(output, 3, 1000), "line3\nline4\nline5");
        assert_eq!(truncate_output(output, 10, 1000), output);
    }

    #[test]
    fn test_truncate_output_exceeds_chars() {
        let output = "é".repeat(100);
        let result = truncate_output(&output, 1000, 51);
        assert!(result.starts_with("...(truncated)..."));
        assert!(result.len() <= 51 + 20);
    }

    #[test]
    fn test_compile_command_make() {
        let argv = compile_command(
            MakeBackend::Make,
            6,
            Path::new("/repo"),
            Path::new("/build/objdir-js"),
            true,
        );
        assert_eq!(argv, vec!["make", "-C", "/build/objdir-js", "-j6", "-s"]);
    }

    #[test]
    fn test_compile_command_pymake() {
        let argv = compile_command(
            MakeBackend::Pymake,
            3,
            Path::new("/repo"),
            Path::new("/obj"),
            false,
        );
        assert_eq!(argv[0], "python");
        assert_eq!(argv[1], "-OO");
        assert!(argv[2].ends_with("make.py"));
        assert_eq!(argv.last().map(String::as_str), Some("-j3"));
    }

    #[test]
    fn test_default_autoconf_per_platform() {
        assert_eq!(default_autoconf(&linux()), Some(vec!["autoconf2.13".to_string()]));
        let windows = PlatformProfile::new(HostOs::Windows, CpuArch::X86_64, None, "w");
        assert_eq!(
            default_autoconf(&windows),
            Some(vec!["sh".to_string(), "autoconf-2.13".to_string()])
        );
        let other = PlatformProfile::new(HostOs::Other("haiku".into()), CpuArch::X86_64, None, "h");
        assert_eq!(default_autoconf(&other), None);
    }

    #[test]
    #[serial]
    fn test_run_tool_captures_output_and_env() {
        let temp = TempDir::new().unwrap();
        let mut env = BTreeMap::new();
        env.insert("CC".to_string(), "gcc -m32".to_string());

        let script = sh("echo \"cc=$CC\"; echo oops >&2; exit 4");
        let run = run_tool(&script, temp.path(), &env).unwrap();
        assert!(!run.success);
        assert_eq!(run.exit_code, 4);
        assert!(run.output.contains("cc=gcc -m32"));
        assert!(run.output.contains("oops"));
    }

    #[test]
    #[serial]
    fn test_run_tool_missing_program() {
        let temp = TempDir::new().unwrap();
        let argv = vec!["definitely-not-a-build-tool".to_string()];
        let err = run_tool(&argv, temp.path(), std::iter::empty()).unwrap_err();
        assert!(matches!(err, ForgeError::BuildFailure(_)));
        assert!(err.to_string().contains("PATH"));
    }

    #[test]
    #[serial]
    fn test_run_configure_uses_plan_env_and_cwd() {
        let src = TempDir::new().unwrap();
        let objdir = TempDir::new().unwrap();
        let configure = src.path().join("configure");
        std::fs::write(
            &configure,
            "test \"$CC\" = \"gcc -m32\" || exit 1\necho \"$@\" > config.args\n",
        )
        .unwrap();

        let mut env = BTreeMap::new();
        env.insert("CC".to_string(), "gcc -m32".to_string());
        let plan = ConfigurationPlan {
            args: vec![
                "sh".to_string(),
                configure.to_string_lossy().to_string(),
                "--enable-debug".to_string(),
            ],
            env,
            memcheck: false,
        };

        run_configure(&plan, objdir.path()).unwrap();
        let recorded = std::fs::read_to_string(objdir.path().join("config.args")).unwrap();
        assert_eq!(recorded.trim(), "--enable-debug");
    }

    #[test]
    #[serial]
    fn test_run_configure_failure_reports_output() {
        let objdir = TempDir::new().unwrap();
        let plan = ConfigurationPlan {
            args: sh("echo 'configure: error: no compiler'; exit 1"),
            env: BTreeMap::new(),
            memcheck: false,
        };

        let err = run_configure(&plan, objdir.path()).unwrap_err();
        assert!(matches!(err, ForgeError::BuildFailure(_)));
        assert!(err.to_string().contains("no compiler"));
    }

    #[test]
    #[serial]
    fn test_failed_make_with_artifact_is_accepted() {
        let objdir = TempDir::new().unwrap();
        let run = run_tool(&sh("touch js; exit 2"), objdir.path(), std::iter::empty()).unwrap();
        assert!(!run.success);

        check_artifact(&objdir.path().join("js"), &run).unwrap();
    }

    #[test]
    #[serial]
    fn test_missing_artifact_is_build_failure() {
        let objdir = TempDir::new().unwrap();

        let failed =
            run_tool(&sh("echo 'error: boom'; exit 2"), objdir.path(), std::iter::empty()).unwrap();
        let err = check_artifact(&objdir.path().join("js"), &failed).unwrap_err();
        assert!(matches!(err, ForgeError::BuildFailure(_)));
        assert!(err.to_string().contains("boom"));

        let succeeded = run_tool(&sh("true"), objdir.path(), std::iter::empty()).unwrap();
        let err = check_artifact(&objdir.path().join("js"), &succeeded).unwrap_err();
        assert!(err.to_string().contains("did not produce"));
    }
}
