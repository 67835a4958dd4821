use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fake standalone debug shell: knows gczeal(), not Components.
pub(crate) const DEBUG_JS_SHELL: &str = r#"probe=$(cat "$1")
case "$probe" in
  *gczeal*) exit 0 ;;
  *Components*) exit 3 ;;
esac
exit 0"#;

/// Fake standalone optimized shell: knows neither.
pub(crate) const OPT_JS_SHELL: &str = r#"probe=$(cat "$1")
case "$probe" in
  *gczeal*) exit 3 ;;
  *Components*) exit 3 ;;
esac
exit 0"#;

/// Fake debug xpcshell: knows both.
pub(crate) const DEBUG_XPCSHELL: &str = r#"probe=$(cat "$1")
case "$probe" in
  *gczeal*) exit 0 ;;
  *Components*) exit 0 ;;
esac
exit 0"#;

/// Write an executable `/bin/sh` script named `name` into `dir`.
///
/// Tests executing freshly written scripts must be `#[serial]`: a concurrent
/// fork can still hold the write descriptor and make exec fail with ETXTBSY.
#[cfg(unix)]
pub(crate) fn write_fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A scratch directory plus a fake binary inside it.
#[cfg(unix)]
pub(crate) fn fake_binary(name: &str, body: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = write_fake_binary(temp_dir.path(), name, body);
    (temp_dir, path)
}

/// Number of entries directly inside `dir`.
pub(crate) fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Puts a directory first on `PATH` for as long as it lives, so tests can
/// shadow external tools such as `hg` with fake scripts.
///
/// `PATH` is process-global: tests using this must be `#[serial]`.
pub(crate) struct PathGuard {
    original: Option<std::ffi::OsString>,
}

impl PathGuard {
    pub(crate) fn prepend(dir: &Path) -> Self {
        let original = std::env::var_os("PATH");
        let mut paths = vec![dir.to_path_buf()];
        if let Some(current) = &original {
            paths.extend(std::env::split_paths(current));
        }
        let joined = std::env::join_paths(paths).unwrap();
        // SAFETY: callers are #[serial], and every other test that spawns
        // processes is serialized too, so no thread reads the environment
        // concurrently.
        unsafe { std::env::set_var("PATH", joined) };
        Self { original }
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        // SAFETY: see `PathGuard::prepend`.
        unsafe {
            match &self.original {
                Some(path) => std::env::set_var("PATH", path),
                None => std::env::remove_var("PATH"),
            }
        }
    }
}

/// Fake `hg` that appends its argv to `hg.log` next to itself and fails the
/// subcommands listed in `$FAIL`.
#[cfg(unix)]
const LOGGING_HG: &str = r#"echo "$@" >> "$(dirname "$0")/hg.log"
for cmd in $FAIL; do
  if [ "$1" = "$cmd" ]; then
    echo "abort: $1 refused" >&2
    exit 255
  fi
done
exit 0"#;

/// Shadow `hg` with a logging fake that fails the space-separated
/// subcommands in `fail`. Keep both values alive for the test's duration.
#[cfg(unix)]
pub(crate) fn fake_hg(fail: &str) -> (TempDir, PathGuard) {
    let bin = TempDir::new().unwrap();
    let body = format!("FAIL=\"{}\"\n{}", fail, LOGGING_HG);
    write_fake_binary(bin.path(), "hg", &body);
    let guard = PathGuard::prepend(bin.path());
    (bin, guard)
}

/// Argument lists the fake `hg` in `bin` was called with, in order.
#[cfg(unix)]
pub(crate) fn hg_calls(bin: &Path) -> Vec<String> {
    std::fs::read_to_string(bin.join("hg.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
