//! Configure-invocation planning.
//!
//! [`plan`] turns a [`BuildProfile`] into the ordered configure arguments and
//! the environment overrides needed for that profile. It is a pure function of
//! the profile: no filesystem or process access happens here.


use crate::error::{ForgeError, Result};
use crate::platform::{CpuArch, HostOs, MacRelease, PlatformProfile};
use crate::profile::{BuildMode, BuildProfile, MemcheckPolicy, WordWidth};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Switches emitted for debug builds.
pub const DEBUG_SWITCHES: &[&str] = &["--disable-optimize", "--enable-debug"];

/// Switches emitted for optimized builds. Profiling keeps backtraces symbolized.
pub const OPTIMIZE_SWITCHES: &[&str] = &["--enable-optimize", "--disable-debug", "--enable-profiling"];

/// Fuzzing-oriented switches emitted for every profile.
pub const FUZZING_SWITCHES: &[&str] = &[
    "--enable-methodjit",
    "--enable-type-inference",
    "--enable-more-deterministic",
    "--disable-tests",
];

/// Switches emitted for threadsafe builds. Always both, never one.
pub const THREADSAFE_SWITCHES: &[&str] = &["--enable-threadsafe", "--with-system-nspr"];

pub const MEMCHECK_SWITCH: &str = "--enable-valgrind";
pub const CCACHE_SWITCH: &str = "--with-ccache";
pub const TEGRA_ARCH_SWITCH: &str = "--with-arch=armv7-a";

const CLANG_FLAGS: &str = "-Qunused-arguments -fcolor-diagnostics";

/// Fully resolved configure invocation for one build profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationPlan {
    /// Ordered argv, starting with `sh` and the configure script.
    pub args: Vec<String>,
    /// Environment overrides layered over the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Whether the memory-checker switch was emitted.
    pub memcheck: bool,
}

impl ConfigurationPlan {
    /// Render the argv as a single shell-quoted line.
    pub fn command_line(&self) -> String {
        shell_words::join(&self.args)
    }

    pub fn contains(&self, switch: &str) -> bool {
        self.args.iter().any(|a| a == switch)
    }
}

/// Which capability switches a platform can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlatformSupport {
    memcheck: bool,
    ccache: bool,
    tegra_arch: bool,
}

/// Plan the configure invocation for `profile`, using `configure` as the
/// script path.
pub fn plan(profile: &BuildProfile, configure: &Path) -> Result<ConfigurationPlan> {
    let platform = &profile.platform;
    let mut env = BTreeMap::new();
    let mut args = vec![
        "sh".to_string(),
        render_path(configure, platform),
    ];

    args.extend(base_target(profile.width, platform, &mut env));

    let mode_switches = match profile.mode {
        BuildMode::Debug => DEBUG_SWITCHES,
        BuildMode::Optimized => OPTIMIZE_SWITCHES,
    };
    args.extend(mode_switches.iter().map(|s| s.to_string()));
    args.extend(FUZZING_SWITCHES.iter().map(|s| s.to_string()));

    let support = platform_support(platform);
    let memcheck = match profile.memcheck {
        MemcheckPolicy::Off => false,
        MemcheckPolicy::Auto => support.memcheck,
        MemcheckPolicy::Require if support.memcheck => true,
        MemcheckPolicy::Require => {
            return Err(ForgeError::Configuration(format!(
                "memory checker requested for a {}-bit build, but {} does not support {}",
                profile.width, platform, MEMCHECK_SWITCH
            )));
        }
    };
    if memcheck {
        args.push(MEMCHECK_SWITCH.to_string());
    }
    if support.ccache && profile.allow_ccache {
        args.push(CCACHE_SWITCH.to_string());
    }
    if support.tegra_arch {
        args.push(TEGRA_ARCH_SWITCH.to_string());
    }

    if profile.threadsafe {
        args.extend(THREADSAFE_SWITCHES.iter().map(|s| s.to_string()));
    }

    Ok(ConfigurationPlan {
        args,
        env,
        memcheck,
    })
}

/// Target triple switches and toolchain overrides from the fixed lookup table.
fn base_target(
    width: WordWidth,
    platform: &PlatformProfile,
    env: &mut BTreeMap<String, String>,
) -> Vec<String> {
    let mut set = |key: &str, value: &str| {
        env.insert(key.to_string(), value.to_string());
    };

    match width {
        WordWidth::W32 if !platform.os.is_windows() && !platform.is_tegra() => {
            match (&platform.os, platform.mac_release) {
                (HostOs::Darwin, Some(release)) => {
                    let (cc, cxx, host_cc, host_cxx) = match release {
                        MacRelease::SnowLeopard => (
                            "gcc-4.2 -arch i386".to_string(),
                            "g++-4.2 -arch i386".to_string(),
                            "gcc-4.2".to_string(),
                            "g++-4.2".to_string(),
                        ),
                        MacRelease::Lion => (
                            format!("clang {} -arch i386", CLANG_FLAGS),
                            format!("clang++ {} -arch i386", CLANG_FLAGS),
                            format!("clang {}", CLANG_FLAGS),
                            format!("clang++ {}", CLANG_FLAGS),
                        ),
                    };
                    set("CC", &cc);
                    set("CXX", &cxx);
                    set("HOST_CC", &host_cc);
                    set("HOST_CXX", &host_cxx);
                    set("RANLIB", "ranlib");
                    set("AR", "ar");
                    set("AS", "$CC");
                    set("LD", "ld");
                    set("STRIP", "strip -x -S");
                    set("CROSS_COMPILE", "1");
                    vec!["--target=i386-apple-darwin8.0.0".to_string()]
                }
                _ if platform.is_linux_desktop() => {
                    // Needs the multilib toolchain on 64-bit hosts.
                    set("PKG_CONFIG_LIBDIR", "/usr/lib/pkgconfig");
                    set("CC", "gcc -m32");
                    set("CXX", "g++ -m32");
                    set("AR", "ar");
                    vec!["--target=i686-pc-linux".to_string()]
                }
                _ if platform.cpu == CpuArch::Armv7 => {
                    set("CC", "/opt/cs2007q3/bin/gcc");
                    set("CXX", "/opt/cs2007q3/bin/g++");
                    Vec::new()
                }
                _ => Vec::new(),
            }
        }
        WordWidth::W64 if platform.mac_release == Some(MacRelease::Lion) => {
            set("CC", &format!("clang {}", CLANG_FLAGS));
            set("CXX", &format!("clang++ {}", CLANG_FLAGS));
            set("AR", "ar");
            vec!["--target=x86_64-apple-darwin11.2.0".to_string()]
        }
        WordWidth::W64 if platform.os.is_windows() => vec![
            "--host=x86_64-pc-mingw32".to_string(),
            "--target=x86_64-pc-mingw32".to_string(),
        ],
        _ => Vec::new(),
    }
}

fn platform_support(platform: &PlatformProfile) -> PlatformSupport {
    if platform.os.is_windows() {
        return PlatformSupport {
            memcheck: false,
            ccache: false,
            tegra_arch: false,
        };
    }

    if platform.is_linux_desktop() || platform.is_mac() {
        // ccache does not work on macOS.
        PlatformSupport {
            memcheck: true,
            ccache: !platform.is_mac(),
            tegra_arch: false,
        }
    } else if platform.is_tegra() {
        PlatformSupport {
            memcheck: false,
            ccache: true,
            tegra_arch: true,
        }
    } else {
        PlatformSupport {
            memcheck: false,
            ccache: false,
            tegra_arch: false,
        }
    }
}

/// Render a path with the target platform's separator.
fn render_path(path: &Path, platform: &PlatformProfile) -> String {
    convert_separators(
        &path.to_string_lossy(),
        std::path::MAIN_SEPARATOR,
        platform.path_separator(),
    )
}

/// Rewrite `host_sep` and `/` to `target_sep`. With `/` on both sides nothing
/// changes: backslash is a legal file name character on POSIX.
fn convert_separators(raw: &str, host_sep: char, target_sep: char) -> String {
    raw.chars()
        .map(|c| if c == host_sep || c == '/' { target_sep } else { c })
        .collect()
}
