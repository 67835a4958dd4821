//! Host platform facts used by the configuration planner.
//!
//! Everything the planner needs to know about the machine is sniffed once by
//! [`PlatformProfile::detect`] and then passed around as a plain value. Tests
//! and cross-planning construct profiles directly.

use crate::error::{ForgeError, Result};
use serde::Serialize;
use std::fmt;
use std::process::Command;

/// Hostname of the NVIDIA Tegra ARM boards, which get their own switch set.
pub const TEGRA_HOSTNAME: &str = "tegra-ubuntu";

/// Operating system family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostOs {
    Linux,
    Darwin,
    Windows,
    Other(String),
}

impl HostOs {
    /// Map a `std::env::consts::OS` value onto the known families.
    pub fn from_rust_os(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "macos" => Self::Darwin,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

/// CPU architecture of the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuArch {
    X86,
    X86_64,
    Armv7,
    Aarch64,
    Other(String),
}

impl CpuArch {
    /// Map a `std::env::consts::ARCH` value onto the known architectures.
    pub fn from_rust_arch(arch: &str) -> Self {
        match arch {
            "x86" => Self::X86,
            "x86_64" => Self::X86_64,
            "arm" => Self::Armv7,
            "aarch64" => Self::Aarch64,
            other => Self::Other(other.to_string()),
        }
    }
}

/// macOS releases the toolchain table distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacRelease {
    /// 10.6: gcc-4.2 toolchain.
    SnowLeopard,
    /// 10.7 and later: clang toolchain.
    Lion,
}

impl MacRelease {
    /// Parse a `sw_vers -productVersion` string such as `10.7.5`.
    pub fn from_product_version(version: &str) -> Option<Self> {
        let mut parts = version.trim().split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts.next().unwrap_or("0").parse().ok()?;

        match (major, minor) {
            (10, 6) => Some(Self::SnowLeopard),
            (10, m) if m >= 7 => Some(Self::Lion),
            (m, _) if m > 10 => Some(Self::Lion),
            _ => None,
        }
    }
}

/// Immutable description of the platform a build is planned for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    pub os: HostOs,
    pub cpu: CpuArch,
    /// Only set on macOS.
    pub mac_release: Option<MacRelease>,
    pub hostname: String,
}

impl PlatformProfile {
    /// Build a profile from explicit facts.
    pub fn new(os: HostOs, cpu: CpuArch, mac_release: Option<MacRelease>, hostname: &str) -> Self {
        Self {
            os,
            cpu,
            mac_release,
            hostname: hostname.to_string(),
        }
    }

    /// Sniff the current host.
    ///
    /// On macOS this runs `sw_vers -productVersion`; releases older than
    /// Snow Leopard are rejected since no toolchain entry exists for them.
    pub fn detect() -> Result<Self> {
        let os = HostOs::from_rust_os(std::env::consts::OS);
        let cpu = CpuArch::from_rust_arch(std::env::consts::ARCH);

        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let mac_release = if os == HostOs::Darwin {
            Some(detect_mac_release()?)
        } else {
            None
        };

        let profile = Self {
            os,
            cpu,
            mac_release,
            hostname,
        };
        tracing::debug!(?profile, "detected host platform");
        Ok(profile)
    }

    /// Lowercase platform name used in shell file names.
    pub fn platform_name(&self) -> String {
        match &self.os {
            HostOs::Linux => "linux".to_string(),
            HostOs::Darwin => "darwin".to_string(),
            HostOs::Windows => "windows".to_string(),
            HostOs::Other(name) => name.to_lowercase(),
        }
    }

    /// Executable suffix for binaries built on this platform.
    pub fn exe_suffix(&self) -> &'static str {
        if self.os.is_windows() { ".exe" } else { "" }
    }

    /// Path separator of the platform.
    pub fn path_separator(&self) -> char {
        if self.os.is_windows() { '\\' } else { '/' }
    }

    pub fn is_mac(&self) -> bool {
        self.os == HostOs::Darwin
    }

    pub fn is_tegra(&self) -> bool {
        self.hostname == TEGRA_HOSTNAME
    }

    /// Linux on anything but a 32-bit ARM board.
    pub fn is_linux_desktop(&self) -> bool {
        self.os == HostOs::Linux && self.cpu != CpuArch::Armv7
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, host {})", self.platform_name(), self.cpu, self.hostname)?;
        if let Some(release) = self.mac_release {
            write!(f, " {:?}", release)?;
        }
        Ok(())
    }
}

fn detect_mac_release() -> Result<MacRelease> {
    let output = Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .map_err(|e| ForgeError::Configuration(format!("failed to execute sw_vers: {}", e)))?;

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    MacRelease::from_product_version(&version).ok_or_else(|| {
        ForgeError::Configuration(format!(
            "unsupported macOS release '{}': 10.6 or later is required",
            version
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_mac_release_parsing() {
        assert_eq!(
            MacRelease::from_product_version("10.6.8"),
            Some(MacRelease::SnowLeopard)
        );
        assert_eq!(MacRelease::from_product_version("10.7"), Some(MacRelease::Lion));
        assert_eq!(MacRelease::from_product_version("10.15.7"), Some(MacRelease::Lion));
        assert_eq!(MacRelease::from_product_version("14.2.1"), Some(MacRelease::Lion));
        assert_eq!(MacRelease::from_product_version("10.5.8"), None);
        assert_eq!(MacRelease::from_product_version("garbage"), None);
    }

    #[test]
    fn test_platform_names_and_suffixes() {
        let linux = PlatformProfile::new(HostOs::Linux, CpuArch::X86_64, None, "box");
        assert_eq!(linux.platform_name(), "linux");
        assert_eq!(linux.exe_suffix(), "");
        assert_eq!(linux.path_separator(), '/');

        let windows = PlatformProfile::new(HostOs::Windows, CpuArch::X86_64, None, "box");
        assert_eq!(windows.platform_name(), "windows");
        assert_eq!(windows.exe_suffix(), ".exe");
        assert_eq!(windows.path_separator(), '\\');

        let bsd = PlatformProfile::new(HostOs::Other("FreeBSD".into()), CpuArch::X86_64, None, "b");
        assert_eq!(bsd.platform_name(), "freebsd");
    }

    #[test]
    fn test_linux_desktop_excludes_arm() {
        let arm = PlatformProfile::new(HostOs::Linux, CpuArch::Armv7, None, "board");
        assert!(!arm.is_linux_desktop());
        assert!(!arm.is_tegra());

        let tegra = PlatformProfile::new(HostOs::Linux, CpuArch::Armv7, None, TEGRA_HOSTNAME);
        assert!(tegra.is_tegra());
    }

    #[test]
    #[serial]
    fn test_detect_matches_compile_target() {
        // macOS hosts additionally need sw_vers, which is always present there.
        let profile = PlatformProfile::detect().unwrap();
        assert_eq!(profile.os, HostOs::from_rust_os(std::env::consts::OS));
        assert!(!profile.hostname.is_empty());
    }
}
