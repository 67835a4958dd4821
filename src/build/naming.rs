//! Destination naming of compiled shells.

use crate::platform::PlatformProfile;
use crate::profile::{BuildMode, WordWidth};

/// Marker token for shells configured with the memory checker.
pub const MEMCHECK_MARKER: &str = "vg";

/// `js-<mode>-<width>[-vg][-<extra id>]-<platform>`, plus `.exe` on Windows.
///
/// Empty tokens are dropped, so an empty extra id does not leave a double
/// delimiter behind.
pub fn shell_name(
    width: WordWidth,
    mode: BuildMode,
    memcheck: bool,
    extra_id: Option<&str>,
    platform: &PlatformProfile,
) -> String {
    let platform_name = platform.platform_name();
    let tokens = [
        "js",
        mode.as_str(),
        width.as_str(),
        if memcheck { MEMCHECK_MARKER } else { "" },
        extra_id.unwrap_or("").trim(),
        platform_name.as_str(),
    ];

    let stem = tokens
        .iter()
        .filter(|t| !t.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-");

    format!("{}{}", stem, platform.exe_suffix())
}
