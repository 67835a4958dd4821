//! Exit code constants for the shellforge CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unreadable config, refused checkout state)
//! - 2: Configuration error (profile maps to no legal switch combination)
//! - 3: Build failure (no artifact, external build tool failure)
//! - 4: Version control failure
//! - 5: Classification failure (unexpected probe exit code, probe not spawnable)
//! - 6: Verification mismatch (binary does not match build intent)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or refused checkout state.
pub const USER_ERROR: i32 = 1;

/// The requested build profile cannot be configured on this platform.
pub const CONFIGURATION_FAILURE: i32 = 2;

/// The external build did not yield a usable binary.
pub const BUILD_FAILURE: i32 = 3;

/// Mercurial operation failure: identify, update, patch queue errors.
pub const VCS_FAILURE: i32 = 4;

/// The binary under test could not be classified.
pub const CLASSIFICATION_FAILURE: i32 = 5;

/// The binary was classified but does not match what was requested.
pub const VERIFICATION_FAILURE: i32 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            CONFIGURATION_FAILURE,
            BUILD_FAILURE,
            VCS_FAILURE,
            CLASSIFICATION_FAILURE,
            VERIFICATION_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn success_is_zero() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
    }
}
