//! Well-known credential file locations and their permission check.

use std::path::{Path, PathBuf};

/// Name of the per-user credential file in the home directory.
pub const USER_CREDENTIALS_FILE: &str = ".mongo_credentials";

/// System-wide credential file.
pub const SERVER_CREDENTIALS_PATH: &str = "/etc/mongo_credentials";

/// Get the path to the user's credential file (`~/.mongo_credentials`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn user_credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(USER_CREDENTIALS_FILE))
}

/// Get the path to the system-wide credential file.
pub fn server_credentials_path() -> PathBuf {
    PathBuf::from(SERVER_CREDENTIALS_PATH)
}

/// A credential file that is readable beyond its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionWarning {
    /// The group read bit is set.
    GroupReadable,
    /// The world read bit is set.
    OthersReadable,
}

/// Check that a credential file is only readable by its owner.
///
/// Each offending bit is logged as a warning with the `chmod` that fixes it
/// and returned to the caller. A missing file, or a non-Unix platform, yields
/// no warnings.
#[cfg(unix)]
pub fn check_permissions(path: &Path) -> Vec<PermissionWarning> {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = std::fs::metadata(path) else {
        return Vec::new();
    };
    let mode = metadata.permissions().mode();

    let mut warnings = Vec::new();
    if mode & 0o040 != 0 {
        tracing::warn!(
            "{0} is readable by the group. It should only be readable by the user. \
             Fix by running:\nchmod 600 \"{0}\"",
            path.display()
        );
        warnings.push(PermissionWarning::GroupReadable);
    }
    if mode & 0o004 != 0 {
        tracing::warn!(
            "{0} is readable by others. It should only be readable by the user. \
             Fix by running:\nchmod 600 \"{0}\"",
            path.display()
        );
        warnings.push(PermissionWarning::OthersReadable);
    }
    warnings
}

#[cfg(not(unix))]
pub fn check_permissions(_path: &Path) -> Vec<PermissionWarning> {
    Vec::new()
}
