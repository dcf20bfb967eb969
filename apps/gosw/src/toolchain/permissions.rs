//! Per-platform handling of directory permissions and visibility.
//!
//! Directory creation code never branches on the OS itself; it is handed a
//! [`PermissionStrategy`] built once from the [`OsKind`].

use std::path::Path;

use crate::errors::{GoswError, GoswResult};
use crate::toolchain::platform::OsKind;

/// Capability set applied to directories gosw creates.
pub trait PermissionStrategy {
    /// Makes `path` accessible to the owner (and readable/executable by others).
    ///
    /// # Errors
    ///
    /// Returns [`GoswError::Io`] if the permissions cannot be changed.
    fn set_permissions(&self, path: &Path) -> GoswResult<()>;

    /// Hides `path` from default directory listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute cannot be applied.
    fn set_hidden(&self, path: &Path) -> GoswResult<()>;
}

/// Unix hosts: `0o755` permissions; dot-prefixed names are already hidden.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixPermissions;

impl PermissionStrategy for UnixPermissions {
    #[cfg(unix)]
    fn set_permissions(&self, path: &Path) -> GoswResult<()> {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| GoswError::io(format!("failed to set permissions on {}", path.display()), e))
    }

    #[cfg(not(unix))]
    fn set_permissions(&self, _path: &Path) -> GoswResult<()> {
        Ok(())
    }

    fn set_hidden(&self, _path: &Path) -> GoswResult<()> {
        Ok(())
    }
}

/// Windows hosts: ACL defaults are kept; hiding uses `attrib +h`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPermissions;

impl PermissionStrategy for WindowsPermissions {
    fn set_permissions(&self, _path: &Path) -> GoswResult<()> {
        Ok(())
    }

    fn set_hidden(&self, path: &Path) -> GoswResult<()> {
        let status = std::process::Command::new("attrib")
            .arg("+h")
            .arg(path)
            .status()
            .map_err(|e| GoswError::subprocess(format!("failed to run attrib: {e}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(GoswError::subprocess(format!(
                "attrib +h {} failed ({status})",
                path.display()
            )))
        }
    }
}

/// Returns the strategy matching `os`.
#[must_use]
pub fn for_os(os: OsKind) -> Box<dyn PermissionStrategy> {
    match os {
        OsKind::Windows => Box::new(WindowsPermissions),
        OsKind::Linux | OsKind::MacOs => Box::new(UnixPermissions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn unix_strategy_sets_0755() {
        use std::os::unix::fs::PermissionsExt;

        let temp = assert_fs::TempDir::new().unwrap();
        let dir = temp.path().join("gos");
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700)).unwrap();

        UnixPermissions.set_permissions(&dir).unwrap();

        let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn unix_hidden_is_noop() {
        let temp = assert_fs::TempDir::new().unwrap();
        UnixPermissions.set_hidden(temp.path()).unwrap();
        assert!(temp.path().exists());
    }

    #[test]
    fn windows_permissions_are_noop() {
        let temp = assert_fs::TempDir::new().unwrap();
        WindowsPermissions.set_permissions(temp.path()).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn unix_set_permissions_on_missing_path_is_io_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = UnixPermissions
            .set_permissions(&temp.path().join("missing"))
            .expect_err("Should fail");
        assert!(matches!(err, GoswError::Io { .. }));
    }
}
