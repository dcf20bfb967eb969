//! Path management for gosw.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.go-switch/               # Install root (or GO_SWITCH_HOME)
//!   config.toml               # Persisted version store
//!   env                       # Default environment file
//!   gos/                      # Installed Go versions
//!     1.21/
//!       bin/go
//!     1.22.3/
//!       ...
//!   downloads/                # Archives fetched by `gosw install <url>`
//! ```

use std::path::{Path, PathBuf};

use crate::errors::{GoswResult, IoContext};
use crate::toolchain::permissions::PermissionStrategy;
use crate::toolchain::platform::PlatformProfile;

/// Environment variable naming the dedicated environment file.
pub const GO_SWITCH_ENV_FILE_ENV: &str = "GO_SWITCH_ENV_FILE";

const CONFIG_FILE: &str = "config.toml";
const ENV_FILE: &str = "env";
const STAGING_PREFIX: &str = ".staging-";

/// The managed directory layout under the install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPaths {
    /// Install root (`~/.go-switch` or `GO_SWITCH_HOME`).
    pub root: PathBuf,
    /// Directory containing installed versions.
    pub versions: PathBuf,
    /// Directory for downloaded archives.
    pub downloads: PathBuf,
    /// Dedicated environment file rewritten on each switch.
    pub env_file: PathBuf,
}

impl SwitchPaths {
    /// Builds the layout for `profile`, honoring `GO_SWITCH_ENV_FILE`.
    #[must_use]
    pub fn from_profile(profile: &PlatformProfile) -> Self {
        let env_override = std::env::var_os(GO_SWITCH_ENV_FILE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::with_root(profile.install_root.clone(), env_override)
    }

    /// Builds the layout under an explicit root.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: PathBuf, env_file: Option<PathBuf>) -> Self {
        Self {
            versions: root.join("gos"),
            downloads: root.join("downloads"),
            env_file: env_file.unwrap_or_else(|| root.join(ENV_FILE)),
            root,
        }
    }

    #[must_use = "returns the path without side effects"]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Directory a version named `name` is installed into.
    #[must_use = "returns the path without side effects"]
    pub fn version_dir(&self, name: &str) -> PathBuf {
        self.versions.join(name)
    }

    /// Scratch directory an archive for `name` is extracted into first.
    #[must_use = "returns the path without side effects"]
    pub fn staging_dir(&self, name: &str) -> PathBuf {
        self.versions.join(format!("{STAGING_PREFIX}{name}"))
    }

    #[must_use = "returns the path without side effects"]
    pub fn download_path(&self, filename: &str) -> PathBuf {
        self.downloads.join(filename)
    }

    /// Creates the root, `gos/` and `downloads/` if missing.
    ///
    /// Directories created by this call get `set_permissions`; a freshly
    /// created root is also hidden. Hiding is best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or its permissions
    /// cannot be set.
    pub fn ensure_directories(&self, strategy: &dyn PermissionStrategy) -> GoswResult<()> {
        if ensure_dir(&self.root, strategy)?
            && let Err(e) = strategy.set_hidden(&self.root)
        {
            tracing::warn!(path = %self.root.display(), error = %e, "failed to hide install root");
        }
        ensure_dir(&self.versions, strategy)?;
        ensure_dir(&self.downloads, strategy)?;
        Ok(())
    }
}

fn ensure_dir(path: &Path, strategy: &dyn PermissionStrategy) -> GoswResult<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(path)
        .io_context(|| format!("failed to create directory {}", path.display()))?;
    strategy.set_permissions(path)?;
    tracing::debug!(path = %path.display(), "created directory");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GoswError;
    use crate::toolchain::platform::OsKind;
    use serial_test::serial;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingStrategy {
        permissions: RefCell<Vec<PathBuf>>,
        hidden: RefCell<Vec<PathBuf>>,
    }

    impl PermissionStrategy for RecordingStrategy {
        fn set_permissions(&self, path: &Path) -> GoswResult<()> {
            self.permissions.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn set_hidden(&self, path: &Path) -> GoswResult<()> {
            self.hidden.borrow_mut().push(path.to_path_buf());
            Err(GoswError::subprocess("attrib unavailable"))
        }
    }

    #[test]
    fn with_root_layout() {
        let paths = SwitchPaths::with_root(PathBuf::from("/home/gopher/.go-switch"), None);

        assert_eq!(paths.versions, PathBuf::from("/home/gopher/.go-switch/gos"));
        assert_eq!(paths.downloads, PathBuf::from("/home/gopher/.go-switch/downloads"));
        assert_eq!(paths.env_file, PathBuf::from("/home/gopher/.go-switch/env"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/home/gopher/.go-switch/config.toml")
        );
        assert_eq!(
            paths.version_dir("1.21"),
            PathBuf::from("/home/gopher/.go-switch/gos/1.21")
        );
        assert_eq!(
            paths.staging_dir("1.21"),
            PathBuf::from("/home/gopher/.go-switch/gos/.staging-1.21")
        );
    }

    #[test]
    fn env_file_override() {
        let paths = SwitchPaths::with_root(
            PathBuf::from("/root/.go-switch"),
            Some(PathBuf::from("/etc/profile.d/go.sh")),
        );
        assert_eq!(paths.env_file, PathBuf::from("/etc/profile.d/go.sh"));
    }

    #[test]
    #[serial]
    fn from_profile_reads_env_file_variable() {
        let profile =
            PlatformProfile::from_parts(OsKind::Linux, PathBuf::from("/home/gopher"), None, None);
        // SAFETY: serialized with every other test that touches this variable.
        unsafe { std::env::set_var(GO_SWITCH_ENV_FILE_ENV, "/tmp/gosw-env") };
        let paths = SwitchPaths::from_profile(&profile);
        unsafe { std::env::remove_var(GO_SWITCH_ENV_FILE_ENV) };

        assert_eq!(paths.root, PathBuf::from("/home/gopher/.go-switch"));
        assert_eq!(paths.env_file, PathBuf::from("/tmp/gosw-env"));
    }

    #[test]
    fn ensure_directories_applies_strategy_to_new_dirs() {
        let temp = assert_fs::TempDir::new().unwrap();
        let root = temp.path().join(".go-switch");
        let paths = SwitchPaths::with_root(root.clone(), None);
        let strategy = RecordingStrategy::default();

        paths.ensure_directories(&strategy).unwrap();

        assert!(paths.versions.is_dir());
        assert!(paths.downloads.is_dir());
        assert_eq!(
            *strategy.permissions.borrow(),
            vec![root.clone(), paths.versions.clone(), paths.downloads.clone()]
        );
        assert_eq!(*strategy.hidden.borrow(), vec![root]);
    }

    #[test]
    fn ensure_directories_skips_existing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let paths = SwitchPaths::with_root(temp.path().to_path_buf(), None);
        std::fs::create_dir_all(&paths.versions).unwrap();
        let strategy = RecordingStrategy::default();

        paths.ensure_directories(&strategy).unwrap();

        assert_eq!(*strategy.permissions.borrow(), vec![paths.downloads.clone()]);
        assert!(strategy.hidden.borrow().is_empty());
    }
}
