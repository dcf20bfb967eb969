//! Command modules for the gosw CLI.
//!
//! - [`switch`] - Activate an installed Go version
//! - [`install`] - Install a Go version from an archive or URL
//! - [`list`] - List installed Go versions
//!
//! Every command receives the [`Session`] built once in `main`.

pub mod install;
pub mod list;
pub mod switch;

use anyhow::{Context, Result};

use crate::toolchain::config::{Config, ConfigStore};
use crate::toolchain::paths::SwitchPaths;
use crate::toolchain::permissions::{self, PermissionStrategy};
use crate::toolchain::platform::PlatformProfile;

/// Host profile, managed layout and loaded config for one invocation.
pub struct Session {
    pub profile: PlatformProfile,
    pub paths: SwitchPaths,
    pub store: ConfigStore,
    pub config: Config,
    pub permissions: Box<dyn PermissionStrategy>,
}

impl Session {
    /// Resolves the host and loads the config without touching the disk.
    ///
    /// A missing install root is treated like a missing config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported or the config file
    /// cannot be loaded.
    pub fn open() -> Result<Self> {
        let profile = PlatformProfile::resolve().context("Failed to detect platform")?;
        let paths = SwitchPaths::from_profile(&profile);
        let permissions = permissions::for_os(profile.os);

        let store = ConfigStore::new(paths.config_file(), &paths.root);
        let config = store.load().context("Failed to load configuration")?;

        Ok(Self {
            profile,
            paths,
            store,
            config,
            permissions,
        })
    }

    /// Creates the install root, `gos/` and `downloads/` if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn prepare_directories(&self) -> Result<()> {
        self.paths
            .ensure_directories(self.permissions.as_ref())
            .with_context(|| format!("Failed to prepare {}", self.paths.root.display()))
    }
}
