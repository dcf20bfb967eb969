//! The switch flow: selection, environment update, persistence.
//!
//! A switch walks through these states, logging each transition at `debug`:
//!
//! ```text
//! Idle -> VersionChosen -> PlatformChecked -> EnvironmentPatched -> ConfigPersisted
//! ```
//!
//! Choosing the exit sentinel, an unsupported platform or any failure while
//! patching files returns early, and the config is not written. Files
//! already patched when a later step fails are left as they are.

use std::path::{Path, PathBuf};

use crate::errors::{GoswError, GoswResult};
use crate::toolchain::config::{Config, ConfigStore};
use crate::toolchain::env_file::{self, ShellReloader};
use crate::toolchain::platform::PlatformProfile;
use crate::toolchain::selector::{EXIT_SENTINEL, VersionSelector};

const PROMPT: &str = "Select the Go version to activate";

/// What a completed [`Switcher::run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The exit sentinel was chosen; nothing changed.
    Cancelled,
    Switched {
        version: String,
        root: PathBuf,
        /// Shell startup file that now sources the environment file.
        startup_file: Option<PathBuf>,
    },
}

/// Drives one switch for a resolved platform.
pub struct Switcher<'a> {
    profile: &'a PlatformProfile,
    versions_dir: PathBuf,
    env_file: Option<PathBuf>,
    reloader: &'a dyn ShellReloader,
}

impl<'a> Switcher<'a> {
    #[must_use]
    pub fn new(
        profile: &'a PlatformProfile,
        versions_dir: impl Into<PathBuf>,
        env_file: Option<PathBuf>,
        reloader: &'a dyn ShellReloader,
    ) -> Self {
        Self {
            profile,
            versions_dir: versions_dir.into(),
            env_file,
            reloader,
        }
    }

    /// Runs the switch.
    ///
    /// `config` is only updated once the new state has been saved through
    /// `store`.
    ///
    /// # Errors
    ///
    /// - [`GoswError::VersionNotFound`] if the selection names no stored version
    /// - [`GoswError::NotSupportedPlatform`] if switching is disabled on this OS
    /// - [`GoswError::Io`] or [`GoswError::Subprocess`] if patching fails
    pub fn run(
        &self,
        config: &mut Config,
        store: &ConfigStore,
        selector: &mut dyn VersionSelector,
    ) -> GoswResult<SwitchOutcome> {
        let mut options = config.version_names();
        options.push(EXIT_SENTINEL.to_string());

        let choice = selector.select(PROMPT, &options)?;
        if choice == EXIT_SENTINEL {
            tracing::debug!("exit selected, nothing to do");
            return Ok(SwitchOutcome::Cancelled);
        }
        if config.find(&choice).is_none() {
            return Err(GoswError::version_not_found(choice));
        }
        tracing::debug!(version = %choice, "state: version chosen");

        let root = self.versions_dir.join(&choice);
        if !self.profile.switch_supported {
            return Err(GoswError::not_supported_platform(self.profile.os.as_str()));
        }
        tracing::debug!(root = %root.display(), "state: platform checked");

        let startup_file = self.patch_environment(config.initialized, &root)?;
        tracing::debug!(startup = ?startup_file, "state: environment patched");

        let mut updated = config.clone();
        updated.active_root = Some(root.clone());
        if startup_file.is_some() {
            updated.initialized = true;
        }
        store.save(&updated)?;
        *config = updated;
        tracing::debug!("state: config persisted");

        Ok(SwitchOutcome::Switched {
            version: choice,
            root,
            startup_file,
        })
    }

    fn patch_environment(&self, initialized: bool, root: &Path) -> GoswResult<Option<PathBuf>> {
        if let Some(env_file) = &self.env_file {
            env_file::write_directives(env_file, &env_file::go_env_directives(root))?;
        }

        if initialized {
            return Ok(None);
        }
        let Some(shell) = self.profile.shell else {
            tracing::debug!("unknown shell, skipping startup file");
            return Ok(None);
        };

        let startup = self.profile.startup_file(shell);
        if startup.is_file() {
            self.reloader.reload(shell, &startup)?;
        } else {
            tracing::debug!(file = %startup.display(), "startup file missing, skipping reload");
        }

        let Some(env_file) = &self.env_file else {
            return Ok(None);
        };
        env_file::ensure_line(&startup, &env_file::source_directive(env_file))?;
        Ok(Some(startup))
    }
}
