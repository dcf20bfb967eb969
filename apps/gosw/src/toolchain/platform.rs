//! Platform detection for gosw.
//!
//! A [`PlatformProfile`] is resolved once at process start and answers every
//! OS-dependent question the rest of the crate has: where the install root
//! lives, which shell startup file to patch, and whether switching is
//! available at all.
//!
//! ## Supported Platforms
//!
//! - Linux: switching enabled, bash reads `~/.bashrc`
//! - macOS: switching enabled, bash reads `~/.bash_profile`
//! - Windows: install and list only, switching disabled

use std::fmt;
use std::path::PathBuf;

use crate::errors::{GoswError, GoswResult};

/// Environment variable overriding the install root.
pub const GO_SWITCH_HOME_ENV: &str = "GO_SWITCH_HOME";

/// Directory name of the install root under the home directory.
const INSTALL_DIR_NAME: &str = ".go-switch";

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsKind {
    Linux,
    MacOs,
    Windows,
}

impl OsKind {
    /// Detects the host operating system from compile-time configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GoswError::NotSupportedPlatform`] on any other host.
    pub fn detect() -> GoswResult<Self> {
        #[cfg(target_os = "linux")]
        {
            return Ok(Self::Linux);
        }

        #[cfg(target_os = "macos")]
        {
            return Ok(Self::MacOs);
        }

        #[cfg(target_os = "windows")]
        {
            return Ok(Self::Windows);
        }

        #[allow(unreachable_code)]
        {
            return Err(GoswError::not_supported_platform(std::env::consts::OS));
        }
    }

    #[must_use = "returns the OS string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shell families whose startup files gosw knows how to patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Zsh,
    Bash,
}

impl ShellKind {
    /// Classifies a `SHELL` value such as `/usr/bin/zsh`.
    ///
    /// Only the last `/`-separated segment is inspected. A segment containing
    /// `zsh` wins over one containing `bash`; anything else is unknown.
    #[must_use]
    pub fn from_path(shell: &str) -> Option<Self> {
        let name = shell.rsplit('/').next().unwrap_or(shell);
        if name.contains("zsh") {
            Some(Self::Zsh)
        } else if name.contains("bash") {
            Some(Self::Bash)
        } else {
            None
        }
    }

    /// Returns the program name used to spawn this shell.
    #[must_use = "returns the shell name without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Bash => "bash",
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything gosw needs to know about the host, derived once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    pub os: OsKind,
    pub home: PathBuf,
    pub install_root: PathBuf,
    pub shell: Option<ShellKind>,
    pub switch_supported: bool,
}

impl PlatformProfile {
    /// Resolves the profile of the running host.
    ///
    /// The install root is `GO_SWITCH_HOME` when set and non-empty, otherwise
    /// `~/.go-switch`.
    ///
    /// # Errors
    ///
    /// Returns [`GoswError::NotSupportedPlatform`] on an unknown host or when
    /// no home directory can be determined.
    pub fn resolve() -> GoswResult<Self> {
        let os = OsKind::detect()?;
        let home = home_dir(os)?;
        let shell = std::env::var("SHELL").ok();
        let root_override = std::env::var_os(GO_SWITCH_HOME_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let profile = Self::from_parts(os, home, shell.as_deref(), root_override);
        tracing::debug!(
            os = %profile.os,
            root = %profile.install_root.display(),
            shell = ?profile.shell,
            "resolved platform profile"
        );
        Ok(profile)
    }

    /// Builds a profile from explicit inputs.
    #[must_use]
    pub fn from_parts(
        os: OsKind,
        home: PathBuf,
        shell: Option<&str>,
        root_override: Option<PathBuf>,
    ) -> Self {
        let install_root = root_override.unwrap_or_else(|| home.join(INSTALL_DIR_NAME));
        Self {
            os,
            install_root,
            shell: shell.and_then(ShellKind::from_path),
            switch_supported: !matches!(os, OsKind::Windows),
            home,
        }
    }

    /// Directory holding the installed versions.
    #[must_use = "returns the path without side effects"]
    pub fn versions_dir(&self) -> PathBuf {
        self.install_root.join("gos")
    }

    /// Returns the startup file `shell` reads on this OS.
    #[must_use = "returns the path without side effects"]
    pub fn startup_file(&self, shell: ShellKind) -> PathBuf {
        match (shell, self.os) {
            (ShellKind::Zsh, _) => self.home.join(".zshrc"),
            (ShellKind::Bash, OsKind::MacOs) => self.home.join(".bash_profile"),
            (ShellKind::Bash, OsKind::Linux | OsKind::Windows) => self.home.join(".bashrc"),
        }
    }

    /// Shell startup files in lookup order (zsh first).
    #[must_use]
    pub fn shell_config_candidates(&self) -> Vec<PathBuf> {
        [ShellKind::Zsh, ShellKind::Bash]
            .into_iter()
            .map(|shell| self.startup_file(shell))
            .collect()
    }
}

fn home_dir(os: OsKind) -> GoswResult<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    if os == OsKind::Windows
        && let Some(user) = std::env::var_os("USERNAME").filter(|u| !u.is_empty())
    {
        return Ok(PathBuf::from(r"C:\Users").join(user));
    }
    Err(GoswError::not_supported_platform(format!(
        "{os} (cannot determine home directory, set {GO_SWITCH_HOME_ENV})"
    )))
}
