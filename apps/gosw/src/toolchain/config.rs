//! The persisted version store.
//!
//! `config.toml` lives in the install root:
//!
//! ```toml
//! go_switch_path = "/home/gopher/.go-switch"
//! init = true
//! go_root = "/home/gopher/.go-switch/gos/1.21"
//!
//! [[local_gos]]
//! version = "1.21"
//! path = "/home/gopher/.go-switch/gos/1.21"
//! ```
//!
//! The [`Config`] is loaded once in `main` and handed to the command that
//! needs it; only `switch` and `install` mutate it, and they save it
//! explicitly through [`ConfigStore::save`].

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{GoswError, GoswResult, IoContext};

/// One installed toolchain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Version {
    /// Unique name, usually the Go release number.
    #[serde(rename = "version")]
    pub name: String,
    /// Directory holding the unpacked toolchain (contains `bin/go`).
    pub path: PathBuf,
}

impl Version {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// In-memory view of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Install root recorded at first run.
    #[serde(rename = "go_switch_path")]
    pub switch_root: PathBuf,
    /// Whether the shell startup file has been patched.
    #[serde(rename = "init")]
    pub initialized: bool,
    /// `GOROOT` of the active version.
    #[serde(rename = "go_root", skip_serializing_if = "Option::is_none")]
    pub active_root: Option<PathBuf>,
    /// Installed versions in installation order.
    #[serde(rename = "local_gos")]
    pub versions: Vec<Version>,
}

impl Config {
    /// Looks up a version by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.name == name)
    }

    /// Names of all installed versions, in store order.
    #[must_use]
    pub fn version_names(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.name.clone()).collect()
    }

    /// The version whose path equals the active root, if any.
    #[must_use]
    pub fn active_version(&self) -> Option<&Version> {
        let root = self.active_root.as_deref()?;
        self.versions.iter().find(|v| v.path == root)
    }

    /// Records a newly installed version.
    ///
    /// # Errors
    ///
    /// Returns [`GoswError::AlreadyInstalled`] if the name is taken.
    pub fn add_version(&mut self, version: Version) -> GoswResult<()> {
        if self.find(&version.name).is_some() {
            return Err(GoswError::already_installed(version.name));
        }
        self.versions.push(version);
        Ok(())
    }
}

/// Reads and writes `config.toml` for one install root.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    root: PathBuf,
}

impl ConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config, falling back to a first-run default if the file does
    /// not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`GoswError::Io`] if the file exists but cannot be read and
    /// [`GoswError::ConfigCorrupt`] if it cannot be decoded.
    pub fn load(&self) -> GoswResult<Config> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file, using defaults");
                return Ok(Config {
                    switch_root: self.root.clone(),
                    ..Config::default()
                });
            }
            Err(e) => {
                return Err(GoswError::io(
                    format!("failed to read {}", self.path.display()),
                    e,
                ));
            }
        };

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| GoswError::config_corrupt(&self.path, e.message()))?;

        if config.switch_root.as_os_str().is_empty() {
            config.switch_root.clone_from(&self.root);
        }
        if config
            .active_root
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            config.active_root = None;
        }

        tracing::debug!(
            path = %self.path.display(),
            versions = config.versions.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Writes the config atomically (temporary file, fsync, rename).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save(&self, config: &Config) -> GoswResult<()> {
        let content = toml::to_string_pretty(config)
            .map_err(|e| GoswError::config_corrupt(&self.path, e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .io_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let temp_path = self.temp_path();
        let mut file = std::fs::File::create(&temp_path)
            .io_context(|| format!("failed to create {}", temp_path.display()))?;
        file.write_all(content.as_bytes())
            .io_context(|| format!("failed to write {}", temp_path.display()))?;
        file.sync_all()
            .io_context(|| format!("failed to sync {}", temp_path.display()))?;
        drop(file);

        std::fs::rename(&temp_path, &self.path).io_context(|| {
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        tracing::debug!(path = %self.path.display(), "saved config");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
