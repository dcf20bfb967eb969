//! Error types for the gosw CLI.
//!
//! Everything under [`crate::toolchain`] returns [`GoswError`] so callers can
//! tell the failure kinds apart (an unsupported archive, a broken config file,
//! a shell that refused to reload). The command layer wraps these in
//! `anyhow::Error` with extra context before `main` prints them.

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for toolchain operations.
#[derive(Debug, Error)]
pub enum GoswError {
    /// The archive suffix is not one of the supported container formats.
    #[error("unsupported archive format: {}", path.display())]
    UnsupportedFormat {
        /// The archive that could not be dispatched.
        path: PathBuf,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A spawned shell could not be started or exited unsuccessfully.
    #[error("subprocess error: {message}")]
    Subprocess {
        /// Description of the failed invocation.
        message: String,
    },

    /// Switching the environment is not available on this operating system.
    #[error("switching Go versions is not supported on {os}")]
    NotSupportedPlatform {
        /// Name of the host operating system.
        os: String,
    },

    /// The persisted configuration exists but cannot be decoded.
    #[error("config file {} is corrupt: {message}", path.display())]
    ConfigCorrupt {
        /// The config file that failed to decode.
        path: PathBuf,
        /// Decoder diagnostic.
        message: String,
    },

    /// The archive is malformed or contains an entry that escapes the destination.
    #[error("invalid archive: {message}")]
    InvalidArchive {
        /// Description of the problem.
        message: String,
    },

    /// No installed version carries the requested name.
    #[error("Go version {version} is not installed")]
    VersionNotFound {
        /// The requested version name.
        version: String,
    },

    /// A version with the same name is already installed.
    #[error("Go version {version} is already installed")]
    AlreadyInstalled {
        /// The duplicated version name.
        version: String,
    },

    /// Checksum verification failed.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The expected checksum.
        expected: String,
        /// The actual checksum.
        actual: String,
    },

    /// Invalid command line arguments.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of what was invalid.
        message: String,
    },
}

impl GoswError {
    /// Creates a new `UnsupportedFormat` error.
    #[must_use]
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `Subprocess` error.
    #[must_use]
    pub fn subprocess(message: impl Into<String>) -> Self {
        Self::Subprocess {
            message: message.into(),
        }
    }

    /// Creates a new `NotSupportedPlatform` error.
    #[must_use]
    pub fn not_supported_platform(os: impl Into<String>) -> Self {
        Self::NotSupportedPlatform { os: os.into() }
    }

    /// Creates a new `ConfigCorrupt` error.
    #[must_use]
    pub fn config_corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidArchive` error.
    #[must_use]
    pub fn invalid_archive(message: impl Into<String>) -> Self {
        Self::InvalidArchive {
            message: message.into(),
        }
    }

    /// Creates a new `VersionNotFound` error.
    #[must_use]
    pub fn version_not_found(version: impl Into<String>) -> Self {
        Self::VersionNotFound {
            version: version.into(),
        }
    }

    /// Creates a new `AlreadyInstalled` error.
    #[must_use]
    pub fn already_installed(version: impl Into<String>) -> Self {
        Self::AlreadyInstalled {
            version: version.into(),
        }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `InvalidArguments` error.
    #[must_use]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }
}

/// Shorthand used throughout the toolchain modules.
pub type GoswResult<T> = std::result::Result<T, GoswError>;

/// Attaches a message to a `std::io::Result`, turning it into [`GoswError::Io`].
///
/// Mirrors `anyhow::Context::with_context` for the typed error.
pub trait IoContext<T> {
    /// Wraps the error with a lazily built message.
    ///
    /// # Errors
    ///
    /// Returns [`GoswError::Io`] if `self` is an error.
    fn io_context<F, S>(self, message: F) -> GoswResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, message: F) -> GoswResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| GoswError::io(message(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_displays_path() {
        let err = GoswError::unsupported_format("/tmp/go1.21.rar");
        assert_eq!(err.to_string(), "unsupported archive format: /tmp/go1.21.rar");
    }

    #[test]
    fn io_error_keeps_source() {
        let err = GoswError::io(
            "failed to open config",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error: failed to open config");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn not_supported_platform_displays_os() {
        let err = GoswError::not_supported_platform("windows");
        assert_eq!(
            err.to_string(),
            "switching Go versions is not supported on windows"
        );
    }

    #[test]
    fn config_corrupt_displays_path_and_message() {
        let err = GoswError::config_corrupt("/home/user/.go-switch/config.toml", "bad key");
        assert_eq!(
            err.to_string(),
            "config file /home/user/.go-switch/config.toml is corrupt: bad key"
        );
    }

    #[test]
    fn version_not_found_displays_version() {
        let err = GoswError::version_not_found("1.99");
        assert_eq!(err.to_string(), "Go version 1.99 is not installed");
    }

    #[test]
    fn already_installed_displays_version() {
        let err = GoswError::already_installed("1.21");
        assert_eq!(err.to_string(), "Go version 1.21 is already installed");
    }

    #[test]
    fn checksum_mismatch_displays_both_values() {
        let err = GoswError::checksum_mismatch("abc123", "def456");
        assert_eq!(
            err.to_string(),
            "checksum mismatch: expected abc123, got def456"
        );
    }

    #[test]
    fn subprocess_displays_message() {
        let err = GoswError::subprocess("zsh exited with status 1");
        assert_eq!(err.to_string(), "subprocess error: zsh exited with status 1");
    }
}
