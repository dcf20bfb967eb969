//! Materializing a Go archive as an installed version.
//!
//! Archives are unpacked into `gos/.staging-<name>` first. Official Go
//! releases wrap everything in a single `go/` directory; when the staging
//! directory holds exactly one directory, that directory is moved to
//! `gos/<name>`, otherwise the staging directory itself is.

use std::path::{Path, PathBuf};

use crate::errors::{GoswError, GoswResult, IoContext};
use crate::toolchain::archive;
use crate::toolchain::paths::SwitchPaths;
use crate::toolchain::permissions::PermissionStrategy;
use crate::toolchain::selector::EXIT_SENTINEL;

/// Derives a version name from an archive file name.
///
/// `go1.21.5.linux-amd64.tar.gz` gives `1.21.5` and `go1.22rc1.darwin-arm64.zip`
/// gives `1.22rc1`. Returns `None` for names that do not follow the Go
/// release naming scheme.
#[must_use]
pub fn infer_version_name(file_name: &str) -> Option<String> {
    let rest = file_name.strip_prefix("go")?;
    let parts: Vec<&str> = rest
        .split('.')
        .take_while(|part| part.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

/// Checks that `name` can be used as a directory name and selection entry.
///
/// # Errors
///
/// Returns [`GoswError::InvalidArguments`] for empty names, names containing
/// path separators, names starting with `.`, and the exit sentinel.
pub fn validate_version_name(name: &str) -> GoswResult<()> {
    let reason = if name.trim().is_empty() {
        Some("version name must not be empty")
    } else if name.contains(['/', '\\']) {
        Some("version name must not contain path separators")
    } else if name.starts_with('.') {
        Some("version name must not start with '.'")
    } else if name == EXIT_SENTINEL {
        Some("'exit' is reserved")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(GoswError::invalid_arguments(format!("{reason}: {name:?}"))),
        None => Ok(()),
    }
}

/// Extracts `archive_path` and moves the toolchain to `gos/<name>`.
///
/// Returns the final installation directory.
///
/// # Errors
///
/// Returns [`GoswError::AlreadyInstalled`] if `gos/<name>` already exists,
/// or any error raised while extracting or moving files. The staging
/// directory is removed on failure.
pub fn install_archive(
    archive_path: &Path,
    name: &str,
    paths: &SwitchPaths,
    strategy: &dyn PermissionStrategy,
) -> GoswResult<PathBuf> {
    validate_version_name(name)?;

    let target = paths.version_dir(name);
    if target.exists() {
        return Err(GoswError::already_installed(name));
    }

    archive::ArchiveFormat::from_path(archive_path)
        .ok_or_else(|| GoswError::unsupported_format(archive_path))?;

    let staging = paths.staging_dir(name);
    if staging.exists() {
        tracing::debug!(path = %staging.display(), "removing stale staging directory");
        std::fs::remove_dir_all(&staging)
            .io_context(|| format!("failed to remove {}", staging.display()))?;
    }

    let result = archive::extract(archive_path, &staging)
        .and_then(|()| promote(&staging, &target))
        .and_then(|()| mark_binaries_executable(&target, strategy));

    if staging.exists() {
        let _ = std::fs::remove_dir_all(&staging);
    }
    result?;

    tracing::debug!(name, path = %target.display(), "installed version");
    Ok(target)
}

fn promote(staging: &Path, target: &Path) -> GoswResult<()> {
    let entries = std::fs::read_dir(staging)
        .io_context(|| format!("failed to read {}", staging.display()))?
        .collect::<Result<Vec<_>, _>>()
        .io_context(|| format!("failed to read {}", staging.display()))?;

    let source = match entries.as_slice() {
        [single] if single.path().is_dir() => single.path(),
        _ => staging.to_path_buf(),
    };

    std::fs::rename(&source, target).io_context(|| {
        format!(
            "failed to move {} to {}",
            source.display(),
            target.display()
        )
    })
}

fn mark_binaries_executable(root: &Path, strategy: &dyn PermissionStrategy) -> GoswResult<()> {
    let bin = root.join("bin");
    if !bin.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(&bin).io_context(|| format!("failed to read {}", bin.display()))? {
        let entry = entry.io_context(|| format!("failed to read {}", bin.display()))?;
        let path = entry.path();
        if path.is_file() {
            strategy.set_permissions(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::permissions::UnixPermissions;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn paths(temp: &assert_fs::TempDir) -> SwitchPaths {
        let paths = SwitchPaths::with_root(temp.path().join(".go-switch"), None);
        std::fs::create_dir_all(&paths.versions).unwrap();
        paths
    }

    #[test]
    fn infers_release_names() {
        assert_eq!(
            infer_version_name("go1.21.5.linux-amd64.tar.gz").as_deref(),
            Some("1.21.5")
        );
        assert_eq!(
            infer_version_name("go1.22rc1.darwin-arm64.zip").as_deref(),
            Some("1.22rc1")
        );
        assert_eq!(infer_version_name("go1.20.src.tar.gz").as_deref(), Some("1.20"));
        assert_eq!(infer_version_name("toolchain.tar.gz"), None);
        assert_eq!(infer_version_name("go.tar.gz"), None);
    }

    #[test]
    fn rejects_unusable_names() {
        assert!(validate_version_name("1.21").is_ok());
        for bad in ["", "  ", "../1.21", "a\\b", ".hidden", "exit"] {
            let err = validate_version_name(bad).expect_err(bad);
            assert!(matches!(err, GoswError::InvalidArguments { .. }));
        }
    }

    #[test]
    fn single_top_level_directory_is_promoted() {
        let temp = assert_fs::TempDir::new().unwrap();
        let paths = paths(&temp);
        let archive = temp.path().join("go1.21.linux-amd64.tar.gz");
        write_tar_gz(
            &archive,
            &[("go/bin/go", b"#!/bin/sh\n"), ("go/VERSION", b"go1.21\n")],
        );

        let installed = install_archive(&archive, "1.21", &paths, &UnixPermissions).unwrap();

        assert_eq!(installed, paths.version_dir("1.21"));
        assert_eq!(
            std::fs::read_to_string(installed.join("VERSION")).unwrap(),
            "go1.21\n"
        );
        assert!(installed.join("bin/go").is_file());
        assert!(!paths.staging_dir("1.21").exists());
    }

    #[test]
    fn flat_archive_keeps_staging_contents() {
        let temp = assert_fs::TempDir::new().unwrap();
        let paths = paths(&temp);
        let archive = temp.path().join("custom.tar.gz");
        write_tar_gz(&archive, &[("bin/go", b"go"), ("VERSION", b"custom")]);

        let installed = install_archive(&archive, "custom", &paths, &UnixPermissions).unwrap();

        assert!(installed.join("bin/go").is_file());
        assert!(installed.join("VERSION").is_file());
        assert!(!paths.staging_dir("custom").exists());
    }

    #[cfg(unix)]
    #[test]
    fn binaries_become_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = assert_fs::TempDir::new().unwrap();
        let paths = paths(&temp);
        let archive = temp.path().join("go1.21.tar.gz");
        write_tar_gz(&archive, &[("go/bin/go", b"go"), ("go/bin/gofmt", b"fmt")]);

        let installed = install_archive(&archive, "1.21", &paths, &UnixPermissions).unwrap();

        for tool in ["go", "gofmt"] {
            let mode = std::fs::metadata(installed.join("bin").join(tool))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn existing_directory_is_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        let paths = paths(&temp);
        std::fs::create_dir_all(paths.version_dir("1.21")).unwrap();
        let archive = temp.path().join("go1.21.tar.gz");
        write_tar_gz(&archive, &[("go/VERSION", b"go1.21")]);

        let err = install_archive(&archive, "1.21", &paths, &UnixPermissions)
            .expect_err("Should refuse to overwrite");

        assert!(matches!(err, GoswError::AlreadyInstalled { .. }));
    }

    #[test]
    fn unsupported_archive_writes_nothing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let paths = paths(&temp);
        let archive = temp.path().join("go1.21.rar");
        std::fs::write(&archive, b"rar").unwrap();

        let err = install_archive(&archive, "1.21", &paths, &UnixPermissions)
            .expect_err("Should reject .rar");

        assert!(matches!(err, GoswError::UnsupportedFormat { .. }));
        assert_eq!(std::fs::read_dir(&paths.versions).unwrap().count(), 0);
    }

    #[test]
    fn failed_extraction_cleans_staging() {
        let temp = assert_fs::TempDir::new().unwrap();
        let paths = paths(&temp);
        let archive = temp.path().join("go1.21.tar.gz");
        std::fs::write(&archive, b"not gzip at all").unwrap();

        assert!(install_archive(&archive, "1.21", &paths, &UnixPermissions).is_err());
        assert!(!paths.staging_dir("1.21").exists());
        assert!(!paths.version_dir("1.21").exists());
    }
}
