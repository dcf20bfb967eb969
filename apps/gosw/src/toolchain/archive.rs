//! Archive extraction for installed Go versions.
//!
//! Go is distributed as `.zip` on Windows and `.tar.gz` elsewhere; single
//! files occasionally ship as plain gzip. The format is chosen from the file
//! name alone, see [`ArchiveFormat::from_path`].
//!
//! Extraction streams every entry straight to disk. A failure part-way
//! through leaves whatever was already written in place, and extracting the
//! same archive again simply overwrites matching paths.

use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::errors::{GoswError, GoswResult, IoContext};

/// Container formats understood by [`extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// ZIP container.
    Zip,
    /// Tar stream compressed with gzip (`.tar.gz`, `.tgz`).
    TarGz,
    /// A single gzip-compressed file (`.gz`, `.gzip`).
    Gzip,
}

impl ArchiveFormat {
    /// Picks the format from the file name suffix.
    ///
    /// The check order matters: `.tar.gz` must win over the plain `.gz`
    /// suffix it ends with.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".gzip") || name.ends_with(".gz") {
            Some(Self::Gzip)
        } else {
            None
        }
    }

    /// Returns a short display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::Gzip => "gzip",
        }
    }
}

/// Extracts `source` into `dest_dir`, dispatching on the file name suffix.
///
/// Unsupported suffixes fail before anything is written; the destination
/// directory is not even created.
///
/// # Errors
///
/// Returns an error if:
/// - The suffix is not `.zip`, `.tar.gz`/`.tgz` or `.gz`/`.gzip`
/// - The archive cannot be opened or decoded
/// - An entry path is absolute or climbs out of `dest_dir`
/// - Directory or file creation fails
pub fn extract(source: &Path, dest_dir: &Path) -> GoswResult<()> {
    let format =
        ArchiveFormat::from_path(source).ok_or_else(|| GoswError::unsupported_format(source))?;

    tracing::debug!(
        source = %source.display(),
        dest = %dest_dir.display(),
        format = format.as_str(),
        "extracting archive"
    );

    match format {
        ArchiveFormat::Zip => extract_zip(source, dest_dir),
        ArchiveFormat::TarGz => extract_tar_gz(source, dest_dir),
        ArchiveFormat::Gzip => extract_gzip(source, dest_dir).map(|_| ()),
    }
}

/// Extracts a ZIP archive, preserving entry paths as stored.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> GoswResult<()> {
    let file = File::open(archive_path)
        .io_context(|| format!("failed to open archive {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|err| zip_error(err, &format!("failed to read {}", archive_path.display())))?;

    std::fs::create_dir_all(dest_dir)
        .io_context(|| format!("failed to create directory {}", dest_dir.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| zip_error(err, &format!("failed to read archive entry {i}")))?;

        let entry_path = entry.enclosed_name().ok_or_else(|| {
            GoswError::invalid_archive(format!(
                "refusing to extract unsafe path {:?}",
                entry.name()
            ))
        })?;
        ensure_relative(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path)
                .io_context(|| format!("failed to create directory {}", output_path.display()))?;
            continue;
        }

        create_parent(&output_path)?;
        let mut outfile = File::create(&output_path)
            .io_context(|| format!("failed to create file {}", output_path.display()))?;
        io::copy(&mut entry, &mut outfile)
            .io_context(|| format!("failed to extract {}", output_path.display()))?;

        if let Some(mode) = entry.unix_mode() {
            apply_mode(&output_path, mode);
        }
    }

    Ok(())
}

/// Extracts a gzip-compressed tar archive, preserving entry paths as stored.
///
/// Entries that are neither directories nor regular files (symlinks, device
/// nodes, fifos) are skipped with a warning.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> GoswResult<()> {
    let file = File::open(archive_path)
        .io_context(|| format!("failed to open archive {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    std::fs::create_dir_all(dest_dir)
        .io_context(|| format!("failed to create directory {}", dest_dir.display()))?;

    let entries = archive
        .entries()
        .io_context(|| format!("failed to read tar entries from {}", archive_path.display()))?;

    for entry in entries {
        let mut entry = entry
            .io_context(|| format!("failed to read tar entry from {}", archive_path.display()))?;

        let entry_path = entry
            .path()
            .io_context(|| "failed to decode tar entry path")?
            .into_owned();
        ensure_relative(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);
        let entry_type = entry.header().entry_type();

        match entry_type {
            EntryType::Directory => {
                std::fs::create_dir_all(&output_path).io_context(|| {
                    format!("failed to create directory {}", output_path.display())
                })?;
            }
            EntryType::Regular | EntryType::Continuous => {
                create_parent(&output_path)?;
                let mut outfile = File::create(&output_path)
                    .io_context(|| format!("failed to create file {}", output_path.display()))?;
                io::copy(&mut entry, &mut outfile)
                    .io_context(|| format!("failed to extract {}", output_path.display()))?;

                if let Ok(mode) = entry.header().mode() {
                    apply_mode(&output_path, mode);
                }
            }
            other => {
                tracing::warn!(
                    path = %entry_path.display(),
                    entry_type = ?other,
                    "skipping unsupported tar entry type"
                );
            }
        }
    }

    Ok(())
}

/// Decompresses a single gzip file into `dest_dir`.
///
/// The output keeps the source file name minus its `.gz`/`.gzip` suffix,
/// so `notes.txt.gz` becomes `dest_dir/notes.txt`. Returns the written path.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_gzip(source: &Path, dest_dir: &Path) -> GoswResult<PathBuf> {
    let output_name = gzip_output_name(source).ok_or_else(|| {
        GoswError::invalid_archive(format!(
            "cannot derive an output file name from {}",
            source.display()
        ))
    })?;

    let file =
        File::open(source).io_context(|| format!("failed to open archive {}", source.display()))?;
    let mut decoder = GzDecoder::new(file);

    std::fs::create_dir_all(dest_dir)
        .io_context(|| format!("failed to create directory {}", dest_dir.display()))?;

    let output_path = dest_dir.join(output_name);
    let mut outfile = File::create(&output_path)
        .io_context(|| format!("failed to create file {}", output_path.display()))?;
    io::copy(&mut decoder, &mut outfile)
        .io_context(|| format!("failed to decompress {}", source.display()))?;

    Ok(output_path)
}

/// Strips `.gz` / `.gzip` from the source file name.
fn gzip_output_name(source: &Path) -> Option<String> {
    let name = source.file_name()?.to_string_lossy().into_owned();
    let lower = name.to_ascii_lowercase();
    let stem_len = if lower.ends_with(".gzip") {
        name.len() - ".gzip".len()
    } else if lower.ends_with(".gz") {
        name.len() - ".gz".len()
    } else {
        name.len()
    };
    let stem = &name[..stem_len];
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Rejects absolute entry paths and paths containing `..`.
fn ensure_relative(entry_path: &Path) -> GoswResult<()> {
    let escapes = entry_path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(GoswError::invalid_archive(format!(
            "refusing to extract path with parent directory or absolute reference: {}",
            entry_path.display()
        )));
    }
    Ok(())
}

fn create_parent(path: &Path) -> GoswResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .io_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn zip_error(err: zip::result::ZipError, message: &str) -> GoswError {
    match err {
        zip::result::ZipError::Io(source) => GoswError::io(message, source),
        other => GoswError::invalid_archive(format!("{message}: {other}")),
    }
}

/// Applies stored permission bits; failures are logged and ignored.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    let permissions = std::fs::Permissions::from_mode(mode & 0o7777);
    if let Err(err) = std::fs::set_permissions(path, permissions) {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "failed to apply archived permissions"
        );
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) {}
