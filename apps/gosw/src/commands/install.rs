//! Install command for the gosw CLI.
//!
//! Installs a Go toolchain from a local archive or a download URL.
//!
//! ## Usage
//!
//! ```bash
//! gosw install ./go1.21.5.linux-amd64.tar.gz
//! gosw install https://go.dev/dl/go1.22.3.darwin-arm64.tar.gz --sha256 <hex>
//! gosw install ./custom-go.zip --name custom
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::Session;
use crate::errors::GoswError;
use crate::toolchain::archive::ArchiveFormat;
use crate::toolchain::config::Version;
use crate::toolchain::download::{download_file, file_name_from_url, is_url};
use crate::toolchain::install::{infer_version_name, install_archive, validate_version_name};
use crate::toolchain::verify::verify_checksum;

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Archive path or http(s) URL (.zip, .tar.gz, .tgz, .gz).
    pub source: String,

    /// Name to register the version under.
    ///
    /// Defaults to the release number in the file name, e.g. "1.21.5" for
    /// go1.21.5.linux-amd64.tar.gz.
    #[clap(long)]
    pub name: Option<String>,

    /// Expected SHA-256 of the archive.
    #[clap(long)]
    pub sha256: Option<String>,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Work out the version name and reject duplicates
/// 2. Download the archive if the source is a URL
/// 3. Verify the SHA-256 checksum when one is given
/// 4. Extract to the versions directory
/// 5. Record the version in the config
///
/// # Errors
///
/// Returns an error if:
/// - No version name can be determined
/// - The version is already installed
/// - The archive format is not supported
/// - Download, checksum verification or extraction fails
pub async fn execute(args: &InstallArgs, session: &mut Session) -> Result<()> {
    let remote = is_url(&args.source);
    let file_name = if remote {
        file_name_from_url(&args.source).ok_or_else(|| {
            GoswError::invalid_arguments(format!("no file name in URL {}", args.source))
        })?
    } else {
        Path::new(&args.source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                GoswError::invalid_arguments(format!("{} is not a file", args.source))
            })?
    };

    let name = args
        .name
        .clone()
        .or_else(|| infer_version_name(&file_name))
        .ok_or_else(|| {
            GoswError::invalid_arguments(format!(
                "cannot infer a version from {file_name}, pass --name"
            ))
        })?;
    validate_version_name(&name)?;

    if session.config.find(&name).is_some() {
        return Err(GoswError::already_installed(name).into());
    }
    if ArchiveFormat::from_path(Path::new(&file_name)).is_none() {
        return Err(GoswError::unsupported_format(&file_name).into());
    }

    session.prepare_directories()?;

    let archive = if remote {
        println!("Downloading {}...", args.source);
        download_file(&args.source, &session.paths.download_path(&file_name))
            .await
            .with_context(|| format!("Failed to download {}", args.source))?
    } else {
        PathBuf::from(&args.source)
    };

    let result = install_from(&archive, &name, args.sha256.as_deref(), session);

    if remote {
        std::fs::remove_file(&archive).ok();
    }
    let path = result?;

    session.config.add_version(Version::new(&name, &path))?;
    session
        .store
        .save(&session.config)
        .context("Failed to save configuration")?;

    println!("Go {name} installed to {}", path.display());
    println!("Run 'gosw switch {name}' to activate it.");
    Ok(())
}

fn install_from(
    archive: &Path,
    name: &str,
    sha256: Option<&str>,
    session: &Session,
) -> Result<PathBuf> {
    if let Some(expected) = sha256 {
        println!("Verifying checksum...");
        verify_checksum(archive, expected)
            .with_context(|| format!("Checksum verification failed for {}", archive.display()))?;
    }

    println!("Extracting...");
    let path = install_archive(archive, name, &session.paths, session.permissions.as_ref())
        .with_context(|| format!("Failed to install {}", archive.display()))?;
    Ok(path)
}
