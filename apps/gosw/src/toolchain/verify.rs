//! SHA-256 verification of downloaded or local Go archives.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::errors::{GoswError, GoswResult, IoContext};

/// Verifies that a file matches the expected SHA-256 checksum.
///
/// `expected` is compared case-insensitively after trimming whitespace.
///
/// # Errors
///
/// Returns [`GoswError::Io`] if the file cannot be read and
/// [`GoswError::ChecksumMismatch`] if the digests differ.
pub fn verify_checksum(file_path: &Path, expected: &str) -> GoswResult<()> {
    let computed = compute_sha256(file_path)?;
    let expected = expected.trim().to_lowercase();

    if computed != expected {
        return Err(GoswError::checksum_mismatch(expected, computed));
    }

    tracing::debug!(file = %file_path.display(), "checksum verified");
    Ok(())
}

/// Computes the SHA-256 hash of a file as a lowercase hex string.
///
/// # Errors
///
/// Returns [`GoswError::Io`] if the file cannot be opened or read.
pub fn compute_sha256(file_path: &Path) -> GoswResult<String> {
    let mut file = std::fs::File::open(file_path)
        .io_context(|| format!("failed to open {} for checksum", file_path.display()))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .io_context(|| format!("failed to read {} for checksum", file_path.display()))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello world")
    const HELLO_SHA: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn write_hello(temp: &assert_fs::TempDir) -> std::path::PathBuf {
        let path = temp.path().join("go1.21.linux-amd64.tar.gz");
        std::fs::write(&path, b"hello world").unwrap();
        path
    }

    #[test]
    fn compute_sha256_known_value() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = write_hello(&temp);

        assert_eq!(compute_sha256(&path).unwrap(), HELLO_SHA);
    }

    #[test]
    fn compute_sha256_empty_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(
            compute_sha256(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_accepts_uppercase_and_whitespace() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = write_hello(&temp);

        verify_checksum(&path, &format!("  {}\n", HELLO_SHA.to_uppercase())).unwrap();
    }

    #[test]
    fn verify_reports_mismatch() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = write_hello(&temp);

        let err = verify_checksum(&path, "0000").expect_err("Should mismatch");

        match err {
            GoswError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, "0000");
                assert_eq!(actual, HELLO_SHA);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = compute_sha256(&temp.path().join("missing")).expect_err("Should fail");
        assert!(matches!(err, GoswError::Io { .. }));
    }
}
