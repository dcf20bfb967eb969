//! Go toolchain management for the gosw CLI.
//!
//! ## Module Structure
//!
//! - [`archive`] - ZIP, tar.gz and gzip extraction
//! - [`env_file`] - Idempotent environment file patching and shell reload
//! - [`platform`] - OS and shell detection
//! - [`paths`] - Managed directory layout
//! - [`permissions`] - Per-platform directory permissions
//! - [`config`] - Persisted version store
//! - [`selector`] - Version selection prompts
//! - [`switch`] - The switch flow
//! - [`install`] - Turning an archive into an installed version
//! - [`download`] - HTTP download with progress and retries
//! - [`verify`] - SHA-256 checksum verification

pub mod archive;
pub mod config;
pub mod download;
pub mod env_file;
pub mod install;
pub mod paths;
pub mod permissions;
pub mod platform;
pub mod selector;
pub mod switch;
pub mod verify;
