//! List command for the gosw CLI.
//!
//! ## Output Format
//!
//! ```text
//! Installed Go versions:
//!
//! * 1.21      /home/gopher/.go-switch/gos/1.21
//!   1.22.3    /home/gopher/.go-switch/gos/1.22.3
//! ```

use anyhow::Result;

use super::Session;

/// Executes the list command, marking the active version with an asterisk.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(session: &Session) -> Result<()> {
    let config = &session.config;

    if config.versions.is_empty() {
        println!("No Go versions installed.");
        println!();
        println!("Run 'gosw install <archive|url>' to install one.");
        return Ok(());
    }

    println!("Installed Go versions:");
    println!();

    let width = config
        .versions
        .iter()
        .map(|v| v.name.len())
        .max()
        .unwrap_or(0);
    let active = config.active_version().map(|v| v.name.as_str());

    for version in &config.versions {
        let marker = if active == Some(version.name.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<width$}    {}",
            version.name,
            version.path.display()
        );
    }

    if active.is_none() {
        println!();
        println!("No version active. Run 'gosw switch' to pick one.");
    }

    Ok(())
}
