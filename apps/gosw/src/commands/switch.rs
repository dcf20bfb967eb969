//! Switch command for the gosw CLI.
//!
//! ## Usage
//!
//! ```bash
//! gosw switch          # Pick a version interactively
//! gosw switch 1.21     # Activate 1.21 directly
//! ```

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Args;

use super::Session;
use crate::errors::GoswError;
use crate::toolchain::env_file::{SubprocessReloader, source_directive};
use crate::toolchain::selector::{FixedSelector, TerminalSelector, VersionSelector};
use crate::toolchain::switch::{SwitchOutcome, Switcher};

/// Arguments for the switch command.
#[derive(Args)]
pub struct SwitchArgs {
    /// Version to activate (e.g., "1.21"), or "exit" to do nothing.
    ///
    /// If omitted, an interactive list is shown.
    pub version: Option<String>,
}

/// Executes the switch command.
///
/// # Errors
///
/// Returns an error if:
/// - No version was given and the session is not interactive
/// - The version is not installed
/// - Switching is not supported on this platform
/// - The environment or config files cannot be written
pub fn execute(args: &SwitchArgs, session: &mut Session) -> Result<()> {
    let mut selector: Box<dyn VersionSelector> = match &args.version {
        Some(version) => Box::new(FixedSelector::new(version.clone())),
        None => {
            if session.config.versions.is_empty() {
                println!("No Go versions installed.");
                println!();
                println!("Run 'gosw install <archive|url>' to install one.");
                return Ok(());
            }
            if !(std::io::stdin().is_terminal() && std::io::stdout().is_terminal()) {
                return Err(GoswError::invalid_arguments(
                    "a VERSION is required when not running in a terminal",
                )
                .into());
            }
            Box::new(TerminalSelector)
        }
    };

    let reloader = SubprocessReloader;
    let switcher = Switcher::new(
        &session.profile,
        session.paths.versions.clone(),
        Some(session.paths.env_file.clone()),
        &reloader,
    );

    let outcome = switcher
        .run(&mut session.config, &session.store, selector.as_mut())
        .context("Failed to switch Go version")?;

    match outcome {
        SwitchOutcome::Cancelled => println!("No changes made."),
        SwitchOutcome::Switched {
            version,
            root,
            startup_file,
        } => {
            println!("Switched to Go {version} ({})", root.display());
            if let Some(startup) = startup_file {
                println!(
                    "{} now sources {}",
                    startup.display(),
                    session.paths.env_file.display()
                );
            } else if !session.config.initialized && session.profile.shell.is_none() {
                let candidates: Vec<String> = session
                    .profile
                    .shell_config_candidates()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                println!(
                    "Unrecognized shell. Add '{}' to your shell startup file ({}).",
                    source_directive(&session.paths.env_file),
                    candidates.join(" or ")
                );
            }
            println!();
            println!(
                "Run '{}' or open a new shell to use it.",
                source_directive(&session.paths.env_file)
            );
        }
    }

    Ok(())
}
