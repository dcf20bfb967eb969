#![warn(clippy::pedantic)]

//! # gosw
//!
//! Keeps several Go toolchains side by side under `~/.go-switch` and
//! switches the active one by rewriting a small environment file that the
//! shell startup file sources.
//!
//! ## Subcommands
//!
//! - `switch` - Activate an installed version (interactive without argument)
//! - `install` - Install a version from an archive or URL
//! - `list` - List installed versions
//!
//! ## Examples
//!
//! ```bash
//! gosw install https://go.dev/dl/go1.21.5.linux-amd64.tar.gz
//! gosw switch 1.21.5
//! gosw list
//! ```

mod commands;
mod errors;
mod logging;
mod toolchain;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{Session, install, list, switch};

/// Go toolchain version switcher.
#[derive(Parser)]
#[command(
    name = "gosw",
    author,
    version,
    about = "Install Go toolchains side by side and switch between them",
    after_help = "\
ENVIRONMENT VARIABLES:
    GO_SWITCH_HOME          Install root (default: ~/.go-switch)
    GO_SWITCH_ENV_FILE      Environment file rewritten on switch (default: <root>/env)
    GOSW_LOG                Log filter, e.g. 'debug' (default: warn)"
)]
pub struct Cli {
    /// Print debug diagnostics to stderr.
    #[clap(short, long, global = true, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the gosw CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Activate an installed Go version.
    ///
    /// Rewrites the environment file with GOROOT and PATH for the chosen
    /// version. On first use the shell startup file is made to source it.
    Switch(switch::SwitchArgs),

    /// Install a Go version from an archive or URL.
    Install(install::InstallArgs),

    /// List installed Go versions.
    ///
    /// The active version is marked with an asterisk.
    List,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut session = Session::open()?;

    match cli.command {
        Commands::Switch(args) => switch::execute(&args, &mut session),
        Commands::Install(args) => install::execute(&args, &mut session).await,
        Commands::List => list::execute(&session),
    }
}
