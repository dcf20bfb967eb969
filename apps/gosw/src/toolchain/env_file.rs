//! Idempotent patching of shell environment files.
//!
//! Two kinds of files are touched here:
//!
//! - the dedicated environment file owned by gosw, rewritten on every switch:
//!
//!   ```bash
//!   export GOROOT="/home/user/.go-switch/gos/1.21"
//!   export PATH="$PATH:/home/user/.go-switch/gos/1.21/bin"
//!   ```
//!
//! - the user's shell startup file, which only ever receives a single
//!   `source "<env file>"` line appended once.
//!
//! A directive line is identified by exact byte equality with an existing
//! line (the line terminator aside), so [`ensure_line`] can be called any
//! number of times without duplicating it.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::errors::{GoswError, GoswResult, IoContext};
use crate::toolchain::platform::ShellKind;

/// Outcome of [`ensure_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// The line was missing and has been appended.
    Appended,
    /// An identical line was already present; the file is untouched.
    AlreadyPresent,
}

impl LineStatus {
    /// Returns `true` if the file was modified.
    #[must_use]
    pub fn appended(self) -> bool {
        matches!(self, Self::Appended)
    }
}

/// Ensures `line` occurs in `path`, appending it if absent.
///
/// The file (and any missing parent directory) is created when it does not
/// exist. If the current content does not end with a newline, one is written
/// before the directive so it never fuses with the last existing line.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, read or written.
pub fn ensure_line(path: &Path, line: &str) -> GoswResult<LineStatus> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .io_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .io_context(|| format!("failed to open {}", path.display()))?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .io_context(|| format!("failed to read {}", path.display()))?;

    if contains_line(&content, line) {
        tracing::debug!(file = %path.display(), line, "directive already present");
        return Ok(LineStatus::AlreadyPresent);
    }

    let mut addition = String::with_capacity(line.len() + 2);
    if !content.is_empty() && !content.ends_with(b"\n") {
        addition.push('\n');
    }
    addition.push_str(line);
    addition.push('\n');

    file.write_all(addition.as_bytes())
        .io_context(|| format!("failed to write to {}", path.display()))?;

    tracing::debug!(file = %path.display(), line, "directive appended");
    Ok(LineStatus::Appended)
}

/// Truncates `path` (creating it if needed) and writes each line once.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_directives(path: &Path, lines: &[String]) -> GoswResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .io_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    File::create(path).io_context(|| format!("failed to truncate {}", path.display()))?;

    for line in lines {
        ensure_line(path, line)?;
    }
    Ok(())
}

/// Builds the two directives that activate the Go toolchain at `go_root`.
///
/// The path is escaped for use inside double quotes (`\`, `$`, backticks
/// and `"`).
#[must_use]
pub fn go_env_directives(go_root: &Path) -> Vec<String> {
    let escaped = escape_double_quoted(&go_root.display().to_string());
    vec![
        format!("export GOROOT=\"{escaped}\""),
        format!("export PATH=\"$PATH:{escaped}/bin\""),
    ]
}

/// Builds the line that sources `file`, quoted so paths with spaces survive.
#[must_use]
pub fn source_directive(file: &Path) -> String {
    format!(
        "source \"{}\"",
        escape_double_quoted(&file.display().to_string())
    )
}

fn escape_double_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('$', "\\$")
        .replace('`', "\\`")
        .replace('"', "\\\"")
}

fn contains_line(content: &[u8], line: &str) -> bool {
    content
        .split(|&b| b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .any(|l| l == line.as_bytes())
}

/// Re-sources a shell startup file in a child shell.
///
/// Runs `<shell> -c 'source "<config_file>"'` with stdout and stderr forwarded
/// to ours, blocking until the shell exits.
///
/// # Errors
///
/// Returns [`GoswError::Subprocess`] if the shell cannot be spawned or exits
/// with a non-zero status.
pub fn reload_shell(shell: ShellKind, config_file: &Path) -> GoswResult<()> {
    let program = shell.as_str();
    tracing::debug!(shell = program, file = %config_file.display(), "reloading shell config");

    let status = Command::new(program)
        .arg("-c")
        .arg(source_directive(config_file))
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|err| GoswError::subprocess(format!("failed to start {program}: {err}")))?;

    if !status.success() {
        return Err(GoswError::subprocess(format!(
            "{program} failed to source {} ({status})",
            config_file.display()
        )));
    }
    Ok(())
}

/// Something that can reload a shell configuration file.
///
/// The switch flow takes this as a parameter so tests can observe reloads
/// without spawning real shells.
pub trait ShellReloader {
    /// Reloads `config_file` in `shell`.
    ///
    /// # Errors
    ///
    /// Returns [`GoswError::Subprocess`] when the reload fails.
    fn reload(&self, shell: ShellKind, config_file: &Path) -> GoswResult<()>;
}

/// Reloads by spawning the real shell, see [`reload_shell`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SubprocessReloader;

impl ShellReloader for SubprocessReloader {
    fn reload(&self, shell: ShellKind, config_file: &Path) -> GoswResult<()> {
        reload_shell(shell, config_file)
    }
}
