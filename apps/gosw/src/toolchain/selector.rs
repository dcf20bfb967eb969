//! Choosing which installed version to switch to.
//!
//! The switch flow only depends on the [`VersionSelector`] trait. `gosw
//! switch <VERSION>` uses a [`FixedSelector`]; a bare `gosw switch` on a
//! terminal uses the arrow-key driven [`TerminalSelector`].

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveToColumn, MoveUp, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use crossterm::{execute, queue};

use crate::errors::{GoswError, GoswResult, IoContext};

/// Option appended to every selection that cancels the switch.
pub const EXIT_SENTINEL: &str = "exit";

/// Picks one entry out of the offered options.
pub trait VersionSelector {
    /// Returns exactly one element of `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid choice can be made.
    fn select(&mut self, label: &str, options: &[String]) -> GoswResult<String>;
}

/// Non-interactive selector answering with a predetermined name.
#[derive(Debug, Clone)]
pub struct FixedSelector {
    choice: String,
}

impl FixedSelector {
    #[must_use]
    pub fn new(choice: impl Into<String>) -> Self {
        Self {
            choice: choice.into(),
        }
    }
}

impl VersionSelector for FixedSelector {
    fn select(&mut self, _label: &str, options: &[String]) -> GoswResult<String> {
        if options.iter().any(|o| *o == self.choice) {
            Ok(self.choice.clone())
        } else {
            Err(GoswError::version_not_found(self.choice.clone()))
        }
    }
}

/// Cursor state of the interactive list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    options: Vec<String>,
    selected: usize,
}

/// Result of feeding one key press to a [`ListState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Chosen(String),
}

impl ListState {
    #[must_use]
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            selected: 0,
        }
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.options.len() {
            self.selected += 1;
        }
    }

    /// Applies a key press. Escape, `q` and Ctrl-C choose the exit sentinel.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> KeyOutcome {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return KeyOutcome::Chosen(EXIT_SENTINEL.to_string());
        }
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
                KeyOutcome::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                KeyOutcome::Continue
            }
            KeyCode::Enter => self
                .options
                .get(self.selected)
                .map_or(KeyOutcome::Continue, |o| KeyOutcome::Chosen(o.clone())),
            KeyCode::Esc | KeyCode::Char('q') => KeyOutcome::Chosen(EXIT_SENTINEL.to_string()),
            _ => KeyOutcome::Continue,
        }
    }

    /// Renders one line per option, marking the highlighted one with `>`.
    #[must_use]
    pub fn format_lines(&self) -> Vec<String> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                if i == self.selected {
                    format!("> {option}")
                } else {
                    format!("  {option}")
                }
            })
            .collect()
    }
}

/// Arrow-key list prompt drawn inline on stdout.
#[derive(Debug, Default)]
pub struct TerminalSelector;

struct RawModeGuard;

impl RawModeGuard {
    fn new() -> GoswResult<Self> {
        enable_raw_mode().io_context(|| "failed to enable raw mode")?;
        let _ = execute!(io::stdout(), Hide);
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show);
        let _ = disable_raw_mode();
    }
}

impl VersionSelector for TerminalSelector {
    fn select(&mut self, label: &str, options: &[String]) -> GoswResult<String> {
        if options.is_empty() {
            return Err(GoswError::invalid_arguments("nothing to select"));
        }

        let mut state = ListState::new(options.to_vec());
        let mut stdout = io::stdout();
        let _guard = RawModeGuard::new()?;

        queue!(stdout, Print(format!("{}\r\n", label.bold())))
            .io_context(|| "failed to draw prompt")?;
        draw(&mut stdout, &state, false)?;

        loop {
            let Event::Key(key) = event::read().io_context(|| "failed to read key")? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match state.handle_key(key.code, key.modifiers) {
                KeyOutcome::Continue => draw(&mut stdout, &state, true)?,
                KeyOutcome::Chosen(choice) => {
                    tracing::debug!(choice, "selection made");
                    return Ok(choice);
                }
            }
        }
    }
}

fn draw(stdout: &mut io::Stdout, state: &ListState, redraw: bool) -> GoswResult<()> {
    let lines = state.format_lines();
    if redraw && let Ok(height) = u16::try_from(lines.len()) {
        queue!(stdout, MoveUp(height), MoveToColumn(0)).io_context(|| "failed to move cursor")?;
    }
    queue!(stdout, Clear(ClearType::FromCursorDown)).io_context(|| "failed to clear list")?;
    for (i, line) in lines.iter().enumerate() {
        let drawn = if i == state.selected() {
            queue!(stdout, Print(line.as_str().cyan()), Print("\r\n"))
        } else {
            queue!(stdout, Print(line), Print("\r\n"))
        };
        drawn.io_context(|| "failed to draw list")?;
    }
    stdout.flush().io_context(|| "failed to flush stdout")
}
