//! Terminal execution backends.
//!
//! Both backends share the controlling terminal between slots: resetting a
//! surface clears the screen, and activating it retitles the terminal
//! window after the slot.

use std::{
    io::{self, Write},
    process::Stdio,
    sync::Mutex,
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    terminal::{Clear, ClearType, SetTitle, disable_raw_mode},
};
use quay_engine::{
    Backend, ChildProcess, ProcessHandle,
    executor::{raw_terminal_command, shell_command},
};
use quay_types::{CommandSpec, RunMode};
use tracing::debug;

use crate::theme;

const INTERACTIVE_GRACE_PERIOD: Duration = Duration::from_secs(1);
const RAW_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Full terminal reset (RIS).
const TERMINAL_RESET: &str = "\x1bc";

/// Terminal output shared by a backend's surfaces.
struct Screen(Mutex<Box<dyn Write + Send>>);

impl Screen {
    fn stdout() -> Self {
        Self(Mutex::new(Box::new(io::stdout())))
    }

    fn with<T>(&self, draw: impl FnOnce(&mut dyn Write) -> io::Result<T>) -> io::Result<T> {
        let mut output = self.0.lock().expect("terminal output lock poisoned");
        let value = draw(&mut **output)?;
        output.flush()?;
        Ok(value)
    }
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Screen")
    }
}

/// Runs commands in the foreground of the current terminal.
#[derive(Debug)]
pub struct InteractiveTerminalBackend {
    shell: String,
    attach_stdin: bool,
    screen: Screen,
}

impl InteractiveTerminalBackend {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            attach_stdin: true,
            screen: Screen::stdout(),
        }
    }

    /// Whether the command reads from the terminal. Detached commands get a
    /// null stdin and their own process group.
    pub fn with_attached_stdin(mut self, attach_stdin: bool) -> Self {
        self.attach_stdin = attach_stdin;
        self
    }

    #[cfg(test)]
    fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.screen = Screen(Mutex::new(Box::new(output)));
        self
    }
}

#[async_trait]
impl Backend for InteractiveTerminalBackend {
    fn mode(&self) -> RunMode {
        RunMode::InteractiveTerminal
    }

    fn grace_period(&self) -> Duration {
        INTERACTIVE_GRACE_PERIOD
    }

    async fn reset_surface(&self, slot_key: &str) -> Result<()> {
        debug!(slot = slot_key, "clearing terminal");
        self.screen
            .with(|output| {
                output.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;
                Ok(())
            })
            .context("clear terminal")
    }

    async fn spawn(&self, slot_key: &str, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        self.screen
            .with(|output| writeln!(output, "{}", theme::header_line(&format!("$ {}", spec.command_line()))))
            .context("write command header")?;

        let mut command = shell_command(&self.shell, spec.command_line(), spec.working_dir());
        command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        let detached = !self.attach_stdin;
        if detached {
            command.stdin(Stdio::null());
            #[cfg(unix)]
            command.process_group(0);
        } else {
            command.stdin(Stdio::inherit());
        }

        let child = command
            .spawn()
            .with_context(|| format!("spawn '{}' in {}", spec.command_line(), spec.working_dir().display()))?;
        debug!(slot = slot_key, pid = ?child.id(), "started in terminal");

        let process = ChildProcess::new(child);
        #[cfg(unix)]
        let process = if detached { process.leading_process_group() } else { process };
        Ok(Box::new(process))
    }

    async fn activate_surface(&self, slot_key: &str, _spec: &CommandSpec) -> Result<()> {
        self.screen
            .with(|output| output.queue(SetTitle(slot_key)).map(|_| ()))
            .context("set terminal title")
    }
}

/// Hands the whole terminal to an interactive shell wrapping the command.
///
/// Enabled by the `raw-terminal` experiment.
#[derive(Debug)]
pub struct RawTerminalBackend {
    shell: String,
    screen: Screen,
}

impl RawTerminalBackend {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            screen: Screen::stdout(),
        }
    }

    #[cfg(test)]
    fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.screen = Screen(Mutex::new(Box::new(output)));
        self
    }
}

#[async_trait]
impl Backend for RawTerminalBackend {
    fn mode(&self) -> RunMode {
        RunMode::RawTerminalExperimental
    }

    fn grace_period(&self) -> Duration {
        RAW_GRACE_PERIOD
    }

    async fn reset_surface(&self, slot_key: &str) -> Result<()> {
        if let Err(error) = disable_raw_mode() {
            debug!(slot = slot_key, error = %error, "terminal was not in raw mode");
        }
        self.screen
            .with(|output| output.write_all(TERMINAL_RESET.as_bytes()))
            .context("reset terminal")
    }

    async fn spawn(&self, slot_key: &str, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let mut command = raw_terminal_command(&self.shell, spec.command_line(), spec.working_dir());
        command.stdin(Stdio::inherit()).stdout(Stdio::inherit()).stderr(Stdio::inherit());
        let child = command
            .spawn()
            .with_context(|| format!("spawn raw terminal for '{}'", spec.command_line()))?;
        debug!(slot = slot_key, pid = ?child.id(), "started raw terminal");
        Ok(Box::new(ChildProcess::new(child)))
    }

    async fn activate_surface(&self, slot_key: &str, _spec: &CommandSpec) -> Result<()> {
        self.screen
            .with(|output| output.queue(SetTitle(slot_key)).map(|_| ()))
            .context("set terminal title")
    }
}
