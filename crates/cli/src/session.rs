//! Interactive loop that keeps the slot registry alive between runs.

use std::{future::Future, io, sync::Arc};

use anyhow::Result;
use quay_engine::{Launcher, LogManager, PickOutcome, RunOutcome};
use quay_tui::LineConsole;
use tracing::{debug, info, warn};

use crate::{LaunchArgs, build_launcher, describe_run, report_failures};

const TAIL_LINES: usize = 20;

const HELP: &str = "\
p            pick a command and run it
r [slot]     repeat the last run of a slot (default: most recent)
l            list slots
t <slot>     show captured output of a slot
q            stop live processes and quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Pick,
    Repeat(Option<String>),
    List,
    Tail(String),
    Quit,
    Help,
}

/// Parse one input line. The slot argument is the rest of the line so that
/// keys containing spaces survive.
fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());
    match (word, argument) {
        ("p" | "pick", None) => Ok(SessionCommand::Pick),
        ("r" | "repeat", slot) => Ok(SessionCommand::Repeat(slot)),
        ("l" | "list", None) => Ok(SessionCommand::List),
        ("t" | "tail", Some(slot)) => Ok(SessionCommand::Tail(slot)),
        ("t" | "tail", None) => Err("usage: t <slot>".to_string()),
        ("q" | "quit", None) => Ok(SessionCommand::Quit),
        ("?" | "h" | "help" | "", None) => Ok(SessionCommand::Help),
        (word, _) => Err(format!("unknown command '{word}'; type ? for help")),
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    Quit,
    Interrupted,
}

struct Session {
    launcher: Launcher,
    logs: LogManager,
    console: Arc<LineConsole>,
    /// Slot of the most recent run in this session.
    last_slot: Option<String>,
}

/// Run the session until `q`, end of input or Ctrl-C. Live slots are
/// stopped in every case.
pub(crate) async fn run(args: &LaunchArgs) -> Result<SessionEnd> {
    let (launcher, logs) = build_launcher(args, false)?;
    let mut session = Session {
        launcher,
        logs,
        console: Arc::new(LineConsole::stdio()),
        last_slot: None,
    };
    session.console.write(HELP)?;
    let finished = until_interrupted(session.repl(), tokio::signal::ctrl_c()).await;
    if finished.is_none() {
        info!("interrupted; stopping live slots");
    }
    session.launcher.executor_mut().shutdown().await;
    match finished {
        Some(result) => result.map(|()| SessionEnd::Quit),
        None => Ok(SessionEnd::Interrupted),
    }
}

/// Drive `work` until it finishes or `interrupt` fires; `None` means
/// interrupted. If the interrupt cannot be listened for, `work` runs to the end.
async fn until_interrupted<W, I>(work: W, interrupt: I) -> Option<Result<()>>
where
    W: Future<Output = Result<()>>,
    I: Future<Output = io::Result<()>>,
{
    tokio::pin!(work);
    tokio::select! {
        result = &mut work => Some(result),
        signal = interrupt => match signal {
            Ok(()) => None,
            Err(error) => {
                warn!(%error, "cannot listen for ctrl-c");
                Some(work.await)
            }
        },
    }
}

impl Session {
    async fn repl(&mut self) -> Result<()> {
        while let Some(line) = self.prompt().await? {
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    self.console.write(&format!("{message}\n"))?;
                    continue;
                }
            };
            debug!(?command, "session command");
            match command {
                SessionCommand::Pick => self.pick().await?,
                SessionCommand::Repeat(slot) => self.repeat(slot).await?,
                SessionCommand::List => self.list()?,
                SessionCommand::Tail(slot) => self.tail(&slot).await?,
                SessionCommand::Help => self.console.write(HELP)?,
                SessionCommand::Quit => break,
            }
        }
        Ok(())
    }

    /// Read the next command off the runtime threads so Ctrl-C stays
    /// observable while the prompt waits.
    async fn prompt(&self) -> Result<Option<String>> {
        let console = Arc::clone(&self.console);
        let line = tokio::task::spawn_blocking(move || console.ask("quay> ")).await??;
        Ok(line)
    }

    async fn pick(&mut self) -> Result<()> {
        let report = match self.launcher.pick_and_run().await {
            Ok(report) => report,
            Err(error) => return self.console.write(&format!("error: {error:#}\n")).map_err(Into::into),
        };
        report_failures(&report.failures);
        let message = match report.outcome {
            PickOutcome::Ran(outcome) => self.record(outcome),
            PickOutcome::Cancelled => "cancelled".to_string(),
            PickOutcome::NoCandidates => "no commands found".to_string(),
        };
        self.console.write(&format!("{message}\n"))?;
        Ok(())
    }

    async fn repeat(&mut self, slot: Option<String>) -> Result<()> {
        let slot = slot
            .or_else(|| self.last_slot.clone())
            .or_else(|| self.launcher.executor().slots().last_key().map(str::to_string));
        let Some(slot) = slot else {
            self.console.write("nothing has run yet\n")?;
            return Ok(());
        };
        let message = match self.launcher.executor_mut().repeat(&slot).await {
            Ok(outcome) => self.record(outcome),
            Err(error) => format!("error: {error:#}"),
        };
        self.console.write(&format!("{message}\n"))?;
        Ok(())
    }

    fn record(&mut self, outcome: RunOutcome) -> String {
        if matches!(outcome, RunOutcome::Started { .. }) {
            self.last_slot = Some(outcome.slot_key().to_string());
        }
        describe_run(&outcome)
    }

    fn list(&mut self) -> Result<()> {
        let summaries = self.launcher.executor_mut().slots_mut().snapshot();
        if summaries.is_empty() {
            self.console.write("no slots\n")?;
            return Ok(());
        }
        let mut text = String::new();
        for summary in summaries {
            let pid = summary.pid.map(|pid| format!(" pid {pid}")).unwrap_or_default();
            let display = summary.display.unwrap_or_default();
            text.push_str(&format!("{:<32} {:<8} {display}{pid}\n", summary.key, summary.state));
        }
        self.console.write(&text)?;
        Ok(())
    }

    async fn tail(&mut self, slot: &str) -> Result<()> {
        let lines = self.logs.recent(slot, TAIL_LINES).await;
        if lines.is_empty() {
            self.console.write(&format!("no captured output for {slot}\n"))?;
            return Ok(());
        }
        let mut text = String::new();
        for line in lines {
            text.push_str(&line.render());
            text.push('\n');
        }
        self.console.write(&text)?;
        Ok(())
    }
}
