use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use quay_engine::{
    CapturedLogBackend, Executor, ExperimentRegistry, Launcher, LogManager, PickOutcome, Prompter, QuayConfig,
    RecipeError, RunOutcome, load_config, picker::flatten_candidates,
};
use quay_tui::{InteractiveTerminalBackend, RawTerminalBackend, TerminalPrompter, default_picker_registry};
use quay_types::{NormalizeContext, RunMode};
use quay_util::expand_tilde;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod session;

#[derive(Debug, Parser)]
#[command(name = "quay", version, about = "Pick a command recipe and run it in its own process slot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pick a command, run it and wait for it to exit.
    Run(LaunchArgs),
    /// Pick and run repeatedly while keeping process slots alive.
    Session(LaunchArgs),
    /// Resolve and print the candidates without running anything.
    List {
        #[command(flatten)]
        launch: LaunchArgs,
        /// Print candidates as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the known experiments and their status.
    Experiments,
    /// Print the captured log of a slot, e.g. `quay logs 'build[~/proj]'`.
    Logs { slot: String },
}

/// Overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct LaunchArgs {
    /// Run mode: capturedLog or interactiveTerminal.
    #[arg(long, value_name = "MODE")]
    mode: Option<String>,
    /// Completion method: auto, fuzzy, menu or prompt.
    #[arg(long, value_name = "METHOD")]
    picker: Option<String>,
    /// Enable an experiment (repeatable).
    #[arg(long = "experiment", value_name = "NAME")]
    experiments: Vec<String>,
    /// Directory recipes are resolved in (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,
}

impl LaunchArgs {
    fn apply(&self, mut config: QuayConfig) -> QuayConfig {
        if let Some(mode) = &self.mode {
            config.run_mode = mode.clone();
        }
        if let Some(picker) = &self.picker {
            config.completion_method = picker.clone();
        }
        config.with_extra_experiments(self.experiments.iter().cloned())
    }

    fn context(&self) -> Result<NormalizeContext> {
        let context = NormalizeContext::from_environment().context("read current directory")?;
        let Some(cwd) = &self.cwd else {
            return Ok(context);
        };
        let mut dir = expand_tilde(&cwd.to_string_lossy());
        if dir.is_relative() {
            dir = context.current_dir().join(dir);
        }
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
        Ok(context.with_current_dir(dir))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_once(&args).await,
        Commands::Session(args) => match session::run(&args).await? {
            session::SessionEnd::Quit => Ok(ExitCode::SUCCESS),
            // The prompt reader is still blocked on stdin and would hold the
            // runtime open; slots are already stopped.
            session::SessionEnd::Interrupted => std::process::exit(130),
        },
        Commands::List { launch, json } => list(&launch, json).map(|()| ExitCode::SUCCESS),
        Commands::Experiments => {
            print_experiments();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logs { slot } => print_logs(&slot).await.map(|()| ExitCode::SUCCESS),
    }
}

/// Diagnostics go to stderr at `warn` unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Launcher wired to the terminal front end, plus the captured-log store
/// its captured-log backend writes to.
pub(crate) fn build_launcher(args: &LaunchArgs, echo_output: bool) -> Result<(Launcher, LogManager)> {
    let config = args.apply(load_config()?);
    let context = args.context()?;
    let prompter: Arc<dyn Prompter> = Arc::new(TerminalPrompter::stdio());
    let logs = LogManager::new(config.log_directory_path()).with_echo(echo_output);

    let shell = config.shell_program();
    let executor = Executor::new(Arc::clone(&prompter))
        .with_backend(Arc::new(CapturedLogBackend::new(logs.clone(), shell.clone())))
        .with_backend(Arc::new(InteractiveTerminalBackend::new(shell.clone())))
        .with_backend(Arc::new(RawTerminalBackend::new(shell)));

    let launcher = Launcher::new(config, context, default_picker_registry(), prompter, executor);
    Ok((launcher, logs))
}

pub(crate) fn report_failures(failures: &[RecipeError]) {
    for failure in failures {
        warn!(provider = ?failure.provider(), error = %failure, "recipe skipped");
        eprintln!("skipped: {failure}");
    }
}

pub(crate) fn describe_run(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Started { slot_key, mode, pid } => match pid {
            Some(pid) => format!("started {slot_key} ({mode}, pid {pid})"),
            None => format!("started {slot_key} ({mode})"),
        },
        RunOutcome::Declined { slot_key } => format!("{slot_key} left running"),
    }
}

fn exit_code(code: Option<i32>) -> ExitCode {
    match code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

async fn run_once(args: &LaunchArgs) -> Result<ExitCode> {
    let (mut launcher, _logs) = build_launcher(args, true)?;
    let report = launcher.pick_and_run().await?;
    report_failures(&report.failures);

    let (slot_key, mode) = match report.outcome {
        PickOutcome::NoCandidates => {
            eprintln!("no commands found in {}", launcher.context().current_dir().display());
            return Ok(ExitCode::FAILURE);
        }
        PickOutcome::Cancelled => return Ok(ExitCode::SUCCESS),
        PickOutcome::Ran(outcome @ RunOutcome::Declined { .. }) => {
            eprintln!("{}", describe_run(&outcome));
            return Ok(ExitCode::SUCCESS);
        }
        PickOutcome::Ran(RunOutcome::Started { slot_key, mode, .. }) => (slot_key, mode),
    };

    let executor = launcher.executor_mut();
    if mode == RunMode::CapturedLog
        && let Some(slot) = executor.slots().get(&slot_key)
    {
        eprintln!("log: {}", slot.surface());
    }

    let finished = tokio::select! {
        status = executor.wait(&slot_key) => Some(status),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(status) = finished else {
        executor.shutdown().await;
        eprintln!("{slot_key} interrupted");
        return Ok(ExitCode::FAILURE);
    };

    let code = status?;
    match code {
        Some(code) => eprintln!("{slot_key} exited with status {code}"),
        None => eprintln!("{slot_key} was terminated by a signal"),
    }
    Ok(exit_code(code))
}

fn list(args: &LaunchArgs, json: bool) -> Result<()> {
    let (mut launcher, _logs) = build_launcher(args, false)?;
    let (_, groups, failures) = launcher.candidates()?;
    report_failures(&failures);

    if json {
        let rows: Vec<_> = flatten_candidates(&groups)
            .map(|candidate| {
                serde_json::json!({
                    "label": candidate.label,
                    "slot-key": candidate.spec.slot_key(),
                    "spec": candidate.spec,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for group in &groups {
        println!("{}", group.provider_label);
        for candidate in &group.candidates {
            println!("  {:<32} {}", candidate.label, candidate.spec.command_line());
        }
    }
    Ok(())
}

fn print_experiments() {
    for (name, status) in ExperimentRegistry::builtin().iter() {
        println!("{name:<20} {status}");
    }
}

async fn print_logs(slot: &str) -> Result<()> {
    let config = load_config()?;
    let logs = LogManager::new(config.log_directory_path());
    let text = logs
        .read_file(slot)
        .await
        .with_context(|| format!("read captured log {}", logs.log_path(slot).display()))?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_configuration() {
        let cli = Cli::parse_from([
            "quay",
            "run",
            "--mode",
            "interactiveTerminal",
            "--picker",
            "menu",
            "--experiment",
            "raw-terminal",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.apply(QuayConfig {
            experiments: vec!["raw-terminal".into(), "static-recipes".into()],
            ..QuayConfig::default()
        });
        assert_eq!(config.run_mode, "interactiveTerminal");
        assert_eq!(config.completion_method, "menu");
        assert_eq!(config.experiments, vec!["raw-terminal", "static-recipes"]);
    }

    #[test]
    fn cwd_must_be_an_existing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp_dir.path().join("app")).unwrap();
        let args = LaunchArgs {
            cwd: Some(temp_dir.path().join("app")),
            ..LaunchArgs::default()
        };
        assert_eq!(args.context().unwrap().current_dir(), temp_dir.path().join("app"));

        let missing = LaunchArgs {
            cwd: Some(temp_dir.path().join("missing")),
            ..LaunchArgs::default()
        };
        assert!(missing.context().is_err());
    }

    #[test]
    fn exit_codes_follow_the_child() {
        assert_eq!(exit_code(Some(0)), ExitCode::SUCCESS);
        assert_eq!(exit_code(Some(3)), ExitCode::from(3));
        assert_eq!(exit_code(Some(-1)), ExitCode::from(1));
        assert_eq!(exit_code(None), ExitCode::FAILURE);
    }

    #[test]
    fn run_outcomes_are_described() {
        let started = RunOutcome::Started {
            slot_key: "build[~/proj]".into(),
            mode: RunMode::CapturedLog,
            pid: Some(42),
        };
        assert_eq!(describe_run(&started), "started build[~/proj] (capturedLog, pid 42)");
        let declined = RunOutcome::Declined {
            slot_key: "build[~/proj]".into(),
        };
        assert_eq!(describe_run(&declined), "build[~/proj] left running");
    }
}
