#![cfg(unix)]

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use quay_engine::{Backend, ChildProcess, Executor, KILL_PROMPT, ProcessHandle, RunOutcome, ScriptedPrompter, SlotState};
use quay_engine::executor::shell_command;
use quay_types::{CommandSpec, CommandSpecDraft, NormalizeContext, RunMode};
use tempfile::tempdir;

/// Terminal-style backend without a terminal: output is discarded.
struct Detached {
    grace: Duration,
}

#[async_trait]
impl Backend for Detached {
    fn mode(&self) -> RunMode {
        RunMode::InteractiveTerminal
    }

    fn grace_period(&self) -> Duration {
        self.grace
    }

    async fn reset_surface(&self, _slot_key: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn spawn(&self, _slot_key: &str, spec: &CommandSpec) -> anyhow::Result<Box<dyn ProcessHandle>> {
        let mut command = shell_command("/bin/sh", spec.command_line(), spec.working_dir());
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);
        Ok(Box::new(ChildProcess::new(command.spawn()?).leading_process_group()))
    }

    async fn activate_surface(&self, _slot_key: &str, _spec: &CommandSpec) -> anyhow::Result<()> {
        Ok(())
    }
}

fn spec(dir: &Path, line: &str) -> CommandSpec {
    let context = NormalizeContext::new(dir, Some(PathBuf::from("/nonexistent-home")));
    CommandSpecDraft::new("build", line).normalize(&context).unwrap()
}

/// Poll until the child has created `path`, so its shell is past startup.
async fn wait_for_file(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !path.exists() {
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn declined_kill_keeps_the_original_process() {
    let work = tempdir().unwrap();
    let prompter = Arc::new(ScriptedPrompter::new().with_confirmations([false]));
    let mut executor = Executor::new(prompter.clone()).with_backend(Arc::new(Detached {
        grace: Duration::from_millis(200),
    }));

    let original = spec(work.path(), "sleep 30");
    let key = original.slot_key();
    let first = executor.run(original, RunMode::InteractiveTerminal).await.unwrap();
    let second = executor
        .run(spec(work.path(), "touch created"), RunMode::InteractiveTerminal)
        .await
        .unwrap();

    assert_eq!(second, RunOutcome::Declined { slot_key: key.clone() });
    assert_eq!(prompter.asked(), vec![KILL_PROMPT]);
    assert!(!work.path().join("created").exists());

    let slot = executor.slots_mut().get_mut(&key).unwrap();
    assert_eq!(slot.state(), SlotState::Running);
    match first {
        RunOutcome::Started { pid, .. } => assert_eq!(slot.pid(), pid),
        other => panic!("unexpected outcome {other:?}"),
    }
    executor.shutdown().await;
}

#[tokio::test]
async fn confirmed_kill_terminates_processes_ignoring_interrupt() {
    let work = tempdir().unwrap();
    let prompter = Arc::new(ScriptedPrompter::new().with_confirmations([true]));
    let grace = Duration::from_millis(300);
    let mut executor = Executor::new(prompter).with_backend(Arc::new(Detached { grace }));

    let stubborn = spec(work.path(), "trap '' INT; sleep 30");
    let key = stubborn.slot_key();
    executor.run(stubborn, RunMode::InteractiveTerminal).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let outcome = executor
        .run(spec(work.path(), "touch created"), RunMode::InteractiveTerminal)
        .await
        .unwrap();
    let elapsed = started.elapsed();
    assert!(matches!(outcome, RunOutcome::Started { .. }));
    assert!(elapsed >= grace, "waited {elapsed:?}");
    assert!(elapsed < Duration::from_secs(10));

    assert_eq!(executor.wait(&key).await.unwrap(), Some(0));
    assert!(work.path().join("created").exists());
}

#[tokio::test]
async fn cooperative_process_stops_within_grace_period() {
    let work = tempdir().unwrap();
    let prompter = Arc::new(ScriptedPrompter::new().with_confirmations([true]));
    let grace = Duration::from_secs(5);
    let mut executor = Executor::new(prompter).with_backend(Arc::new(Detached { grace }));

    executor
        .run(spec(work.path(), "touch ready; sleep 30; true"), RunMode::InteractiveTerminal)
        .await
        .unwrap();
    wait_for_file(&work.path().join("ready")).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    executor
        .run(spec(work.path(), "true"), RunMode::InteractiveTerminal)
        .await
        .unwrap();
    assert!(started.elapsed() < grace);
}
