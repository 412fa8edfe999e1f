#![cfg(unix)]

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use quay_engine::{CapturedLogBackend, Executor, LogManager, LogStream, RunOutcome, ScriptedPrompter, SlotState};
use quay_types::{CommandSpec, CommandSpecDraft, NormalizeContext, RunMode};
use tempfile::tempdir;

fn spec(dir: &std::path::Path, name: &str, line: &str) -> CommandSpec {
    let context = NormalizeContext::new(dir, Some(PathBuf::from("/nonexistent-home")));
    CommandSpecDraft::new(name, line).normalize(&context).unwrap()
}

#[tokio::test]
async fn output_is_captured_and_mirrored_to_file() {
    let work = tempdir().unwrap();
    let logs_dir = tempdir().unwrap();
    let logs = LogManager::new(logs_dir.path());
    let prompter = Arc::new(ScriptedPrompter::new());
    let mut executor =
        Executor::new(prompter.clone()).with_backend(Arc::new(CapturedLogBackend::new(logs.clone(), "/bin/sh")));

    let spec = spec(work.path(), "greet", "echo hello; echo oops 1>&2; pwd");
    let key = spec.slot_key();
    let outcome = executor.run(spec, RunMode::CapturedLog).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Started { .. }));

    let code = executor.wait(&key).await.unwrap();
    assert_eq!(code, Some(0));

    let lines = logs.all(&key).await;
    assert_eq!(lines[0].stream, LogStream::System);
    assert_eq!(lines[0].text, "$ echo hello; echo oops 1>&2; pwd");
    assert!(lines.iter().any(|line| line.stream == LogStream::Stdout && line.text == "hello"));
    assert!(lines.iter().any(|line| line.stream == LogStream::Stderr && line.text == "oops"));

    let file = logs.read_file(&key).await.unwrap();
    assert!(file.starts_with("# $ echo hello"));
    let canonical = work.path().canonicalize().unwrap();
    assert!(file.lines().any(|line| PathBuf::from(line).canonicalize().ok() == Some(canonical.clone())));

    assert_eq!(
        executor.slots_mut().get_mut(&key).unwrap().state(),
        SlotState::IdleWithOutput
    );
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn invalid_utf8_output_does_not_stop_the_command() {
    let work = tempdir().unwrap();
    let logs_dir = tempdir().unwrap();
    let logs = LogManager::new(logs_dir.path());
    let mut executor = Executor::new(Arc::new(ScriptedPrompter::new()))
        .with_backend(Arc::new(CapturedLogBackend::new(logs.clone(), "/bin/sh")));

    let spec = spec(
        work.path(),
        "binary",
        r"printf 'before\n\377\376\n'; sleep 0.3; echo after; echo done > finished",
    );
    let key = spec.slot_key();
    executor.run(spec, RunMode::CapturedLog).await.unwrap();

    assert_eq!(executor.wait(&key).await.unwrap(), Some(0));
    assert!(work.path().join("finished").exists());

    let texts: Vec<_> = logs
        .all(&key)
        .await
        .into_iter()
        .filter(|line| line.stream == LogStream::Stdout)
        .map(|line| line.text)
        .collect();
    assert_eq!(texts, vec!["before", "\u{FFFD}\u{FFFD}", "after"]);
}

#[tokio::test]
async fn similar_slot_keys_keep_separate_log_files() {
    let work = tempdir().unwrap();
    let logs_dir = tempdir().unwrap();
    let logs = LogManager::new(logs_dir.path());
    let mut executor = Executor::new(Arc::new(ScriptedPrompter::new()))
        .with_backend(Arc::new(CapturedLogBackend::new(logs.clone(), "/bin/sh")));

    let first = spec(work.path(), "a_b", "echo first");
    let second = spec(work.path(), "a b", "echo second");
    let (first_key, second_key) = (first.slot_key(), second.slot_key());
    assert_ne!(logs.log_path(&first_key), logs.log_path(&second_key));

    executor.run(first, RunMode::CapturedLog).await.unwrap();
    executor.wait(&first_key).await.unwrap();
    executor.run(second, RunMode::CapturedLog).await.unwrap();
    executor.wait(&second_key).await.unwrap();

    let first_file = logs.read_file(&first_key).await.unwrap();
    let second_file = logs.read_file(&second_key).await.unwrap();
    assert!(first_file.lines().any(|line| line == "first"));
    assert!(!first_file.contains("second"));
    assert!(second_file.lines().any(|line| line == "second"));
}

#[tokio::test]
async fn live_process_is_restarted_in_place() {
    let work = tempdir().unwrap();
    let logs_dir = tempdir().unwrap();
    let logs = LogManager::new(logs_dir.path());
    let prompter = Arc::new(ScriptedPrompter::new());
    let mut executor =
        Executor::new(prompter.clone()).with_backend(Arc::new(CapturedLogBackend::new(logs.clone(), "/bin/sh")));

    let long_running = spec(work.path(), "serve", "echo first; sleep 30");
    let key = long_running.slot_key();
    let first = executor.run(long_running.clone(), RunMode::CapturedLog).await.unwrap();
    assert_eq!(
        executor.slots_mut().get_mut(&key).unwrap().state(),
        SlotState::Running
    );

    let started = Instant::now();
    let replacement = long_running.with_command_line("echo second").unwrap();
    let second = executor.run(replacement, RunMode::CapturedLog).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(prompter.asked().is_empty());

    match (first, second) {
        (RunOutcome::Started { pid: first_pid, .. }, RunOutcome::Started { pid: second_pid, .. }) => {
            assert_ne!(first_pid, second_pid);
        }
        other => panic!("unexpected outcomes {other:?}"),
    }

    assert_eq!(executor.wait(&key).await.unwrap(), Some(0));
    let texts: Vec<_> = logs.all(&key).await.into_iter().map(|line| line.text).collect();
    assert!(!texts.contains(&"first".to_string()), "surface was reset: {texts:?}");
    assert!(texts.contains(&"second".to_string()));
}

#[tokio::test]
async fn shutdown_stops_running_slots() {
    let work = tempdir().unwrap();
    let logs_dir = tempdir().unwrap();
    let logs = LogManager::new(logs_dir.path());
    let mut executor = Executor::new(Arc::new(ScriptedPrompter::new()))
        .with_backend(Arc::new(CapturedLogBackend::new(logs, "/bin/sh")));

    let spec = spec(work.path(), "idle", "sleep 30");
    let key = spec.slot_key();
    executor.run(spec, RunMode::CapturedLog).await.unwrap();

    executor.shutdown().await;
    assert_ne!(
        executor.slots_mut().get_mut(&key).unwrap().state(),
        SlotState::Running
    );
}
