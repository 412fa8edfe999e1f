//! Captured-log backend: output goes to a per-slot buffer and log file.

use std::{process::Stdio, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use quay_types::{CommandSpec, RunMode};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    task::JoinHandle,
};
use tracing::{debug, info};

use super::{
    backend::Backend,
    process::{ChildProcess, ProcessHandle},
    shell::shell_command,
};
use crate::logging::{LogLine, LogManager, LogStream};

const CAPTURED_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Runs commands detached from the terminal and records their output.
///
/// A live process in the slot is restarted in place without asking.
#[derive(Debug, Clone)]
pub struct CapturedLogBackend {
    logs: LogManager,
    shell: String,
}

impl CapturedLogBackend {
    pub fn new(logs: LogManager, shell: impl Into<String>) -> Self {
        Self {
            logs,
            shell: shell.into(),
        }
    }

    pub fn logs(&self) -> &LogManager {
        &self.logs
    }
}

#[async_trait]
impl Backend for CapturedLogBackend {
    fn mode(&self) -> RunMode {
        RunMode::CapturedLog
    }

    fn grace_period(&self) -> Duration {
        CAPTURED_GRACE_PERIOD
    }

    fn surface_name(&self, slot_key: &str) -> String {
        self.logs.log_path(slot_key).display().to_string()
    }

    async fn reset_surface(&self, slot_key: &str) -> Result<()> {
        self.logs
            .reset(slot_key)
            .await
            .with_context(|| format!("reset captured log for {slot_key}"))
    }

    async fn spawn(&self, slot_key: &str, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        self.logs
            .append(slot_key, LogLine::new(LogStream::System, format!("$ {}", spec.command_line())))
            .await;

        let mut command = shell_command(&self.shell, spec.command_line(), spec.working_dir());
        command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .with_context(|| format!("spawn '{}' in {}", spec.command_line(), spec.working_dir().display()))?;

        let mut forwarders = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(spawn_line_forwarder(slot_key.to_string(), self.logs.clone(), LogStream::Stdout, stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(spawn_line_forwarder(slot_key.to_string(), self.logs.clone(), LogStream::Stderr, stderr));
        }

        let process = ChildProcess::new(child).with_forwarders(forwarders);
        #[cfg(unix)]
        let process = process.leading_process_group();
        Ok(Box::new(process))
    }

    async fn activate_surface(&self, slot_key: &str, spec: &CommandSpec) -> Result<()> {
        info!(
            slot_key = %slot_key,
            command = %spec.command_line(),
            log = %self.logs.log_path(slot_key).display(),
            "capturing output"
        );
        Ok(())
    }
}

/// Forward each line of `reader` into the slot's captured log.
///
/// Lines are decoded lossily and the pipe is drained to end of file, so the
/// child never sees a closed pipe because of its own output.
fn spawn_line_forwarder<R>(slot_key: String, logs: LogManager, stream: LogStream, reader: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&buffer);
                    logs.append(&slot_key, LogLine::new(stream, line)).await;
                }
                Err(error) => {
                    debug!(slot_key = %slot_key, error = %error, "output read failed");
                    break;
                }
            }
        }
    })
}

/// Lossy UTF-8 text of one raw line without its terminator.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
