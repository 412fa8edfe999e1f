//! Handles to spawned processes.

use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::{process::Child, task::JoinHandle};
use tracing::debug;

/// A live (or finished) process owned by exactly one slot.
#[async_trait]
pub trait ProcessHandle: Send + fmt::Debug {
    fn pid(&self) -> Option<u32>;

    /// `true` until the process has exited.
    fn is_alive(&mut self) -> bool;

    /// Ask the process to stop (SIGINT on unix).
    fn interrupt(&mut self) -> Result<()>;

    /// Kill the process and reap it.
    async fn terminate(&mut self) -> Result<()>;

    /// Wait for exit. `None` when the process was killed by a signal.
    async fn wait(&mut self) -> Result<Option<i32>>;
}

/// [`ProcessHandle`] over a `tokio` child.
///
/// When the child leads its own process group, signals go to the whole
/// group so that commands started through `sh -c` stop together with the
/// shell.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    pid: Option<u32>,
    process_group: bool,
    forwarders: Vec<JoinHandle<()>>,
}

impl ChildProcess {
    pub fn new(child: Child) -> Self {
        let pid = child.id();
        Self {
            child,
            pid,
            process_group: false,
            forwarders: Vec::new(),
        }
    }

    /// The child was spawned with `process_group(0)`.
    pub fn leading_process_group(mut self) -> Self {
        self.process_group = true;
        self
    }

    /// Output forwarding tasks drained by [`ProcessHandle::wait`].
    pub fn with_forwarders(mut self, forwarders: Vec<JoinHandle<()>>) -> Self {
        self.forwarders = forwarders;
        self
    }

    #[cfg(unix)]
    fn signal(&self, signal: libc::c_int) -> Result<()> {
        let pid = self.pid.context("process id unavailable")?;
        let pid = libc::pid_t::try_from(pid).context("process id out of range")?;
        let target = if self.process_group { -pid } else { pid };
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(target, signal) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error()).with_context(|| format!("send signal {signal} to {target}"));
        }
        Ok(())
    }

    #[cfg(unix)]
    fn kill_group(&self) {
        if !self.process_group {
            return;
        }
        if let Err(error) = self.signal(libc::SIGKILL) {
            debug!(pid = ?self.pid, error = %error, "process group kill failed");
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self) {}
}

#[async_trait]
impl ProcessHandle for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    #[cfg(unix)]
    fn interrupt(&mut self) -> Result<()> {
        self.signal(libc::SIGINT)
    }

    #[cfg(not(unix))]
    fn interrupt(&mut self) -> Result<()> {
        self.child.start_kill().context("interrupt process")
    }

    async fn terminate(&mut self) -> Result<()> {
        self.kill_group();
        self.child.kill().await.context("kill process")
    }

    async fn wait(&mut self) -> Result<Option<i32>> {
        let status = self.child.wait().await.context("wait for process")?;
        for forwarder in self.forwarders.drain(..) {
            let _ = forwarder.await;
        }
        Ok(status.code())
    }
}
