//! Lifecycle of the background stream consumer.
//!
//! At most one consumer is alive at a time. The supervisor owns the only
//! handle and is the only component that mutates it; `stop` must complete
//! before the corresponding `start` of the next cycle.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::info;

use crate::pipeline::PipelineStep;

/// Errors from consumer lifecycle operations.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to open consumer log at {path}: {source}")]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch consumer '{label}': {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal consumer: {0}")]
    Signal(String),

    #[error("Failed waiting for consumer exit: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
}

/// Supervises the single background consumer process across cycles.
pub struct ConsumerSupervisor {
    command: PipelineStep,
    working_dir: PathBuf,
    log_path: PathBuf,
    child: Option<Child>,
}

impl ConsumerSupervisor {
    pub fn new(command: PipelineStep, working_dir: PathBuf, log_path: PathBuf) -> Self {
        Self {
            command,
            working_dir,
            log_path,
            child: None,
        }
    }

    /// Whether a tracked consumer is still alive.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Launch a fresh consumer, replacing any stale handle.
    ///
    /// Stdout and stderr append to the consumer log; the log is never
    /// truncated. The child is not awaited for readiness.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError` if the log cannot be opened or the
    /// consumer executable cannot be spawned.
    pub fn start(&mut self) -> Result<(), SupervisorError> {
        let log = self.open_log()?;
        let log_err = log.try_clone().map_err(|source| SupervisorError::LogOpen {
            path: self.log_path.clone(),
            source,
        })?;

        info!(consumer = %self.command.label, "Starting stream consumer in background");
        let child = Command::new(&self.command.program)
            .args(&self.command.args)
            .current_dir(&self.working_dir)
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            // Reap the consumer if the monitor exits while it is tracked.
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                label: self.command.label.clone(),
                source,
            })?;

        self.child = Some(child);
        Ok(())
    }

    /// Stop the tracked consumer, if any.
    ///
    /// A no-op when nothing is tracked or the child has already exited.
    /// Otherwise sends a graceful termination signal and blocks until the
    /// process exits.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError` if signalling or waiting on the child
    /// fails.
    pub async fn stop(&mut self) -> Result<(), SupervisorError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        match child.try_wait() {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => {}
            Err(source) => return Err(SupervisorError::Wait { source }),
        }

        info!(consumer = %self.command.label, "Stopping previous stream consumer");
        terminate(&mut child)?;
        child
            .wait()
            .await
            .map_err(|source| SupervisorError::Wait { source })?;
        Ok(())
    }

    fn open_log(&self) -> Result<std::fs::File, SupervisorError> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SupervisorError::LogOpen {
                path: self.log_path.clone(),
                source,
            })?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|source| SupervisorError::LogOpen {
                path: self.log_path.clone(),
                source,
            })
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> Result<(), SupervisorError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // id() is None once the child has been reaped.
    let Some(pid) = child.id() else {
        return Ok(());
    };

    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => Ok(()),
        // Exited between try_wait and the signal.
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(SupervisorError::Signal(e.to_string())),
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> Result<(), SupervisorError> {
    child
        .start_kill()
        .map_err(|e| SupervisorError::Signal(e.to_string()))
}
