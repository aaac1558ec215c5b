//! Pipeline step definitions and the step runner.
//!
//! Each step is an external executable addressed by a program plus argument
//! vector; the contract is exit-status-only (zero = success). Steps run to
//! completion under a timeout and fail the whole cycle on any non-zero exit.
//! There are no retries at this layer.

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::info;

pub mod plan;

pub use plan::CyclePlan;

/// One external unit of work in the monitoring cycle.
///
/// Immutable once defined; the ordered step list is built at startup.
#[derive(Debug, Clone)]
pub struct PipelineStep {
    /// Human-readable label used in logs and failure reports.
    pub label: String,
    /// Executable to run.
    pub program: String,
    /// Argument vector. No shell interpretation happens anywhere.
    pub args: Vec<String>,
}

impl PipelineStep {
    pub fn new(
        label: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args,
        }
    }
}

/// Failure of a single pipeline step. Aborts the current cycle only.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Failed to launch step '{label}': {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step '{label}' exited with {status}")]
    Failed { label: String, status: ExitStatus },

    #[error("Step '{label}' timed out after {timeout:?}")]
    TimedOut { label: String, timeout: Duration },

    #[error("Failed waiting on step '{label}': {source}")]
    Wait {
        label: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run one pipeline step to completion.
///
/// Blocks until the child exits, bounded by `timeout`. On timeout the child
/// is killed and reaped before the error is reported.
///
/// # Errors
///
/// Returns `StepError` if the executable cannot be spawned, exits non-zero,
/// or does not finish within `timeout`.
pub async fn run_step(
    step: &PipelineStep,
    cwd: &Path,
    timeout: Duration,
) -> Result<(), StepError> {
    info!(step = %step.label, "Running pipeline step");

    let mut child = Command::new(&step.program)
        .args(&step.args)
        .current_dir(cwd)
        .spawn()
        .map_err(|source| StepError::Spawn {
            label: step.label.clone(),
            source,
        })?;

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(StepError::Failed {
            label: step.label.clone(),
            status,
        }),
        Ok(Err(source)) => Err(StepError::Wait {
            label: step.label.clone(),
            source,
        }),
        Err(_) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            Err(StepError::TimedOut {
                label: step.label.clone(),
                timeout,
            })
        }
    }
}
