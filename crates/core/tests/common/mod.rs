//! Shared fixtures for cycle controller integration tests.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use dw_core::alert::{AlertError, AlertSink};
use dw_core::config::MonitorConfig;
use dw_core::drift::DriftReport;
use dw_core::pipeline::{CyclePlan, PipelineStep};

/// Alert sink that records every dispatched report instead of sending mail.
pub struct RecordingAlert {
    sent: Mutex<Vec<f64>>,
    fail: bool,
}

impl RecordingAlert {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A sink whose every delivery attempt fails after being recorded.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_ratio(&self) -> Option<f64> {
        self.sent.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl AlertSink for RecordingAlert {
    async fn send(&self, report: &DriftReport) -> Result<(), AlertError> {
        self.sent.lock().unwrap().push(report.ratio);
        if self.fail {
            let bad = "not-an-address"
                .parse::<lettre::message::Mailbox>()
                .unwrap_err();
            return Err(AlertError::Address(bad));
        }
        Ok(())
    }
}

/// Config rooted in a temp directory with a short step timeout.
pub fn test_config(root: &Path) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.base_dir = root.to_path_buf();
    config.step_timeout_secs = 10;
    config
}

/// Write a CSV artifact with a header and `rows` data rows at the default
/// location `rel` under `root`.
pub fn write_artifact(root: &Path, rel: &str, rows: usize) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut content = String::from("transaction_id,amount\n");
    for i in 0..rows {
        content.push_str(&format!("tx-{i},100.0\n"));
    }
    std::fs::write(path, content).unwrap();
}

pub fn noop_step(label: &str) -> PipelineStep {
    PipelineStep::new(label, "true", vec![])
}

pub fn failing_step(label: &str) -> PipelineStep {
    PipelineStep::new(label, "false", vec![])
}

/// Step that appends one line to `marker` each time it runs, so tests can
/// count invocations.
pub fn marker_step(label: &str, marker: &Path) -> PipelineStep {
    PipelineStep::new(
        label,
        "sh",
        vec![
            "-c".to_string(),
            format!("echo run >> '{}'", marker.display()),
        ],
    )
}

pub fn marker_lines(marker: &Path) -> usize {
    std::fs::read_to_string(marker)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

/// Plan with harmless steps and a long-lived consumer the supervisor can
/// stop.
pub fn test_plan(process: Vec<PipelineStep>, retrain: PipelineStep) -> CyclePlan {
    CyclePlan {
        generate: noop_step("generate"),
        consumer: PipelineStep::new("consumer", "sleep", vec!["30".to_string()]),
        process,
        retrain,
    }
}
