//! Cycle controller: one full monitoring pass.
//!
//! A cycle is: reset the consumer, generate data, start a fresh consumer,
//! run the scoring steps in order, evaluate drift, and alert plus retrain
//! when drifted. Failures anywhere are caught at the cycle boundary and
//! reported in the [`CycleOutcome`]; no single cycle's failure can stop
//! future cycles.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::alert::AlertSink;
use crate::config::MonitorConfig;
use crate::drift::{DriftEvaluator, Verdict};
use crate::pipeline::{run_step, CyclePlan};
use crate::supervisor::ConsumerSupervisor;

/// Summary of one controller invocation, consumed by the scheduler.
/// Carries no pipeline data, only success or failure.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub succeeded: bool,
    pub failure: Option<String>,
}

impl CycleOutcome {
    fn success() -> Self {
        Self {
            succeeded: true,
            failure: None,
        }
    }

    fn failed(reason: String) -> Self {
        Self {
            succeeded: false,
            failure: Some(reason),
        }
    }
}

/// Drives one full cycle of the monitoring pipeline.
pub struct CycleController {
    config: MonitorConfig,
    plan: CyclePlan,
    supervisor: ConsumerSupervisor,
    evaluator: DriftEvaluator,
    alerter: Arc<dyn AlertSink>,
}

impl CycleController {
    /// Assemble a controller from configuration, a step plan, and an alert
    /// sink.
    pub fn new(config: MonitorConfig, plan: CyclePlan, alerter: Arc<dyn AlertSink>) -> Self {
        let supervisor = ConsumerSupervisor::new(
            plan.consumer.clone(),
            config.base_dir.clone(),
            config.consumer_log_path(),
        );
        let evaluator = DriftEvaluator::new(
            config.fraud_output_path(),
            config.total_output_path(),
            config.threshold,
        );

        Self {
            config,
            plan,
            supervisor,
            evaluator,
            alerter,
        }
    }

    /// Run one cycle, converting any failure into the outcome.
    ///
    /// This is the cycle-boundary catch-all: step failures, evaluation
    /// errors, and supervisor errors all end here, logged with their cause.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let cycle_id = Uuid::new_v4();
        info!(%cycle_id, "Starting new pipeline run");

        match self.execute().await {
            Ok(()) => CycleOutcome::success(),
            Err(e) => {
                let reason = format!("{e:#}");
                error!(%cycle_id, error = %reason, "Cycle failed");
                CycleOutcome::failed(reason)
            }
        }
    }

    async fn execute(&mut self) -> Result<()> {
        let timeout = self.config.step_timeout();
        let cwd = self.config.base_dir.clone();

        // Reset first: never two consumers racing on the same upstream
        // source. stop() completes before the matching start().
        self.supervisor.stop().await?;

        run_step(&self.plan.generate, &cwd, timeout).await?;
        self.supervisor.start()?;

        for step in &self.plan.process {
            run_step(step, &cwd, timeout).await?;
        }

        let report = self.evaluator.evaluate()?;
        match report.verdict {
            Verdict::NoOutput => info!("No fraud prediction output found"),
            Verdict::Empty => info!("No frauds detected; model is OK"),
            Verdict::Normal => info!(
                flagged = report.flagged,
                total = report.total,
                ratio = report.ratio,
                "Fraud prediction rate within threshold"
            ),
            Verdict::Drifted => {
                warn!(
                    flagged = report.flagged,
                    total = report.total,
                    ratio = report.ratio,
                    "High fraud detection ratio; alerting and retraining"
                );
                // Alerting is advisory; a delivery failure never blocks the
                // retrain step.
                if let Err(e) = self.alerter.send(&report).await {
                    warn!(error = %e, "Failed to send drift alert");
                }
                run_step(&self.plan.retrain, &cwd, timeout).await?;
            }
        }
        Ok(())
    }

    /// Whether the supervised consumer is currently alive.
    pub fn consumer_running(&mut self) -> bool {
        self.supervisor.is_running()
    }

    /// Stop the supervised consumer. Called by the entry point on shutdown.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.supervisor.stop().await {
            warn!(error = %e, "Failed to stop consumer during shutdown");
        }
    }
}
