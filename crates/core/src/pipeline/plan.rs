//! The fixed, ordered step list for one monitoring cycle.

use crate::pipeline::PipelineStep;

/// Ordered steps for one full cycle. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct CyclePlan {
    /// Produces a fresh batch of transactions upstream.
    pub generate: PipelineStep,
    /// Long-lived stream consumer, supervised across the cycle.
    pub consumer: PipelineStep,
    /// Processing and scoring steps, run in strict order after the consumer
    /// starts. Any failure aborts the remaining sequence.
    pub process: Vec<PipelineStep>,
    /// Retraining step, run only when a cycle is classified as drifted.
    pub retrain: PipelineStep,
}

impl CyclePlan {
    /// The standard fraud pipeline as shipped with the monitor.
    pub fn standard() -> Self {
        Self {
            generate: py("Generating data", &["modules/datagen.py"]),
            consumer: py("Kafka consumer", &["modules/consumer.py"]),
            process: vec![
                py("Merging parquet files", &["modules/combine.py"]),
                py(
                    "Enriching with historical features",
                    &["modules/transformation.py"],
                ),
                py(
                    "Applying rule-based fraud detection",
                    &[
                        "modules/rule_based_fraud_detection.py",
                        "denormalized_transactions/denoised_enriched_transactions.csv",
                    ],
                ),
                py(
                    "Generating account-level history",
                    &["modules/history.py", "denormalized_transactions"],
                ),
                py("Running autoencoder fraud detection", &["modules/model.py"]),
            ],
            retrain: py(
                "Retraining autoencoder model",
                &["modules/train_autoencoder.py"],
            ),
        }
    }
}

fn py(label: &str, args: &[&str]) -> PipelineStep {
    PipelineStep::new(
        label,
        "python3",
        args.iter().map(|a| a.to_string()).collect(),
    )
}
