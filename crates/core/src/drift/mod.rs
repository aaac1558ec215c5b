//! Drift evaluation over on-disk prediction artifacts.
//!
//! The evaluator reads two CSV files produced by the scoring steps: the
//! fraud predictions (rows = flagged transactions) and the full evaluated
//! set (rows = denominator). It classifies the cycle without mutating
//! either artifact.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

/// Classification of one cycle's drift measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The fraud-predictions artifact does not exist.
    NoOutput,
    /// The artifact exists but holds zero rows; the model flagged nothing.
    Empty,
    /// Flagging ratio at or below the threshold.
    Normal,
    /// Flagging ratio strictly above the threshold.
    Drifted,
}

/// Result of evaluating one cycle. Computed fresh every cycle and never
/// persisted beyond it.
#[derive(Debug, Clone)]
pub struct DriftReport {
    pub flagged: u64,
    pub total: u64,
    pub ratio: f64,
    pub verdict: Verdict,
}

impl DriftReport {
    fn terminal(flagged: u64, verdict: Verdict) -> Self {
        Self {
            flagged,
            total: 0,
            ratio: 0.0,
            verdict,
        }
    }
}

/// Errors from reading result artifacts.
#[derive(Error, Debug)]
pub enum DriftError {
    #[error("Failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Turns the on-disk prediction artifacts into a [`DriftReport`].
pub struct DriftEvaluator {
    fraud_output: PathBuf,
    total_output: PathBuf,
    threshold: f64,
}

impl DriftEvaluator {
    pub fn new(fraud_output: PathBuf, total_output: PathBuf, threshold: f64) -> Self {
        Self {
            fraud_output,
            total_output,
            threshold,
        }
    }

    /// Evaluate the current artifacts. Pure read; never mutates them.
    ///
    /// A missing fraud artifact or one with zero rows is a benign terminal
    /// state (`NoOutput` / `Empty`), not an error. A zero denominator is
    /// guarded and reported as `NoOutput` rather than dividing.
    ///
    /// # Errors
    ///
    /// Returns `DriftError` when an artifact exists but cannot be read or
    /// parsed, including a missing total-evaluated file while predictions
    /// are present.
    pub fn evaluate(&self) -> Result<DriftReport, DriftError> {
        if !self.fraud_output.exists() {
            return Ok(DriftReport::terminal(0, Verdict::NoOutput));
        }

        let flagged = count_rows(&self.fraud_output)?;
        if flagged == 0 {
            return Ok(DriftReport::terminal(0, Verdict::Empty));
        }

        let total = count_rows(&self.total_output)?;
        if total == 0 {
            warn!(
                path = %self.total_output.display(),
                "Total-evaluated artifact has no rows; skipping drift evaluation"
            );
            return Ok(DriftReport::terminal(flagged, Verdict::NoOutput));
        }

        let ratio = flagged as f64 / total as f64;
        let verdict = if ratio > self.threshold {
            Verdict::Drifted
        } else {
            Verdict::Normal
        };

        Ok(DriftReport {
            flagged,
            total,
            ratio,
            verdict,
        })
    }
}

/// Number of data rows in a CSV artifact, excluding the header.
fn count_rows(path: &Path) -> Result<u64, DriftError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| DriftError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = 0u64;
    for record in reader.records() {
        record.map_err(|source| DriftError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?;
        rows += 1;
    }
    Ok(rows)
}
