//! Configuration data structures.
//!
//! All of this is loaded once at startup and read-only afterwards.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::{ConfigError, ConfigResult};

/// Paths of the artifacts the monitor reads and writes, relative to the
/// monitor root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// CSV of transactions the model flagged as fraud (rows = flagged count).
    pub fraud_output: PathBuf,
    /// CSV of all evaluated transactions (rows = denominator).
    pub total_output: PathBuf,
    /// Append-only log capturing consumer stdout and stderr.
    pub consumer_log: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            fraud_output: PathBuf::from("modules/fraud_cases_for_llm.csv"),
            total_output: PathBuf::from("modules/non_fraud_transactions.csv"),
            consumer_log: PathBuf::from("logs/consumer.log"),
        }
    }
}

/// Outbound mail submission settings for drift alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub user: String,
    pub pass: String,
    pub to: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            user: String::new(),
            pass: String::new(),
            to: String::new(),
        }
    }
}

/// Process-wide monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Fraud ratio above which a cycle is classified as drifted (strict `>`).
    pub threshold: f64,
    /// Seconds between cycle starts.
    pub interval_secs: u64,
    /// Upper bound on any single pipeline step, retraining included.
    pub step_timeout_secs: u64,
    /// Directory step commands and relative artifact paths resolve against.
    pub base_dir: PathBuf,
    pub artifacts: ArtifactPaths,
    pub mail: MailConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.30,
            interval_secs: 300,
            step_timeout_secs: 600,
            base_dir: PathBuf::from("."),
            artifacts: ArtifactPaths::default(),
            mail: MailConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Fixed wall-clock interval between cycle starts.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Timeout applied to every external step invocation.
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    /// Absolute path of the fraud-predictions artifact.
    pub fn fraud_output_path(&self) -> PathBuf {
        self.base_dir.join(&self.artifacts.fraud_output)
    }

    /// Absolute path of the total-evaluated-transactions artifact.
    pub fn total_output_path(&self) -> PathBuf {
        self.base_dir.join(&self.artifacts.total_output)
    }

    /// Absolute path of the consumer log.
    pub fn consumer_log_path(&self) -> PathBuf {
        self.base_dir.join(&self.artifacts.consumer_log)
    }

    /// Validate configuration values for consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            errors.push("threshold must be within (0, 1]");
        }
        if self.interval_secs == 0 {
            errors.push("interval_secs must be greater than 0");
        }
        if self.step_timeout_secs == 0 {
            errors.push("step_timeout_secs must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid {
                reason: errors.join("; "),
            })
        }
    }
}
