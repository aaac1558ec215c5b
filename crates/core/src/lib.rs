//! # dw-core
//!
//! Core cycle controller for the driftwatch fraud monitor.
//!
//! This crate provides:
//! - Configuration loading from `driftwatch.toml` and the environment
//! - Sequential, fail-fast execution of external pipeline steps
//! - Supervision of the single background stream consumer
//! - Drift evaluation over on-disk prediction artifacts
//! - Best-effort SMTP alerting and the outer cycle scheduler
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`pipeline`]: Pipeline step definitions and the step runner
//! - [`supervisor`]: Background consumer process lifecycle
//! - [`drift`]: Drift ratio evaluation and verdicts
//! - [`alert`]: Alert dispatch over mail submission
//! - [`cycle`]: The per-cycle controller
//! - [`scheduler`]: The fixed-interval outer loop

pub mod alert;
pub mod config;
pub mod cycle;
pub mod drift;
pub mod pipeline;
pub mod scheduler;
pub mod supervisor;
