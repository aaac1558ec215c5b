//! Configuration loading and management.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_with_env};
pub use models::{ArtifactPaths, MailConfig, MonitorConfig};
