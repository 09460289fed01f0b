use std::time::Duration;

use error::ConfigurationError;
use serde::{Deserialize, Serialize};
pub mod error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Checker {
    /// Whether the segment checker produces tasks right after it is created.
    #[serde(rename = "active-on-start")]
    pub active_on_start: bool,

    /// Only load segments of a channel once its leader reports itself serviceable.
    #[serde(rename = "load-requires-serviceable-leader")]
    pub load_requires_serviceable_leader: bool,

    /// Execution timeout attached to every segment task, in milliseconds.
    #[serde(rename = "segment-task-timeout-ms")]
    pub segment_task_timeout_ms: u64,
}

impl Checker {
    pub fn segment_task_timeout(&self) -> Duration {
        Duration::from_millis(self.segment_task_timeout_ms)
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self {
            active_on_start: true,
            load_requires_serviceable_leader: true,
            segment_task_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BalancePolicy {
    #[default]
    RoundRobin,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Balancer {
    pub policy: BalancePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub checker: Checker,
    pub balancer: Balancer,
}

impl Configuration {
    /// Load configuration from a YAML file. Missing sections take their default values.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigurationError> {
        let file = std::fs::File::open(path)?;
        let configuration = serde_yaml::from_reader(file)?;
        Ok(configuration)
    }

    /// Check the configuration.
    pub fn check_and_apply(&mut self) -> Result<(), ConfigurationError> {
        if self.checker.segment_task_timeout_ms == 0 {
            return Err(ConfigurationError::InvalidTaskTimeout(
                self.checker.segment_task_timeout_ms,
            ));
        }
        Ok(())
    }
}
