// SPDX-License-Identifier: MIT

//! Store configuration - YAML and environment loading

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::error::{ReflowError, Result};
use super::scheduler::{CurrentThreadScheduler, SharedScheduler, TokioScheduler};

/// Which scheduler a store runs its effects on
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// Tokio when a runtime is available, otherwise current-thread
    #[default]
    Auto,
    /// The tokio runtime the store is built on; an error outside a runtime
    Tokio,
    /// A queue the caller drives with `run_pending_effects`
    CurrentThread,
}

impl SchedulerKind {
    /// Build the scheduler this kind names
    pub fn resolve(self) -> Result<SharedScheduler> {
        match self {
            SchedulerKind::Auto => match TokioScheduler::current() {
                Ok(scheduler) => Ok(Arc::new(scheduler)),
                Err(_) => {
                    log::debug!("No tokio runtime found, using current-thread scheduler");
                    Ok(Arc::new(CurrentThreadScheduler::new()))
                }
            },
            SchedulerKind::Tokio => Ok(Arc::new(TokioScheduler::current()?)),
            SchedulerKind::CurrentThread => Ok(Arc::new(CurrentThreadScheduler::new())),
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = ReflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SchedulerKind::Auto),
            "tokio" => Ok(SchedulerKind::Tokio),
            "current_thread" | "current-thread" => Ok(SchedulerKind::CurrentThread),
            other => Err(ReflowError::config(format!("unknown scheduler '{}'", other))),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerKind::Auto => "auto",
            SchedulerKind::Tokio => "tokio",
            SchedulerKind::CurrentThread => "current_thread",
        };
        f.write_str(name)
    }
}

/// Settings applied when a store is built
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Name that prefixes the store's log lines
    pub label: String,
    /// Where effects run
    pub scheduler: SchedulerKind,
    /// Log a warning whenever more effects than this are in flight
    pub inflight_warning: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            scheduler: SchedulerKind::Auto,
            inflight_warning: None,
        }
    }
}

impl StoreConfig {
    pub const ENV_LABEL: &'static str = "REFLOW_LABEL";
    pub const ENV_SCHEDULER: &'static str = "REFLOW_SCHEDULER";
    pub const ENV_INFLIGHT_WARNING: &'static str = "REFLOW_INFLIGHT_WARNING";

    /// Same configuration under a different label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Parse a configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Read overrides from `REFLOW_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(label) = lookup(Self::ENV_LABEL) {
            config.label = label;
        }
        if let Some(scheduler) = lookup(Self::ENV_SCHEDULER) {
            config.scheduler = scheduler.parse()?;
        }
        if let Some(limit) = lookup(Self::ENV_INFLIGHT_WARNING) {
            let limit = limit.trim().parse::<usize>().map_err(|e| {
                ReflowError::config(format!(
                    "{} must be a positive integer: {}",
                    Self::ENV_INFLIGHT_WARNING,
                    e
                ))
            })?;
            config.inflight_warning = Some(limit);
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(ReflowError::config("label must not be empty"));
        }
        if self.inflight_warning == Some(0) {
            return Err(ReflowError::config("inflight_warning must be at least 1"));
        }
        Ok(())
    }
}
