// SPDX-License-Identifier: MIT

//! Typed error handling for reflow-rs
//!
//! Reducers and combinators never return errors; failures inside effects are
//! ordinary actions. This type covers what is left: configuration loading and
//! scheduler resolution.

use thiserror::Error;

/// Top-level error type for reflow-rs
#[derive(Debug, Error)]
pub enum ReflowError {
    /// Configuration errors (invalid values, unknown scheduler names)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tokio scheduler was requested outside of a tokio runtime
    #[error("No tokio runtime available for scheduling effects")]
    NoRuntime,

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ReflowError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result alias used across the runtime
pub type Result<T> = std::result::Result<T, ReflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ReflowError::config("bad scheduler").to_string(),
            "Configuration error: bad scheduler"
        );
        assert_eq!(
            ReflowError::NoRuntime.to_string(),
            "No tokio runtime available for scheduling effects"
        );
    }

    #[test]
    fn test_yaml_conversion() {
        let err: ReflowError = serde_yaml::from_str::<u32>("not: [a number")
            .unwrap_err()
            .into();
        assert!(matches!(err, ReflowError::Yaml(_)));
    }
}
