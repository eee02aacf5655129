// src/errors.rs

//! Crate-wide error types.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PancakeError {
    #[error("no rule to make {0}")]
    NoRule(String),

    #[error("there are no rules")]
    NoRules,

    #[error("cyclical dependency detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("target '{target}' is already made by rule '{existing}'")]
    TargetConflict { target: String, existing: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("file watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    RuleExecution(#[from] RuleExecutionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PancakeError {
    /// Whether this error is reported as a single diagnostic line.
    ///
    /// Everything except an action failure is; action failures print the
    /// formatted failure detail instead.
    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, PancakeError::RuleExecution(_))
    }
}

/// An action raised (returned an error or panicked) while making a rule.
#[derive(Error, Debug)]
#[error("an error occurred while making {label}")]
pub struct RuleExecutionError {
    /// Display label of the failing rule (its name or first target).
    pub label: String,
    /// Every target the failing rule declares.
    pub targets: Vec<String>,
    #[source]
    pub source: anyhow::Error,
}

impl RuleExecutionError {
    pub fn new(label: impl Into<String>, targets: Vec<String>, source: anyhow::Error) -> Self {
        Self {
            label: label.into(),
            targets,
            source,
        }
    }

    /// Formatted failure detail: the error, its causes and, if one was
    /// captured, the backtrace.
    pub fn detail(&self) -> Vec<String> {
        let mut lines = vec![format!("{self}:")];
        lines.push(format!("  {}", self.source));
        for cause in self.source.chain().skip(1) {
            lines.push(format!("  caused by: {cause}"));
        }
        let backtrace = match self.source.downcast_ref::<ActionPanic>() {
            Some(panic) => {
                if let Some(location) = &panic.location {
                    lines.push(format!("  panicked at {location}"));
                }
                &panic.trace
            }
            None => self.source.backtrace(),
        };
        if backtrace.status() == BacktraceStatus::Captured {
            lines.push(String::new());
            lines.extend(backtrace.to_string().lines().map(str::to_string));
        }
        lines
    }
}

/// A panic raised inside an action, with the backtrace taken where it
/// panicked.
#[derive(Debug)]
pub struct ActionPanic {
    pub message: String,
    /// `file:line:column` of the panic, when known.
    pub location: Option<String>,
    pub trace: Backtrace,
}

impl fmt::Display for ActionPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action panicked: {}", self.message)
    }
}

impl std::error::Error for ActionPanic {}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PancakeError>;
