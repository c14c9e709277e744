//! Error types used by the syncvisor runtime.
//!
//! This module defines two main error enums:
//!
//! - [`ConfigError`] — problems with the run configuration; always fatal
//!   before any worker starts.
//! - [`RuntimeError`] — errors raised by the coordination runtime itself
//!   (never by an individual module failing to mirror; those are recorded
//!   in the run log and are not errors of the run).
//!
//! Both types provide `as_label` helpers for logs/metrics.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// # Errors in the run configuration.
///
/// A run must fail fast on any of these rather than start a partially
/// configured pool.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required field is absent from the config file.
    #[error("missing {field}= entry in config file")]
    MissingField {
        /// Name of the missing config key.
        field: &'static str,
    },

    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingField { .. } => "config_missing_field",
            ConfigError::Unreadable { .. } => "config_unreadable",
        }
    }
}

/// # Errors produced by the coordination runtime.
///
/// These represent failures of the run as a whole. Per-module sync
/// failures are deliberately **not** represented here: they are recorded
/// in the aggregated log and the run still completes.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Log rotation, directory bootstrap, or log aggregation failed.
    #[error("log housekeeping failed: {0}")]
    LogHousekeeping(#[from] io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::LogHousekeeping(_) => "runtime_log_housekeeping",
        }
    }
}
