//! # Run configuration.
//!
//! Provides [`Config`], the immutable settings for one mirroring run.
//! A `Config` is built once at startup (from the config file plus CLI
//! arguments) and passed to the [`Supervisor`](crate::Supervisor) by
//! value — there is no process-wide mutable configuration.
//!
//! ## Config file format
//! The file is line-oriented `KEY=value`:
//! ```text
//! DIRS="module-a module-b module-c"
//! RSYNC=/usr/bin/rsync
//! REPOSITORY=/srv/mirror/repo
//! LOGS=/srv/mirror/logs
//! ```
//! Values may carry surrounding quotes and trailing `;` / `:` characters,
//! which are stripped. `DIRS` is a space-separated module list. All four
//! keys are required; a missing key fails the run before any worker
//! starts ([`ConfigError::MissingField`]).
//!
//! ## Sentinel-free defaults
//! - `max_workers` defaults to 8 (CLI `-t` overrides)
//! - `transfer_timeout` defaults to 10s (passed to the sync tool)
//! - `retry_cooldown` defaults to 5s (wait before the single retry)

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::module::ModuleId;

/// Default maximum number of concurrent workers.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Default connect/transfer timeout handed to the sync tool (`--timeout`).
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cooldown before the single retry of a transient failure.
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(5);

/// Immutable configuration for one mirroring run.
///
/// Field semantics:
/// - `modules`: identifiers to mirror, in queue order
/// - `tool`: path to the external synchronization binary
/// - `repo_root`: local destination root; module `m` lands in `repo_root/m`
/// - `log_root`: root for per-module, per-worker, and run logs
/// - `listener_port`: TCP port of the local listener process
/// - `max_workers`: pool capacity; the pool never exceeds the queue size
/// - `debug`: when set, a debug log is written and prepended on aggregation
#[derive(Clone, Debug)]
pub struct Config {
    /// Modules to mirror, in the order they are enqueued.
    pub modules: Vec<ModuleId>,
    /// Path to the external synchronization tool.
    pub tool: PathBuf,
    /// Local repository root (destination tree).
    pub repo_root: PathBuf,
    /// Root directory for all log files.
    pub log_root: PathBuf,
    /// Port of the local listener receiving completion notifications.
    pub listener_port: u16,
    /// Maximum number of concurrent workers.
    pub max_workers: usize,
    /// Connect/transfer timeout passed to the sync tool.
    pub transfer_timeout: Duration,
    /// Cooldown before the single retry of a transient failure.
    pub retry_cooldown: Duration,
    /// Extra debug output in the run log.
    pub debug: bool,
}

impl Config {
    /// Loads the config file and combines it with the CLI-provided values.
    pub fn load(
        path: &Path,
        listener_port: u16,
        max_workers: usize,
        debug: bool,
    ) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, listener_port, max_workers, debug)
    }

    /// Parses the `KEY=value` config text. Separated from [`Config::load`]
    /// so the format can be tested without touching the filesystem.
    pub fn parse(
        text: &str,
        listener_port: u16,
        max_workers: usize,
        debug: bool,
    ) -> Result<Self, ConfigError> {
        let mut dirs: Option<String> = None;
        let mut tool: Option<String> = None;
        let mut repo_root: Option<String> = None;
        let mut log_root: Option<String> = None;

        for line in text.lines() {
            if let Some(v) = line.strip_prefix("DIRS=") {
                dirs = Some(strip_decorations(v).to_string());
            } else if let Some(v) = line.strip_prefix("RSYNC=") {
                tool = Some(strip_decorations(v).to_string());
            } else if let Some(v) = line.strip_prefix("REPOSITORY=") {
                repo_root = Some(strip_decorations(v).to_string());
            } else if let Some(v) = line.strip_prefix("LOGS=") {
                log_root = Some(strip_decorations(v).to_string());
            }
        }

        let dirs = dirs.ok_or(ConfigError::MissingField { field: "DIRS" })?;
        let tool = tool.ok_or(ConfigError::MissingField { field: "RSYNC" })?;
        let repo_root = repo_root.ok_or(ConfigError::MissingField { field: "REPOSITORY" })?;
        let log_root = log_root.ok_or(ConfigError::MissingField { field: "LOGS" })?;

        let modules = dirs
            .split_whitespace()
            .map(ModuleId::from)
            .collect::<Vec<_>>();

        Ok(Self {
            modules,
            tool: PathBuf::from(tool),
            repo_root: PathBuf::from(repo_root),
            log_root: PathBuf::from(log_root),
            listener_port,
            max_workers,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            retry_cooldown: DEFAULT_RETRY_COOLDOWN,
            debug,
        })
    }

    /// Local destination tree for one module.
    pub fn dest_dir(&self, module: &ModuleId) -> PathBuf {
        self.repo_root.join(module.as_str())
    }

    /// Per-module transfer log (the sync tool's stdout).
    pub fn module_log(&self, module: &ModuleId) -> PathBuf {
        self.log_root.join(format!("{module}.log"))
    }

    /// Per-worker attempt log.
    pub fn worker_log(&self, worker: usize) -> PathBuf {
        self.log_root.join(format!("sync_worker_{worker}.log"))
    }

    /// Aggregated run log.
    pub fn run_log(&self) -> PathBuf {
        self.log_root.join("syncvisor.log")
    }

    /// Debug log, written only when `debug` is set.
    pub fn debug_log(&self) -> PathBuf {
        self.log_root.join("syncvisor.debug")
    }
}

/// Strips surrounding quotes and trailing `;`/`:` noise from a raw value.
fn strip_decorations(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == ';' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"DIRS="alpha beta gamma"
RSYNC=/usr/bin/rsync
REPOSITORY=/srv/repo
LOGS=/srv/logs
"#;

    #[test]
    fn parses_all_fields() {
        let cfg = Config::parse(GOOD, 4040, 8, false).unwrap();
        assert_eq!(cfg.modules.len(), 3);
        assert_eq!(cfg.modules[0].as_str(), "alpha");
        assert_eq!(cfg.tool, PathBuf::from("/usr/bin/rsync"));
        assert_eq!(cfg.repo_root, PathBuf::from("/srv/repo"));
        assert_eq!(cfg.log_root, PathBuf::from("/srv/logs"));
        assert_eq!(cfg.listener_port, 4040);
        assert_eq!(cfg.transfer_timeout, Duration::from_secs(10));
        assert_eq!(cfg.retry_cooldown, Duration::from_secs(5));
    }

    #[test]
    fn strips_quotes_and_trailers() {
        let text = "DIRS=\"a\"\nRSYNC=\"/bin/rsync\";\nREPOSITORY=/r:\nLOGS=/l\n";
        let cfg = Config::parse(text, 1, 1, false).unwrap();
        assert_eq!(cfg.tool, PathBuf::from("/bin/rsync"));
        assert_eq!(cfg.repo_root, PathBuf::from("/r"));
    }

    #[test]
    fn missing_field_is_fatal() {
        let text = "DIRS=\"a b\"\nRSYNC=/bin/rsync\nLOGS=/l\n";
        let err = Config::parse(text, 1, 1, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "REPOSITORY"
            }
        ));
        assert_eq!(err.as_label(), "config_missing_field");
    }

    #[test]
    fn empty_dirs_yields_empty_queue() {
        let text = "DIRS=\"\"\nRSYNC=/bin/rsync\nREPOSITORY=/r\nLOGS=/l\n";
        let cfg = Config::parse(text, 1, 1, false).unwrap();
        assert!(cfg.modules.is_empty());
    }

    #[test]
    fn path_helpers() {
        let cfg = Config::parse(GOOD, 1, 1, false).unwrap();
        let m = ModuleId::from("alpha");
        assert_eq!(cfg.dest_dir(&m), PathBuf::from("/srv/repo/alpha"));
        assert_eq!(cfg.module_log(&m), PathBuf::from("/srv/logs/alpha.log"));
        assert_eq!(
            cfg.worker_log(2),
            PathBuf::from("/srv/logs/sync_worker_2.log")
        );
        assert_eq!(cfg.run_log(), PathBuf::from("/srv/logs/syncvisor.log"));
    }
}
