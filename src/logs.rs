//! # Log housekeeping: rotation, run bootstrap, aggregation.
//!
//! A run brackets its workers with two housekeeping passes:
//!
//! ```text
//! prepare_run ──► workers write sync_worker_<i>.log ──► aggregate
//!   rotate old logs                                       debug log first,
//!   create directories                                    then worker logs,
//!                                                         into syncvisor.log
//! ```
//!
//! ## Rules
//! - Rotation keeps up to nine generations: `x.log` becomes `x.log.1`,
//!   pushing `x.log.1` to `x.log.2` and so on; `x.log.9` falls off.
//! - Aggregation removes the per-worker logs it consumed, so a finished
//!   run leaves exactly one run log (plus the rotated history).
//! - All of this is synchronous std I/O: it happens strictly before the
//!   pool starts and strictly after it ends.

use std::fs;
use std::io;
use std::path::Path;

use crate::config::Config;
use crate::error::RuntimeError;

/// Oldest rotated generation kept on disk.
const ROTATE_DEPTH: u32 = 9;

/// Rotates `path` through numbered generations `.1` to `.9`.
///
/// Missing generations are skipped; a missing `path` itself is a no-op.
pub fn rotate(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let generation = |n: u32| {
        let mut p = path.as_os_str().to_owned();
        p.push(format!(".{n}"));
        std::path::PathBuf::from(p)
    };

    for n in (1..ROTATE_DEPTH).rev() {
        let from = generation(n);
        if from.exists() {
            fs::rename(&from, generation(n + 1))?;
        }
    }
    fs::rename(path, generation(1))?;
    Ok(())
}

/// Prepares the filesystem for a run: creates the log and repository
/// roots, rotates the previous run's logs, and truncates the debug log.
///
/// Stale per-worker logs from an aborted run are removed rather than
/// rotated, so aggregation never picks up another run's attempts.
pub fn prepare_run(cfg: &Config) -> Result<(), RuntimeError> {
    fs::create_dir_all(&cfg.log_root)?;
    fs::create_dir_all(&cfg.repo_root)?;

    rotate(&cfg.run_log())?;
    for module in &cfg.modules {
        let module_log = cfg.module_log(module);
        rotate(&module_log)?;
        // Module names may contain `/`, nesting the log under log_root.
        if let Some(parent) = module_log.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(cfg.dest_dir(module))?;
    }

    for worker in 0..cfg.max_workers {
        let stale = cfg.worker_log(worker);
        if stale.exists() {
            fs::remove_file(stale)?;
        }
    }

    if cfg.debug {
        fs::write(cfg.debug_log(), b"")?;
    }
    Ok(())
}

/// Appends one line to the debug log. A no-op unless debug is enabled.
pub fn debug_note(cfg: &Config, line: &str) -> io::Result<()> {
    if !cfg.debug {
        return Ok(());
    }
    use std::io::Write;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(cfg.debug_log())?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Collects the per-worker logs (debug log first, when present) into the
/// run log and removes the sources.
///
/// Workers that never wrote a line have no log file; they are skipped.
pub fn aggregate(cfg: &Config) -> Result<(), RuntimeError> {
    let mut run_log = fs::File::create(cfg.run_log())?;

    let mut sources = Vec::new();
    if cfg.debug {
        sources.push(cfg.debug_log());
    }
    for worker in 0..cfg.max_workers {
        sources.push(cfg.worker_log(worker));
    }

    for source in sources {
        if !source.exists() {
            continue;
        }
        let mut file = fs::File::open(&source)?;
        io::copy(&mut file, &mut run_log)?;
        fs::remove_file(&source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::module::ModuleId;

    fn config_in(root: &Path) -> Config {
        Config {
            modules: vec![ModuleId::from("a"), ModuleId::from("b")],
            tool: PathBuf::from("/usr/bin/rsync"),
            repo_root: root.join("repo"),
            log_root: root.join("logs"),
            listener_port: 1,
            max_workers: 3,
            transfer_timeout: Duration::from_secs(10),
            retry_cooldown: Duration::from_secs(5),
            debug: false,
        }
    }

    #[test]
    fn rotate_shifts_generations() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");

        fs::write(&log, "current").unwrap();
        fs::write(dir.path().join("run.log.1"), "old-1").unwrap();
        fs::write(dir.path().join("run.log.2"), "old-2").unwrap();

        rotate(&log).unwrap();

        assert!(!log.exists());
        assert_eq!(fs::read_to_string(dir.path().join("run.log.1")).unwrap(), "current");
        assert_eq!(fs::read_to_string(dir.path().join("run.log.2")).unwrap(), "old-1");
        assert_eq!(fs::read_to_string(dir.path().join("run.log.3")).unwrap(), "old-2");
    }

    #[test]
    fn rotate_drops_the_oldest_generation() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");

        fs::write(&log, "gen-0").unwrap();
        for n in 1..=9 {
            fs::write(dir.path().join(format!("run.log.{n}")), format!("gen-{n}")).unwrap();
        }

        rotate(&log).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("run.log.9")).unwrap(), "gen-8");
        assert_eq!(fs::read_to_string(dir.path().join("run.log.1")).unwrap(), "gen-0");
    }

    #[test]
    fn rotate_of_missing_file_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        rotate(&dir.path().join("absent.log")).unwrap();
    }

    #[test]
    fn prepare_creates_directories_and_clears_stale_worker_logs() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());

        fs::create_dir_all(&cfg.log_root).unwrap();
        fs::write(cfg.worker_log(1), "stale").unwrap();

        prepare_run(&cfg).unwrap();

        assert!(cfg.dest_dir(&ModuleId::from("a")).is_dir());
        assert!(cfg.dest_dir(&ModuleId::from("b")).is_dir());
        assert!(!cfg.worker_log(1).exists());
    }

    #[test]
    fn prepare_handles_nested_module_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.modules = vec![ModuleId::from("rpki.example.net/repo")];

        prepare_run(&cfg).unwrap();

        let m = &cfg.modules[0];
        assert!(cfg.dest_dir(m).is_dir());
        fs::File::create(cfg.module_log(m)).unwrap();
    }

    #[test]
    fn aggregate_concatenates_and_removes_worker_logs() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        fs::create_dir_all(&cfg.log_root).unwrap();

        fs::write(cfg.worker_log(0), "w0\n").unwrap();
        fs::write(cfg.worker_log(2), "w2\n").unwrap();
        // worker 1 never wrote a line

        aggregate(&cfg).unwrap();

        assert_eq!(fs::read_to_string(cfg.run_log()).unwrap(), "w0\nw2\n");
        assert!(!cfg.worker_log(0).exists());
        assert!(!cfg.worker_log(2).exists());
    }

    #[test]
    fn debug_notes_only_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        fs::create_dir_all(&cfg.log_root).unwrap();

        debug_note(&cfg, "ignored").unwrap();
        assert!(!cfg.debug_log().exists());

        cfg.debug = true;
        debug_note(&cfg, "pool size: 3").unwrap();
        debug_note(&cfg, "modules: 2").unwrap();
        assert_eq!(
            fs::read_to_string(cfg.debug_log()).unwrap(),
            "pool size: 3\nmodules: 2\n"
        );
    }

    #[test]
    fn aggregate_puts_the_debug_log_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.debug = true;
        fs::create_dir_all(&cfg.log_root).unwrap();

        fs::write(cfg.debug_log(), "debug\n").unwrap();
        fs::write(cfg.worker_log(0), "w0\n").unwrap();

        aggregate(&cfg).unwrap();

        assert_eq!(fs::read_to_string(cfg.run_log()).unwrap(), "debug\nw0\n");
        assert!(!cfg.debug_log().exists());
    }
}
