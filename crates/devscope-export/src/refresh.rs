//! Run the export script, then wait for a fresh export to appear.

use crate::discovery::{ExportDescription, ExportError, recent_exports};
use devscope_output::OutputFormatter;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("a refresh is already running")]
    AlreadyRunning,
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("export script failed ({status}):\n{output}")]
    ScriptFailed { status: ExitStatus, output: String },
    #[error("no recent device export found in {} after {}s", .dir.display(), .waited.as_secs())]
    Timeout { dir: PathBuf, waited: Duration },
    #[error("cannot create refresh lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Lock file created in the export directory while a refresh runs.
pub const LOCK_FILE: &str = ".devscope-refresh.lock";

/// Where the script lives, how to launch it, and how long to wait afterwards.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Program and leading arguments; the script path is appended. Empty runs
    /// the script directly.
    pub command: Vec<String>,
    pub script: PathBuf,
    pub export_dir: PathBuf,
    pub pattern: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// How recently an export must have been modified to count as new.
    pub recent_window: Duration,
    /// A lock file older than this is left over from a crashed refresh and
    /// gets replaced.
    pub stale_lock_after: Duration,
}

impl RefreshSettings {
    pub fn new(script: PathBuf, export_dir: PathBuf) -> Self {
        Self {
            command: ["powershell", "-ExecutionPolicy", "Bypass", "-File"]
                .map(String::from)
                .to_vec(),
            script,
            export_dir,
            pattern: crate::DEFAULT_PATTERN.to_string(),
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
            recent_window: Duration::from_secs(300),
            stale_lock_after: Duration::from_secs(3600),
        }
    }
}

/// Result of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct RefreshOutcome {
    pub export: ExportDescription,
    /// Exports modified within the recent window.
    pub recent: usize,
}

impl OutputFormatter for RefreshOutcome {
    fn format_text(&self) -> String {
        format!(
            "Loaded: {} (last updated {})",
            self.export.file, self.export.modified
        )
    }
}

/// Runs refreshes one at a time, within this process and across processes
/// sharing an export directory.
pub struct RefreshRunner {
    settings: RefreshSettings,
    running: AtomicBool,
}

/// Clears the running flag on every exit path.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Exclusive hold on [`LOCK_FILE`]; the file is removed on drop.
struct RefreshLock {
    path: PathBuf,
}

impl RefreshLock {
    fn acquire(dir: &Path, stale_after: Duration) -> Result<Self, RefreshError> {
        let path = dir.join(LOCK_FILE);
        std::fs::create_dir_all(dir).map_err(|e| lock_error(&path, e))?;

        let mut replaced_stale = false;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // The pid is informational only.
                    let _ = writeln!(file, "{}", std::process::id());
                    tracing::debug!(path = %path.display(), "refresh lock acquired");
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if replaced_stale || !lock_is_stale(&path, stale_after) {
                        return Err(RefreshError::AlreadyRunning);
                    }
                    tracing::warn!(path = %path.display(), "replacing stale refresh lock");
                    match std::fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(lock_error(&path, e)),
                    }
                    replaced_stale = true;
                }
                Err(e) => return Err(lock_error(&path, e)),
            }
        }
    }
}

impl Drop for RefreshLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot remove refresh lock");
        }
    }
}

fn lock_error(path: &Path, source: std::io::Error) -> RefreshError {
    RefreshError::Lock {
        path: path.to_path_buf(),
        source,
    }
}

fn lock_is_stale(path: &Path, stale_after: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= stale_after)
}

impl RefreshRunner {
    pub fn new(settings: RefreshSettings) -> Self {
        Self {
            settings,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the script and wait for a new export. Rejects a call while another
    /// refresh holds this runner or the export directory's lock file.
    pub fn run(&self) -> Result<RefreshOutcome, RefreshError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RefreshError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);
        let _lock =
            RefreshLock::acquire(&self.settings.export_dir, self.settings.stale_lock_after)?;

        self.run_script()?;
        self.wait_for_export()
    }

    fn run_script(&self) -> Result<(), RefreshError> {
        let (program, mut args) = match self.settings.command.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => (self.settings.script.display().to_string(), Vec::new()),
        };
        if !self.settings.command.is_empty() {
            args.push(self.settings.script.display().to_string());
        }

        tracing::info!(%program, ?args, "running export script");
        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|source| RefreshError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let captured = if stderr.trim().is_empty() {
                stdout
            } else {
                stderr
            };
            return Err(RefreshError::ScriptFailed {
                status: output.status,
                output: captured.trim().to_string(),
            });
        }

        tracing::debug!(stdout = %stdout.trim(), stderr = %stderr.trim(), "export script finished");
        Ok(())
    }

    fn wait_for_export(&self) -> Result<RefreshOutcome, RefreshError> {
        let settings = &self.settings;
        let start = Instant::now();
        loop {
            let recent = recent_exports(
                &settings.export_dir,
                &settings.pattern,
                settings.recent_window,
                SystemTime::now(),
            )?;
            if let Some(newest) = recent.first() {
                tracing::info!(path = %newest.path.display(), "new export found");
                return Ok(RefreshOutcome {
                    export: newest.describe(),
                    recent: recent.len(),
                });
            }

            let waited = start.elapsed();
            if waited >= settings.timeout {
                return Err(RefreshError::Timeout {
                    dir: settings.export_dir.clone(),
                    waited,
                });
            }
            std::thread::sleep(settings.poll_interval.min(settings.timeout - waited));
        }
    }
}
