use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_PATH: OnceCell<PathBuf> = OnceCell::new();
static APP_NAME: OnceCell<String> = OnceCell::new();

/// Shared handle to the session log file, handed to the fmt layer.
#[derive(Clone)]
struct SessionFile(Arc<Mutex<File>>);

struct SessionFileGuard<'a>(MutexGuard<'a, File>);

impl Write for SessionFileGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for SessionFile {
    type Writer = SessionFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SessionFileGuard(self.0.lock())
    }
}

/// Installs the global `tracing` subscriber: a per-session log file, plus
/// stdout when `stream_to_stdout` is set. Returns the log file path.
pub fn init_logging(config: &LoggingConfig, app_name: &str) -> Result<PathBuf> {
    let log_dir = config.resolved_log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    clean_old_logs(&log_dir, app_name, config.retention.saturating_sub(1))?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(session_log_name(app_name, &timestamp.to_string()));
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(SessionFile(Arc::new(Mutex::new(file))));

    let stdout_layer = config
        .stream_to_stdout
        .then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|_| anyhow::anyhow!("Logger already initialized"))?;

    let _ = LOG_PATH.set(log_path.clone());
    let _ = APP_NAME.set(app_name.to_string());
    info!("=== {} Session Started ===", app_name);

    Ok(log_path)
}

pub fn finalize_logs() {
    if let Some(name) = APP_NAME.get() {
        info!("=== {} Session Ended ===", name);
    }
}

pub fn current_log_path() -> Option<&'static Path> {
    LOG_PATH.get().map(PathBuf::as_path)
}

pub fn session_log_name(app_name: &str, timestamp: &str) -> String {
    format!("{}_{}.log", app_name, timestamp)
}

/// Deletes all but the `keep` newest `<app_name>_*.log` files in `log_dir`.
pub fn clean_old_logs(log_dir: &Path, app_name: &str, keep: usize) -> Result<usize> {
    let prefix = format!("{}_", app_name);
    let mut log_files: Vec<(PathBuf, SystemTime)> = Vec::new();

    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("log") {
                continue;
            }
            let matches_prefix = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix));
            if !matches_prefix {
                continue;
            }
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }

    // newest first; names carry the timestamp, so they break ties
    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        if fs::remove_file(path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}
