pub mod api;
pub mod models;
pub mod services;

pub use api::{AnalysisError, Analyzer};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "examforge_";
const LOGS_TO_KEEP: usize = 30;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

/// Logging knobs read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    /// `None` when `EXAMFORGE_DISABLE_FILE_LOG` is set.
    dir: Option<PathBuf>,
    cleanup: bool,
}

impl LogSettings {
    fn from_env() -> Self {
        let dir = if env_flag("EXAMFORGE_DISABLE_FILE_LOG") {
            None
        } else {
            Some(match std::env::var("EXAMFORGE_LOG_DIR") {
                Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
                _ => default_logs_dir(),
            })
        };
        Self {
            dir,
            cleanup: !env_flag("EXAMFORGE_DISABLE_LOG_CLEANUP"),
        }
    }
}

fn default_logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("examforge").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn session_log_name() -> String {
    format!("{}{}.log", LOG_PREFIX, chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Create the log directory and a non-blocking writer for this session.
fn open_session_log(dir: &Path) -> Result<(NonBlocking, WorkerGuard, PathBuf), std::io::Error> {
    fs::create_dir_all(dir)?;
    let name = session_log_name();
    let appender = tracing_appender::rolling::never(dir, &name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((writer, guard, dir.join(name)))
}

/// Initialize logging: an `RUST_LOG`-filtered stderr layer plus, unless
/// disabled, a timestamped per-session log file.
///
/// Never fails: an unwritable log directory degrades to console-only output.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    static INIT: OnceLock<()> = OnceLock::new();
    if INIT.set(()).is_err() {
        return;
    }

    let settings = LogSettings::from_env();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut open_error = None;
    let session = settings.dir.as_deref().and_then(|dir| match open_session_log(dir) {
        Ok(opened) => Some(opened),
        Err(e) => {
            open_error = Some(e);
            None
        }
    });

    let (file_layer, log_path) = match session {
        Some((writer, guard, path)) => {
            let _ = LOG_GUARD.set(guard);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    // stderr, so report output on stdout stays clean
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    match (&log_path, open_error) {
        (Some(path), _) => info!(path = %path.display(), version = env!("CARGO_PKG_VERSION"), "logging.started"),
        (None, Some(e)) => warn!(error = %e, "log directory not writable, console only"),
        (None, None) => info!("file logging disabled"),
    }

    if let (Some(dir), true) = (settings.dir, settings.cleanup && log_path.is_some()) {
        std::thread::spawn(move || prune_session_logs(&dir, LOGS_TO_KEEP));
    }
}

/// Delete all but the `keep` newest session logs. Session names embed a
/// sortable timestamp, so name order is age order. Other files are left alone.
fn prune_session_logs(dir: &Path, keep: usize) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut sessions: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_PREFIX) && n.ends_with(".log"))
        })
        .collect();
    if sessions.len() <= keep {
        return 0;
    }

    sessions.sort();
    let stale = sessions.len() - keep;
    sessions
        .iter()
        .take(stale)
        .filter(|p| fs::remove_file(p).is_ok())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_prune_keeps_newest_sessions() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=5 {
            fs::write(dir.path().join(format!("{}2024010{}_000000.log", LOG_PREFIX, day)), "x").unwrap();
        }
        fs::write(dir.path().join("other.log"), "keep me").unwrap();

        assert_eq!(prune_session_logs(dir.path(), 2), 3);
        assert_eq!(
            names_in(dir.path()),
            vec![
                format!("{}20240104_000000.log", LOG_PREFIX),
                format!("{}20240105_000000.log", LOG_PREFIX),
                "other.log".to_string(),
            ]
        );
    }

    #[test]
    fn test_prune_under_limit_and_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(format!("{}20240101_000000.log", LOG_PREFIX)), "x").unwrap();
        assert_eq!(prune_session_logs(dir.path(), 30), 0);
        assert_eq!(prune_session_logs(&dir.path().join("absent"), 1), 0);
    }

    #[test]
    fn test_session_log_opens_in_new_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("logs");
        let (_writer, _guard, path) = open_session_log(&nested).unwrap();
        assert!(nested.is_dir());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(LOG_PREFIX) && name.ends_with(".log"));
    }
}
