//! Logging Infrastructure
//!
//! Structured logging for development and production:
//! - Console output, pretty or JSON
//! - Daily rotating application logs under `<log_dir>/app` (pruned by
//!   [`cleanup_old_logs`])
//! - Daily rotating audit logs under `<log_dir>/audit` for the `audit`
//!   target (never pruned)

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Days application logs are kept
pub const LOG_RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn rolling(dir: &Path, prefix: &str) -> anyhow::Result<RollingFileAppender> {
    fs::create_dir_all(dir)?;
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)?)
}

/// Initialize the logging system
///
/// # Examples
/// ```no_run
/// // Development (console only)
/// frame_bus::init_logger_with_file("debug", false, None)?;
///
/// // Production (console + files)
/// frame_bus::init_logger_with_file("info", true, Some("./work_dir/logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console: BoxedLayer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_filter(level_filter(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(level_filter(level))
            .boxed()
    };
    layers.push(console);

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);

        let app_log = rolling(&log_dir.join("app"), "app")?;
        let app_layer: BoxedLayer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(app_log)
            .with_filter(level_filter(level))
            .with_filter(filter_fn(|meta| meta.target() != "audit"))
            .boxed();
        layers.push(app_layer);

        let audit_log = rolling(&log_dir.join("audit"), "audit")?;
        let audit_layer: BoxedLayer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(audit_log)
            .with_filter(filter_fn(|meta| meta.target() == "audit"))
            .boxed();
        layers.push(audit_layer);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(periodic_cleanup(log_dir.to_path_buf()));
        }
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

/// Initialize the logging system (console only)
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

/// Delete `app.YYYY-MM-DD.log` files older than `retain_days`
///
/// Audit logs are never touched. Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &Path, retain_days: i64) -> anyhow::Result<usize> {
    let cutoff = Local::now().date_naive() - chrono::Duration::days(retain_days);
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let date = name
            .strip_prefix("app.")
            .and_then(|d| d.strip_suffix(".log"))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        if let Some(date) = date
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Prune application logs once an hour
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;
        if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_only_removes_expired_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let audit = dir.path().join("audit");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&audit).unwrap();

        let today = Local::now().date_naive();
        let old = today - chrono::Duration::days(30);
        let old_name = format!("app.{}.log", old.format("%Y-%m-%d"));
        let new_name = format!("app.{}.log", today.format("%Y-%m-%d"));
        let audit_name = format!("audit.{}.log", old.format("%Y-%m-%d"));
        for path in [app.join(&old_name), app.join(&new_name), app.join("notes.txt")] {
            fs::write(path, b"x").unwrap();
        }
        fs::write(audit.join(&audit_name), b"x").unwrap();

        assert_eq!(cleanup_old_logs(dir.path(), 14).unwrap(), 1);
        assert!(!app.join(&old_name).exists());
        assert!(app.join(&new_name).exists());
        assert!(app.join("notes.txt").exists());
        assert!(audit.join(&audit_name).exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("none"), 14).unwrap(), 0);
    }
}
