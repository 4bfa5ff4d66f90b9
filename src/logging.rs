use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, RollingFileAppender},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "iam-reference.log";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Keeps the background log writer alive; drop it last.
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Installs the global subscriber. Stdout carries the tool protocol, so logs
/// only ever go to the rolling file and (for warnings) stderr.
pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    if logging_config.filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    if logging_config.dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }

    let log_dir = absolute_log_dir(&logging_config.dir)?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;

    let purge_warnings = purge_expired_logs(
        &log_dir,
        LOG_FILE_PREFIX,
        logging_config.retention_days,
        SystemTime::now(),
    );
    let (writer, worker_guard) =
        tracing_appender::non_blocking(rolling_appender(&log_dir, &logging_config.rotation));

    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(build_env_filter(&logging_config.filter)?);

    let stderr_layer = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        retention_days = logging_config.retention_days,
        "logging_initialized"
    );
    for warning in purge_warnings {
        tracing::warn!(target: "logging", warning = %warning, "logging_retention_warning");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
    })
}

fn build_env_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter).with_context(|| format!("failed to parse logging.filter '{filter}'"))
}

fn rolling_appender(log_dir: &Path, rotation: &LoggingRotation) -> RollingFileAppender {
    match rotation {
        LoggingRotation::Daily => rolling::daily(log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(log_dir, LOG_FILE_PREFIX),
    }
}

fn absolute_log_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .context("failed to read current working directory for logging.dir resolution")?;
    Ok(cwd.join(dir))
}

/// Removes prefixed log files last modified at or before `now - retention_days`.
/// Problems are returned as warnings; they are logged once the subscriber is up.
fn purge_expired_logs(
    log_dir: &Path,
    prefix: &str,
    retention_days: usize,
    now: SystemTime,
) -> Vec<String> {
    let retention = Duration::from_secs((retention_days as u64).saturating_mul(SECONDS_PER_DAY));
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) => {
            return vec![format!(
                "failed to scan logging directory {}: {err}",
                log_dir.display()
            )];
        }
    };

    let mut warnings = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(format!("failed to iterate logging directory entries: {err}"));
                continue;
            }
        };
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }

        let path = entry.path();
        match expired_at(&entry, cutoff) {
            Ok(false) => {}
            Ok(true) => {
                if let Err(err) = fs::remove_file(&path) {
                    warnings.push(format!(
                        "failed to remove expired log file {}: {err}",
                        path.display()
                    ));
                }
            }
            Err(err) => warnings.push(format!("failed to stat {}: {err}", path.display())),
        }
    }

    warnings
}

fn expired_at(entry: &fs::DirEntry, cutoff: SystemTime) -> std::io::Result<bool> {
    let metadata = entry.metadata()?;
    if !metadata.is_file() {
        return Ok(false);
    }
    Ok(metadata.modified()? <= cutoff)
}
