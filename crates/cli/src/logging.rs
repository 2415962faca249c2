use anyhow::{anyhow, Result};
use mdpress_config::LogConfig;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Log files larger than this are truncated on startup.
const MAX_LOG_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Picks the log file: `--log`, then `MDPRESS_LOG_PATH`, then the config file.
pub fn log_path(cli_log: Option<PathBuf>, config: &LogConfig) -> Option<PathBuf> {
    if let Some(log_path) = cli_log {
        Some(log_path)
    } else if let Ok(log_path) = std::env::var("MDPRESS_LOG_PATH").map(PathBuf::from) {
        Some(log_path)
    } else {
        config.log_file.as_ref().map(PathBuf::from)
    }
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    let max_level = config
        .max_level
        .parse()
        .unwrap_or(tracing::Level::DEBUG);

    let directives = if config.log_target.trim().is_empty() {
        max_level.to_string()
    } else {
        format!("{max_level},{}", config.log_target)
    };

    EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid log-target {:?}: {err}", config.log_target);
        EnvFilter::new(max_level.to_string())
    })
}

fn install<W>(filter: EnvFilter, writer: W, ansi: bool) -> Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_line_number(true)
        .with_writer(writer)
        .with_ansi(ansi)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn file_writer(log_path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Ok(metadata) = std::fs::metadata(log_path) {
        if log_path.is_file() && metadata.len() > MAX_LOG_FILE_SIZE {
            std::fs::remove_file(log_path)?;
        }
    }

    let file_name = log_path
        .file_name()
        .ok_or_else(|| anyhow!("no file name in {log_path:?}"))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| anyhow!("{log_path:?} has no parent"))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);

    Ok(tracing_appender::non_blocking(file_appender))
}

/// Installs the global subscriber, writing to the log file if any, to stderr otherwise.
///
/// The returned guard flushes the file writer on drop and must be kept alive.
pub fn init(log_file: Option<PathBuf>, config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(config);

    match log_file {
        Some(log_path) => {
            let (non_blocking, guard) = file_writer(&log_path)?;
            install(filter, non_blocking, false)?;
            Ok(Some(guard))
        }
        None => {
            install(filter, std::io::stderr, std::io::stderr().is_terminal())?;
            Ok(None)
        }
    }
}
