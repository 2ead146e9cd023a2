//! Logging and tracing initialization.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;
use crate::FormcheckResult;

/// Log destination: the configured file (appended to) or stderr.
///
/// Stderr keeps reports printed on stdout machine-readable.
fn make_writer(config: &LoggingConfig) -> FormcheckResult<BoxMakeWriter> {
    match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        None => Ok(BoxMakeWriter::new(std::io::stderr)),
    }
}

/// Build the tracing dispatcher described by `config` without installing it.
pub fn build_dispatch(config: &LoggingConfig) -> FormcheckResult<Dispatch> {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let writer = make_writer(config)?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(config.file.is_none());

    let dispatch = if config.json {
        Dispatch::new(builder.json().finish())
    } else {
        Dispatch::new(
            builder
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };
    Ok(dispatch)
}

/// Initialize the global tracing subscriber with the given configuration.
///
/// Fails only when the log file cannot be opened.
pub fn init_logging(config: &LoggingConfig) -> FormcheckResult<()> {
    let dispatch = build_dispatch(config)?;
    tracing::dispatcher::set_global_default(dispatch).ok();
    Ok(())
}
