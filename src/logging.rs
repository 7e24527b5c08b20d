use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Filter used when `RUST_LOG` is not set
fn default_directives(verbose: bool) -> Vec<String> {
    let crate_level = if verbose { "trace" } else { "debug" };
    vec![
        "info".to_string(),
        format!("tui_flightmap={crate_level}"),
        "hyper_util=warn".to_string(),
        "reqwest=warn".to_string(),
    ]
}

/// Log to a file: the terminal belongs to the map while it runs.
///
/// The returned guard flushes the background writer when dropped and must
/// outlive every log call.
pub fn init(log_file: &Path, verbose: bool) -> anyhow::Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose).join(",")));

    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = log_file
        .file_name()
        .context("log file path has no file name")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_writer(writer);

    registry().with(env_filter).with(file_layer).try_init()?;
    Ok(guard)
}
