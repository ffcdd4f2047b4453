use std::fs::{self, File};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::AppPaths;
use crate::errors::Result;

const DEFAULT_FILTER: &str = "warn";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Logs to stderr. Used by the one-shot CLI commands.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs to `<base>/cookbook.log`; the TUI owns the terminal while it runs.
pub fn init_file(paths: &AppPaths) -> Result<()> {
    fs::create_dir_all(&paths.base_dir)?;
    let file = File::create(&paths.log_file)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
