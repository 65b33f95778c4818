//! Debug logging support
//!
//! When debug mode is enabled, engine activity (placeholder warnings,
//! truncation events, in-place edits) is appended to a log file:
//! /var/log/stredit.log when that is writable, ~/.stredit/stredit.log
//! otherwise. Logging failures never fail the edit itself.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Initialize file logging when debug mode is on.
///
/// Returns the path of the log file, or None when logging is disabled
/// or no log location could be opened.
pub fn init_debug_logging(debug_enabled: bool) -> Result<Option<PathBuf>> {
    if !debug_enabled {
        return Ok(None);
    }

    let (log_file, log_path) = match open_log_file() {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Warning: debug logging unavailable: {e:#}");
            return Ok(None);
        }
    };

    // RUST_LOG overrides the default filter when set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stredit=debug"));
    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)
        .context("a tracing subscriber is already installed")?;

    Ok(Some(log_path))
}

/// Open the log file at the first usable location. Trying the open
/// directly doubles as the writability probe for /var/log.
fn open_log_file() -> Result<(File, PathBuf)> {
    let system_path = PathBuf::from("/var/log/stredit.log");
    if let Ok(file) = append_to(&system_path) {
        return Ok((file, system_path));
    }

    let home = dirs::home_dir().context("cannot determine home directory")?;
    let dir = home.join(".stredit");
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let path = dir.join("stredit.log");
    let file = append_to(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    Ok((file, path))
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_debug_logging_disabled() {
        let result = init_debug_logging(false);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_append_to_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.log");
        append_to(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_open_log_file_picks_a_writable_location() {
        // whichever location wins, it must be openable for append
        let (_, path) = open_log_file().unwrap();
        assert!(path.ends_with("stredit.log"));
    }
}
