//! Shared logging setup for Kalycs binaries.
//!
//! Events go to two sinks: a size-rotated file under the app data directory
//! and stderr. The core crates only emit `tracing` events; this is the one
//! place a subscriber is installed.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str =
    "kalycs=info,kalycs_catalog=info,kalycs_classifier=info,kalycs_watcher=info";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration for a Kalycs binary.
pub struct LogConfig<'a> {
    /// Directory holding the rotated log files; created if missing.
    pub log_dir: PathBuf,
    /// Base name of the log files, e.g. `kalycsd`.
    pub app_name: &'a str,
    /// Mirror the full file-level output to stderr.
    pub verbose: bool,
}

/// Initialize tracing with a rolling file writer and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    fs::create_dir_all(&config.log_dir).with_context(|| {
        format!(
            "Failed to create log directory: {}",
            config.log_dir.display()
        )
    })?;

    let file_writer = SharedRollingWriter::new(config.log_dir, config.app_name)?;

    let file_filter = env_filter();
    let console_filter = if config.verbose {
        env_filter()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .init();

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Appender that rotates `<name>.log` through `<name>.log.1..N` once the
/// active file passes the size cap.
struct RollingAppender {
    dir: PathBuf,
    base_name: String,
    file: File,
    written: u64,
}

impl RollingAppender {
    fn new(dir: PathBuf, base_name: &str) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let base_name = sanitize_name(base_name);
        let (file, written) = open_append(&dir.join(format!("{base_name}.log")))?;
        let mut appender = Self {
            dir,
            base_name,
            file,
            written,
        };
        if appender.written > MAX_LOG_FILE_SIZE {
            appender.rotate()?;
        }
        Ok(appender)
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base_name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{index}", self.base_name))
    }

    fn rotate(&mut self) -> io::Result<()> {
        let _ = self.file.flush();

        let oldest = self.rotated_path(MAX_LOG_FILES - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..MAX_LOG_FILES - 1).rev() {
            let src = self.rotated_path(index);
            if src.exists() {
                fs::rename(&src, self.rotated_path(index + 1))?;
            }
        }
        let current = self.current_path();
        if current.exists() {
            fs::rename(&current, self.rotated_path(1))?;
        }

        let (file, written) = open_append(&self.current_path())?;
        self.file = file;
        self.written = written;
        Ok(())
    }
}

impl Write for RollingAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written + buf.len() as u64 > MAX_LOG_FILE_SIZE {
            self.rotate()?;
        }
        let bytes = self.file.write(buf)?;
        self.written += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &std::path::Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Clone)]
struct SharedRollingWriter {
    inner: Arc<Mutex<RollingAppender>>,
}

impl SharedRollingWriter {
    fn new(dir: PathBuf, base_name: &str) -> Result<Self> {
        let appender = RollingAppender::new(dir, base_name)
            .with_context(|| format!("Failed to open log file for {base_name}"))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(appender)),
        })
    }
}

struct SharedRollingWriterGuard {
    inner: Arc<Mutex<RollingAppender>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = SharedRollingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedRollingWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedRollingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.flush()
    }
}
