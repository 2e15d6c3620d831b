//! Centralized logging configuration for Metrix
//!
//! Library crates only emit `tracing` events. Binaries and tests install a
//! subscriber once through this crate.
//!
//! Every output is one formatting layer with its own filter, built by
//! [`LogConfig::layer`] over any writer. The `init*` functions pick a writer
//! and install the layer globally; tests can instead scope a layer with
//! `tracing::subscriber::with_default`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use metrix_logging::{init, init_from_config, LogConfig, LogOutput};
//!
//! // Defaults (info, stdout)
//! init(LogConfig::default());
//!
//! // From the `[logging]` table; keep the guard alive while logging to files
//! let _guard = init_from_config(&config.logging)?;
//! ```

use metrix_config::LoggingConfig;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub use tracing::{debug, error, info, instrument, trace, warn, Level};

pub use tracing_appender::non_blocking::WorkerGuard;

/// Type-erased formatting layer, ready to stack on a [`Registry`]
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Output destination for console logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    #[default]
    Local,
    Utc,
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Force debug level, ignoring `default_level` and RUST_LOG
    pub debug: bool,
    /// Filter directive used when RUST_LOG is not set
    pub default_level: String,
    pub output: LogOutput,
    pub show_target: bool,
    pub timestamp_format: TimestampFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_level: "info".to_string(),
            output: LogOutput::Stdout,
            show_target: false,
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console settings for a `[logging]` table: its level, on stderr
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new()
            .default_level(config.level.clone())
            .output(LogOutput::Stderr)
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn utc(self) -> Self {
        self.timestamp_format(TimestampFormat::Utc)
    }

    pub fn local(self) -> Self {
        self.timestamp_format(TimestampFormat::Local)
    }

    fn build_filter(&self) -> EnvFilter {
        if self.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&self.default_level))
        }
    }

    /// Formatting layer writing to `writer`, filtered by this config
    pub fn layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let fmt_layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(self.show_target);
        let filter = self.build_filter();

        match self.timestamp_format {
            TimestampFormat::Utc => fmt_layer
                .with_timer(UtcTime::rfc_3339())
                .with_filter(filter)
                .boxed(),
            TimestampFormat::Local => fmt_layer
                .with_timer(LocalTime::rfc_3339())
                .with_filter(filter)
                .boxed(),
        }
    }

    /// Layer for the configured console stream, colored only on a terminal
    pub fn console_layer(&self) -> BoxedLayer {
        match self.output {
            LogOutput::Stdout => self.layer(std::io::stdout, std::io::stdout().is_terminal()),
            LogOutput::Stderr => self.layer(std::io::stderr, std::io::stderr().is_terminal()),
        }
    }
}

/// Non-blocking daily-rotated writer for `log_path`.
///
/// Files are named `{file_name}.YYYY-MM-DD` next to `log_path`; the parent
/// directory is created if missing. Buffered lines are written out when the
/// returned guard drops.
pub fn file_writer(log_path: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    let log_dir = log_path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(log_dir).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("create log directory {}: {}", log_dir.display(), e),
        )
    })?;

    let file_name = log_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("metrix.log");

    let appender = tracing_appender::rolling::daily(log_dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Layer and optional file guard for a `[logging]` table.
///
/// With `log_dir` set, logs go to `{log_dir}/{file_prefix}.log.YYYY-MM-DD`;
/// otherwise to stderr.
pub fn layer_from_config(config: &LoggingConfig) -> std::io::Result<(BoxedLayer, Option<WorkerGuard>)> {
    let log_config = LogConfig::from_config(config);
    match &config.log_dir {
        Some(dir) => {
            let path = dir.join(format!("{}.log", config.file_prefix));
            let (writer, guard) = file_writer(&path)?;
            Ok((log_config.layer(writer, false), Some(guard)))
        }
        None => Ok((log_config.console_layer(), None)),
    }
}

/// Install the console subscriber.
///
/// # Panics
///
/// Panics if a global subscriber is already installed; use [`try_init`] when
/// that can happen.
pub fn init(config: LogConfig) {
    if let Err(e) = try_init(config) {
        panic!("failed to initialize logging: {}", e);
    }
}

pub fn try_init(config: LogConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(config.console_layer())
        .try_init()
}

/// Install a file subscriber and return the guard that keeps it writing
pub fn init_with_file(config: LogConfig, log_path: &Path) -> std::io::Result<WorkerGuard> {
    let (writer, guard) = file_writer(log_path)?;
    tracing_subscriber::registry()
        .with(config.layer(writer, false))
        .try_init()
        .map_err(std::io::Error::other)?;
    Ok(guard)
}

/// Install whatever the `[logging]` table asks for
pub fn init_from_config(config: &LoggingConfig) -> std::io::Result<Option<WorkerGuard>> {
    let (layer, guard) = layer_from_config(config)?;
    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(std::io::Error::other)?;
    Ok(guard)
}

/// Route logs through the test harness writer. Safe to call from every test.
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}
