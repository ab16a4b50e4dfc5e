//! Logging infrastructure - structured tracing for the bridge
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level plus `RUST_LOG`-style filter directives
//! - Pretty, compact or JSON output
//! - Non-blocking console or daily-rotated file output
//!
//! Nothing is installed implicitly; a host that never calls [`init`] gets
//! no subscriber and every event below compiles to a disabled callsite check.

use crate::declarations::Signature;
use crate::error::BridgeError;
use crate::interop::{CallingConvention, InterchangeValue};
use once_cell::sync::OnceCell;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line
    Pretty,
    /// Single-line
    Compact,
    /// Structured JSON lines
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// File with daily rotation
    File { directory: String, prefix: String },
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Emit span open/close events
    pub span_events: bool,
    /// Extra filter directives (e.g., "numbridge::bridge=trace")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Overlay environment variables on top of this config
    pub fn apply_env(mut self) -> Self {
        // NUMBRIDGE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("NUMBRIDGE_LOG_LEVEL") {
            if let Ok(level) = Level::from_str(&level) {
                self.level = level;
            }
        }

        // NUMBRIDGE_LOG_FORMAT: pretty, compact, json
        if let Ok(format) = std::env::var("NUMBRIDGE_LOG_FORMAT") {
            if let Ok(format) = format.parse() {
                self.format = format;
            }
        }

        // NUMBRIDGE_LOG_FILE: directory for rotated log files
        if let Ok(directory) = std::env::var("NUMBRIDGE_LOG_FILE") {
            self.output = LogOutput::File {
                directory,
                prefix: "numbridge".to_string(),
            };
        }

        // NUMBRIDGE_LOG_SPANS: show span events
        if std::env::var("NUMBRIDGE_LOG_SPANS").is_ok() {
            self.span_events = true;
        }

        self
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }
}

/// Initialize logging from the environment
pub fn init() -> Option<WorkerGuard> {
    init_with_config(LogConfig::from_env())
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber; later calls return `None`. The
/// returned guard flushes the non-blocking writer when dropped, so keep it
/// alive for as long as events should be written.
pub fn init_with_config(config: LogConfig) -> Option<WorkerGuard> {
    let mut guard = None;
    LOGGER_INITIALIZED.get_or_init(|| {
        guard = install(&config);
    });
    guard
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

fn install(config: &LogConfig) -> Option<WorkerGuard> {
    let (writer, guard) = match &config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::File { directory, prefix } => {
            tracing_appender::non_blocking(rolling::daily(directory, prefix))
        }
    };

    let span_events = span_events_config(config.span_events);
    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .pretty()
            .with_span_events(span_events)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(writer)
            .compact()
            .with_span_events(span_events)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(writer)
            .json()
            .with_span_events(span_events)
            .boxed(),
    };

    // Another subscriber may already be installed by the host; leave it be.
    match tracing_subscriber::registry()
        .with(build_filter(config))
        .with(layer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "numbridge={}",
            config.level.as_str().to_lowercase()
        ))
    });

    match &config.filter {
        Some(directives) => directives
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .fold(base, |filter, directive| match directive.parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => {
                    tracing::warn!(directive, "ignoring invalid filter directive");
                    filter
                }
            }),
        None => base,
    }
}

fn span_events_config(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

// ============================================================================
// Bridge-specific events
// ============================================================================

/// Log a signature entering a declaration table
pub fn log_declaration(signature: &Signature) {
    tracing::debug!(
        event = "declare",
        function = signature.name(),
        signature = %signature,
        "Foreign function declared"
    );
}

/// Log a bridge finishing symbol binding
pub fn log_bridge_ready(library: &str, functions: usize, convention: CallingConvention) {
    tracing::info!(
        event = "bridge_ready",
        library,
        functions,
        convention = convention.name(),
        "Marshaling bridge ready"
    );
}

/// Log FFI function call
#[inline]
pub fn log_ffi_call(function: &str, args: &[InterchangeValue]) {
    tracing::trace!(
        event = "ffi_call",
        function,
        args = ?args,
        "Calling foreign function"
    );
}

/// Log FFI function return
#[inline]
pub fn log_ffi_return(function: &str, result: &InterchangeValue) {
    tracing::trace!(
        event = "ffi_return",
        function,
        result = %result,
        "Foreign function returned"
    );
}

/// Log a host value refused by a checked narrowing
pub fn log_narrowing_rejected(function: &str, value: &str, target: &str) {
    tracing::debug!(
        event = "narrowing_rejected",
        function,
        value,
        target,
        "Value does not fit target type"
    );
}

/// Log a failed invocation
pub fn log_ffi_error(function: &str, error: &BridgeError) {
    match error {
        // The foreign routine itself refused; not a bridge defect
        BridgeError::ForeignCallFailure { code, .. } => tracing::warn!(
            event = "ffi_error",
            function,
            kind = error.kind(),
            code,
            "Foreign function reported failure"
        ),
        _ => tracing::error!(
            event = "ffi_error",
            function,
            kind = error.kind(),
            error = %error,
            "Foreign call rejected"
        ),
    }
}
