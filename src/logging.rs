//! Log stream setup: timestamped, level-tagged lines on stdout.
//!
//! Every line looks like
//!
//! ```text
//! 2026-02-02 18:57:50.123456+00:00 - WARNING: Optional config 'dpi' missing. Using default: 300
//! ```
//!
//! Warnings come in two classes. Messages starting with [`OPTION_TAG`]
//! report a value that was present but ignored (or a configured behaviour
//! that is not implemented yet); they are coloured blue. All other warnings
//! are yellow, errors red.
//!
//! Nothing here installs a process-global subscriber. A [`LogContext`] owns
//! its own [`Dispatch`] and the caller runs work inside
//! [`LogContext::in_scope`], so tests can capture output in parallel.

use chrono::Utc;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Prefix marking the "invalid option ignored" warning class.
pub const OPTION_TAG: &str = "[OPT]";

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";

/// Explicit logging context for one process run.
#[derive(Clone)]
pub struct LogContext {
    dispatch: Dispatch,
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext").finish_non_exhaustive()
    }
}

impl LogContext {
    /// Log to stdout; colour when stdout is a terminal. `RUST_LOG` overrides
    /// the default `info` filter.
    pub fn stdout() -> Self {
        let ansi = io::stdout().is_terminal();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        Self::with_writer(io::stdout, ansi, filter)
    }

    /// Log to any writer with an explicit filter.
    pub fn with_writer<W>(writer: W, ansi: bool, filter: EnvFilter) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .event_format(LineFormat { ansi })
            .with_writer(writer)
            .with_env_filter(filter)
            .finish();
        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Plain-text context writing into a shared buffer at `debug` level.
    pub fn capture() -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        let ctx = Self::with_writer(buffer.clone(), false, EnvFilter::new("debug"));
        (ctx, buffer)
    }

    /// Run `f` with this context as the active subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

/// In-memory log sink.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Captured lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Warning class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningClass {
    /// Default substituted for a missing value, or other generic warnings.
    Generic,
    /// `[OPT]`-tagged: a provided option was ignored or is not implemented.
    IgnoredOption,
}

impl WarningClass {
    pub fn of(message: &str) -> Self {
        if message.starts_with(OPTION_TAG) {
            WarningClass::IgnoredOption
        } else {
            WarningClass::Generic
        }
    }
}

/// `<timestamp> - <LEVEL>: <message> [key=value …]`
struct LineFormat {
    ansi: bool,
}

impl LineFormat {
    fn label_and_colour(level: Level, message: &str) -> (&'static str, Option<&'static str>) {
        match level {
            Level::ERROR => ("ERROR", Some(RED)),
            Level::WARN => match WarningClass::of(message) {
                WarningClass::IgnoredOption => ("WARNING", Some(BLUE)),
                WarningClass::Generic => ("WARNING", Some(YELLOW)),
            },
            Level::INFO => ("INFO", None),
            Level::DEBUG => ("DEBUG", None),
            Level::TRACE => ("TRACE", None),
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.6f+00:00");
        let (label, colour) = Self::label_and_colour(*event.metadata().level(), &fields.message);

        write!(writer, "{timestamp} - ")?;
        match colour.filter(|_| self.ansi) {
            Some(c) => write!(writer, "{c}{label}: {}{}{RESET}", fields.message, fields.extra)?,
            None => write!(writer, "{label}: {}{}", fields.message, fields.extra)?,
        }
        writeln!(writer)
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    extra: String,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.extra.push_str(&format!(" {}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message.push_str(&format!("{value:?}"));
        } else {
            self.extra.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}
