//! Named console logger.
//!
//! Lines look like `2024-01-15 12:00:00,123 - weather - INFO - sending request`.
//! The client itself only emits `tracing` events; installing a subscriber is up
//! to the caller, and [`create_console_logger`] is one way to do it.

use std::fmt;

use chrono::Local;
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

use crate::error::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// `timestamp - name - LEVEL - message` formatter.
#[derive(Debug, Clone)]
struct NamedFormat {
    name: String,
}

impl<S, N> FormatEvent<S, N> for NamedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            self.name,
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// A configured console logger that has not been installed yet.
#[derive(Clone)]
pub struct ConsoleLogger {
    name: String,
    level: Level,
    dispatch: Dispatch,
}

impl fmt::Debug for ConsoleLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLogger")
            .field("name", &self.name)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl ConsoleLogger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Install as the process-wide default. Fails if a default is already set.
    pub fn init(self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch)
            .map_err(|e| Error::Logger(e.to_string()))
    }

    /// Run `f` with this logger as the default for the current thread.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

/// Build a logger that writes to stderr and drops events below `level`.
pub fn create_console_logger(name: impl Into<String>, level: Level) -> ConsoleLogger {
    build_logger(name.into(), level, std::io::stderr)
}

pub(crate) fn build_logger<W>(name: String, level: Level, make_writer: W) -> ConsoleLogger
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from_level(level))
        .with_ansi(false)
        .with_writer(make_writer)
        .event_format(NamedFormat { name: name.clone() })
        .finish();

    ConsoleLogger {
        name,
        level,
        dispatch: Dispatch::new(subscriber),
    }
}
