//! Structured logging setup.
//!
//! The crates in this workspace emit `tracing` events at their operation
//! boundaries (rejected allocations, teardown, transfers). This module
//! installs a `tracing-subscriber` fmt subscriber that renders each event
//! as a single tagged line:
//!
//! ```text
//! [Mon Oct 19 09:41:07 2026][strata_arena::bump]: allocation rejected arena=arena#3 requested=64 remaining=8
//! ```
//!
//! The filter is read from the `STRATA_LOG` environment variable using
//! `EnvFilter` syntax, falling back to [`LogConfig::default_directive`].

use std::error::Error;
use std::fmt;

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "STRATA_LOG";

/// Logging configuration.
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Filter used when `STRATA_LOG` is unset or unparsable.
    ///
    /// Default: `"warn"`.
    pub default_directive: String,
    /// Whether to emit ANSI colour codes.
    pub ansi: bool,
}

impl LogConfig {
    /// Default filter directive.
    pub const DEFAULT_DIRECTIVE: &'static str = "warn";
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_directive: Self::DEFAULT_DIRECTIVE.to_string(),
            ansi: false,
        }
    }
}

/// Install the global subscriber.
///
/// Returns an error if a global subscriber is already set, which makes
/// repeated calls from tests harmless.
pub fn init(config: &LogConfig) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .event_format(TaggedFormat)
        .try_init()
}

/// Render `at` the way C's `asctime` does, minus the trailing newline.
pub fn asctime(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
    );
    at.format(&format).unwrap_or_else(|_| at.to_string())
}

/// The current local time, or UTC when the local offset is unavailable.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Build one log line: `[<timestamp>][<tag>]: <message>`.
pub fn format_line(at: OffsetDateTime, tag: &str, message: &str) -> String {
    let mut line = String::new();
    // Writing into a String cannot fail.
    let _ = write_prefix(&mut line, at, tag);
    line.push_str(message);
    line
}

/// Write the `[<timestamp>][<tag>]: ` prefix shared by every line.
fn write_prefix(out: &mut impl fmt::Write, at: OffsetDateTime, tag: &str) -> fmt::Result {
    write!(out, "[{}][{}]: ", asctime(at), tag)
}

/// Event formatter producing `[<timestamp>][<target>]: <fields>` lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaggedFormat;

impl<S, N> FormatEvent<S, N> for TaggedFormat
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
        write_prefix(&mut writer, now(), event.metadata().target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
