//! Human-readable console handler
//!
//! Renders `TIME LVL [file:line] "message" attrs=...` lines. Time, level,
//! call-site and message are placed directly so their position never moves;
//! everything else goes through an inner structured encoder whose output is
//! appended after `attrs=`.

use crate::core::{
    quote_into, Attr, Encoder, Handler, HandlerOptions, Level, LevelVar, OutputFormat, Record,
    Result, SharedWriter, TimestampFormat, RESERVED_KEYS,
};
use crate::handlers::StructuredHandler;
use colored::Color;
use std::any::Any;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

/// Separator between the message and the encoded attributes
const ATTRS_SEPARATOR: &str = " attrs=";

#[derive(Debug, Clone)]
pub struct ConsoleHandler {
    writer: SharedWriter,
    encoder: Encoder,
    level: LevelVar,
    add_source: bool,
    time_format: TimestampFormat,
    use_colors: bool,
}

/// Attribute rewriting of the console encoder: reserved keys and empty values
/// never reach the attrs segment.
fn console_options() -> HandlerOptions {
    HandlerOptions::new().with_replace_attr(Arc::new(|_groups: &[String], mut attr: Attr| {
        if RESERVED_KEYS.contains(&attr.key.as_str()) || attr.value.normalize() {
            None
        } else {
            Some(attr)
        }
    }))
}

fn level_color(label: &str) -> Color {
    match label {
        "DBG" => Color::Magenta,
        "INF" => Color::Blue,
        "WRN" => Color::Yellow,
        "ERR" => Color::Red,
        _ => Color::Red,
    }
}

impl ConsoleHandler {
    /// Console handler over `writer`, without colors.
    pub fn new(writer: SharedWriter) -> Self {
        Self {
            writer,
            encoder: Encoder::new(OutputFormat::Logfmt, console_options()),
            level: LevelVar::default(),
            add_source: false,
            time_format: TimestampFormat::Clock,
            use_colors: false,
        }
    }

    /// Console handler on stderr, colored when stderr is a terminal.
    pub fn stderr() -> Self {
        let colors = io::stderr().is_terminal();
        Self::new(SharedWriter::stderr()).with_colors(colors)
    }

    /// Console handler on stdout, colored when stdout is a terminal.
    pub fn stdout() -> Self {
        let colors = io::stdout().is_terminal();
        Self::new(SharedWriter::stdout()).with_colors(colors)
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = LevelVar::new(level);
        self
    }

    #[must_use]
    pub fn with_level_var(mut self, level: LevelVar) -> Self {
        self.level = level;
        self
    }

    /// Encoding of the attrs segment, logfmt by default.
    #[must_use]
    pub fn with_attr_format(mut self, format: OutputFormat) -> Self {
        self.encoder = self.encoder.with_format(format);
        self
    }

    /// Format of the leading timestamp, [`TimestampFormat::Clock`] by default.
    #[must_use]
    pub fn with_time_format(mut self, format: TimestampFormat) -> Self {
        self.time_format = format;
        self
    }

    pub fn use_colors(&self) -> bool {
        self.use_colors
    }

    pub fn writer(&self) -> &SharedWriter {
        &self.writer
    }

    /// The complete line for `record`, newline included.
    pub fn render(&self, record: &Record) -> String {
        let mut line = String::with_capacity(96 + record.message.len());

        line.push_str(&self.time_format.format(&record.time));
        line.push(' ');

        let label = record.level.label();
        if self.use_colors {
            // Not `Colorize`: a `ColoredString` obeys colored's process-wide
            // env/tty override, and `use_colors` must decide alone.
            line.push_str(&format!(
                "\x1b[{}m{}\x1b[0m",
                level_color(label).to_fg_str(),
                label
            ));
        } else {
            line.push_str(label);
        }
        line.push(' ');

        if self.add_source {
            if let Some(source) = &record.source {
                line.push('[');
                line.push_str(&source.trimmed());
                line.push_str("] ");
            }
        }

        quote_into(&mut line, &record.message);

        let attrs = self.encoder.encode_attrs(record);
        if !attrs.is_empty() {
            line.push_str(ATTRS_SEPARATOR);
            line.push_str(&attrs);
        }
        line.push('\n');
        line
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::stderr()
    }
}

impl Handler for ConsoleHandler {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level.level()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        self.writer.write_record(self.render(record).as_bytes())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Handler> {
        Arc::new(Self {
            encoder: self.encoder.with_attrs(attrs),
            ..self.clone()
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(Self {
            encoder: self.encoder.with_group(name),
            ..self.clone()
        })
    }

    fn name(&self) -> &str {
        "console"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Console output when `writer` is a terminal, JSON lines otherwise.
///
/// Terminal output is colored and carries call-sites; the JSON variant uses
/// [`HandlerOptions::structured`].
pub fn maybe_console_handler<W>(level: Level, writer: W) -> Arc<dyn Handler>
where
    W: Write + IsTerminal + Send + 'static,
{
    if writer.is_terminal() {
        Arc::new(
            ConsoleHandler::new(SharedWriter::new(writer))
                .with_colors(true)
                .with_source(true)
                .with_level(level),
        )
    } else {
        Arc::new(StructuredHandler::json(
            SharedWriter::new(writer),
            HandlerOptions::structured().with_level(level),
        ))
    }
}
