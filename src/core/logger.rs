//! Logger façade
//!
//! [`Logger`] turns calls in three conventions (structured attributes, leveled
//! severity with verbosity gates, and key/value pairs) into [`Record`]s and hands
//! them to a handler graph. The root handler lives in a shared slot, so
//! `set_handler`, `set_output` and `set_level` are seen by every clone.

use super::{
    attr::{Attr, Value},
    error::Result,
    handler::Handler,
    log_level::Level,
    record::{Record, Source},
};
use crate::handlers::{
    maybe_console_handler, BatchConfig, BatchHandler, LevelHandler, LevelTransformHandler,
    MultiHandler,
};
use parking_lot::RwLock;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

/// Threshold of leaf handlers created by the logger; the root gate decides.
const PASS_ALL: Level = Level::new(i32::MIN);

/// Key of the message in key/value style calls
const KV_MESSAGE_KEY: &str = "msg";

/// Key of the error attribute added by [`Logger::error`]
pub const ERROR_KEY: &str = "error";

#[derive(Clone)]
pub struct Logger {
    handler: Arc<RwLock<Arc<dyn Handler>>>,
}

impl Logger {
    /// Logger writing to `writer` at INFO: console lines on a terminal, JSON otherwise.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + IsTerminal + Send + 'static,
    {
        Self::from_handler(Arc::new(LevelHandler::new(
            Level::INFO,
            Some(maybe_console_handler(PASS_ALL, writer)),
        )))
    }

    pub fn from_handler(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler: Arc::new(RwLock::new(handler)),
        }
    }

    /// Logger that drops everything; the fallback when nothing is configured.
    pub fn discard() -> Self {
        Self::from_handler(Arc::new(LevelHandler::new(Level::ERROR, None)))
    }

    /// Current root handler.
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler.read())
    }

    pub fn set_handler(&self, handler: Arc<dyn Handler>) {
        *self.handler.write() = handler;
    }

    /// Replace the destination, keeping the current threshold.
    pub fn set_output<W>(&self, writer: W)
    where
        W: Write + IsTerminal + Send + 'static,
    {
        let mut root = self.handler.write();
        let level = root_level(&**root);
        *root = Arc::new(LevelHandler::new(
            level,
            Some(maybe_console_handler(PASS_ALL, writer)),
        ));
    }

    /// Threshold of the root gate; INFO when the root is not a gate.
    pub fn level(&self) -> Level {
        root_level(&*self.handler())
    }

    /// Update the root gate in place, or put a gate in front of the root.
    pub fn set_level(&self, level: Level) {
        let mut root = self.handler.write();
        if let Some(gate) = root.as_any().downcast_ref::<LevelHandler>() {
            gate.set_level(level);
            return;
        }
        let current = Arc::clone(&root);
        *root = Arc::new(LevelHandler::new(level, Some(current)));
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handler().enabled(level)
    }

    /// Logger whose gate sits `n` levels below the current threshold.
    ///
    /// Records keep their own level; only the threshold moves, so `v(1).info`
    /// is still an INFO record. The new gate is a snapshot: later
    /// [`set_level`](Self::set_level) calls on this logger do not reach it.
    #[must_use]
    pub fn v(&self, n: i32) -> Logger {
        if n == 0 {
            return self.clone();
        }
        let root = self.handler();
        let level = root_level(&*root).offset(n.saturating_neg());
        Logger::from_handler(Arc::new(LevelHandler::new(level, Some(root))))
    }

    /// Logger whose records have their level rewritten by `transform`
    /// before reaching the handlers.
    #[must_use]
    pub fn transform_level<F>(&self, transform: F) -> Logger
    where
        F: Fn(Level) -> Level + Send + Sync + 'static,
    {
        self.derived(Arc::new(LevelTransformHandler::new(self.handler(), transform)))
    }

    /// Logger whose records carry `attrs`.
    #[must_use]
    pub fn with_attrs(&self, attrs: impl IntoIterator<Item = Attr>) -> Logger {
        let attrs: Vec<Attr> = attrs.into_iter().collect();
        if attrs.is_empty() {
            return self.clone();
        }
        self.derived(self.handler().with_attrs(&attrs))
    }

    /// Key/value flavour of [`with_attrs`](Self::with_attrs).
    #[must_use]
    pub fn with_values<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Logger
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.with_attrs(pairs.into_iter().map(|(k, v)| Attr::new(k, v)))
    }

    /// Logger whose subsequent attributes are nested under `name`.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Logger {
        if name.is_empty() {
            return self.clone();
        }
        self.derived(self.handler().with_group(name))
    }

    /// Named sub-logger; the name becomes a group.
    #[must_use]
    pub fn with_name(&self, name: &str) -> Logger {
        self.with_group(name)
    }

    fn derived(&self, handler: Arc<dyn Handler>) -> Logger {
        Logger::from_handler(handler)
    }

    /// Log and report the handler's error, if any.
    pub fn try_log(
        &self,
        level: Level,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<()> {
        self.dispatch(None, level, message, attrs)
    }

    /// Log with an explicit call-site and report the handler's error, if any.
    pub fn try_log_at(
        &self,
        source: Source,
        level: Level,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<()> {
        self.dispatch(Some(source), level, message, attrs)
    }

    fn dispatch(
        &self,
        source: Option<Source>,
        level: Level,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<()> {
        let handler = self.handler();
        if !handler.enabled(level) {
            return Ok(());
        }
        let mut record = Record::new(level, message).with_attrs(attrs);
        record.source = source;
        handler.handle(&record)
    }

    /// Log at `level`; handler errors are ignored.
    pub fn log(&self, level: Level, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        let _ = self.try_log(level, message, attrs);
    }

    /// Log with an explicit call-site; used by the logging macros.
    pub fn log_at(
        &self,
        source: Source,
        level: Level,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        let _ = self.try_log_at(source, level, message, attrs);
    }

    pub fn trace(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::TRACE, message, attrs);
    }

    pub fn debug(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::DEBUG, message, attrs);
    }

    pub fn info(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::INFO, message, attrs);
    }

    pub fn warn(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::WARN, message, attrs);
    }

    /// Log at ERROR with the error's message under the `error` key.
    pub fn error(
        &self,
        err: &dyn std::error::Error,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        let attrs = attrs
            .into_iter()
            .chain(std::iter::once(Attr::string(ERROR_KEY, err.to_string())));
        self.log(Level::ERROR, message, attrs);
    }

    /// Key/value style at INFO: a `msg` pair becomes the message, the rest attributes.
    pub fn log_kv<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        if !self.enabled(Level::INFO) {
            return Ok(());
        }

        let mut message = None;
        let mut attrs = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            if message.is_none() && key == KV_MESSAGE_KEY {
                message = Some(value.to_string());
            } else {
                attrs.push(Attr::new(key, value));
            }
        }
        self.try_log(Level::INFO, message.unwrap_or_default(), attrs)
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_log_facade::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .min_level(Level::DEBUG)
    ///     .handler(ConsoleHandler::stderr())
    ///     .build();
    /// assert!(logger.enabled(Level::DEBUG));
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::discard()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("handler", &self.handler().name())
            .field("level", &self.level())
            .finish()
    }
}

fn root_level(root: &dyn Handler) -> Level {
    root.as_any()
        .downcast_ref::<LevelHandler>()
        .map_or(Level::INFO, LevelHandler::level)
}

/// Builder for Logger
///
/// Handlers are combined in a fan-out when there is more than one, optionally
/// batched, and always placed behind a single level gate.
///
/// # Example
/// ```
/// use rust_log_facade::prelude::*;
/// use std::time::Duration;
///
/// let logger = Logger::builder()
///     .min_level(Level::WARN)
///     .handler(ConsoleHandler::stderr())
///     .handler(StructuredHandler::json(SharedWriter::new(std::io::sink()), HandlerOptions::new()))
///     .batch(BatchConfig::new(64, Duration::from_millis(200)))
///     .build();
/// assert!(!logger.enabled(Level::INFO));
/// ```
pub struct LoggerBuilder {
    min_level: Level,
    handlers: Vec<Arc<dyn Handler>>,
    batch: Option<BatchConfig>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: Level::INFO,
            handlers: Vec::new(),
            batch: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Add a handler
    #[must_use = "builder methods return a new value"]
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Add an already shared handler
    #[must_use = "builder methods return a new value"]
    pub fn shared_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Add a writer: console lines on a terminal, JSON lines otherwise
    #[must_use = "builder methods return a new value"]
    pub fn output<W>(mut self, writer: W) -> Self
    where
        W: Write + IsTerminal + Send + 'static,
    {
        self.handlers.push(maybe_console_handler(PASS_ALL, writer));
        self
    }

    /// Batch records in front of all handlers
    #[must_use = "builder methods return a new value"]
    pub fn batch(mut self, config: BatchConfig) -> Self {
        self.batch = Some(config);
        self
    }

    /// Build the Logger, rejecting a batch configuration that never flushes
    /// on its own.
    pub fn try_build(self) -> Result<Logger> {
        if let Some(config) = &self.batch {
            config.validate()?;
        }
        Ok(self.build())
    }

    /// Build the Logger without validating the batch configuration
    pub fn build(mut self) -> Logger {
        let inner: Option<Arc<dyn Handler>> = match self.handlers.len() {
            0 => None,
            1 => self.handlers.pop(),
            _ => Some(Arc::new(MultiHandler::new(self.handlers))),
        };
        let inner = match (inner, self.batch) {
            (Some(handler), Some(config)) => {
                Some(Arc::new(BatchHandler::new(handler, config)) as Arc<dyn Handler>)
            }
            (inner, _) => inner,
        };
        Logger::from_handler(Arc::new(LevelHandler::new(self.min_level, inner)))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HandlerOptions, LoggerError, MemoryBuffer, SharedWriter};
    use crate::handlers::StructuredHandler;

    fn json_logger() -> (Logger, MemoryBuffer) {
        let buffer = MemoryBuffer::new();
        let sink = StructuredHandler::json(
            SharedWriter::new(buffer.clone()),
            HandlerOptions::new().with_level(PASS_ALL),
        );
        let logger = Logger::builder().handler(sink).build();
        (logger, buffer)
    }

    fn parsed(buffer: &MemoryBuffer) -> Vec<serde_json::Value> {
        buffer
            .lines()
            .iter()
            .map(|l| serde_json::from_str(l).expect("valid JSON line"))
            .collect()
    }

    #[test]
    fn test_builder_default() {
        let logger = LoggerBuilder::default().build();
        assert_eq!(logger.level(), Level::INFO);
        assert!(logger.try_log(Level::ERROR, "unconfigured", []).is_ok());
    }

    #[test]
    fn test_levels_are_gated() {
        let (logger, buffer) = json_logger();
        logger.debug("hidden", []);
        logger.info("shown", [Attr::int("n", 1)]);
        logger.warn("also shown", []);

        let lines = parsed(&buffer);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["msg"], "shown");
        assert_eq!(lines[0]["n"], 1);
        assert_eq!(lines[1]["level"], "WARN");
    }

    #[test]
    fn test_set_level_updates_existing_gate() {
        let (logger, buffer) = json_logger();
        let clone = logger.clone();
        logger.set_level(Level::DEBUG);

        clone.debug("now visible", []);
        assert_eq!(parsed(&buffer).len(), 1);
        assert!(clone.handler().as_any().downcast_ref::<LevelHandler>().is_some());
    }

    #[test]
    fn test_set_level_wraps_plain_handler() {
        let buffer = MemoryBuffer::new();
        let logger = Logger::from_handler(Arc::new(StructuredHandler::json(
            SharedWriter::new(buffer.clone()),
            HandlerOptions::new().with_level(PASS_ALL),
        )));
        assert_eq!(logger.level(), Level::INFO);

        logger.set_level(Level::ERROR);
        assert_eq!(logger.level(), Level::ERROR);
        logger.warn("dropped", []);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_verbosity_keeps_info_level() {
        let (logger, buffer) = json_logger();

        logger.v(1).info("still info", []);

        let lines = parsed(&buffer);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[0]["msg"], "still info");
    }

    #[test]
    fn test_verbosity_lowers_threshold() {
        let (logger, buffer) = json_logger();
        logger.set_level(Level::DEBUG);

        let chatty = logger.v(2);
        assert_eq!(chatty.level(), Level::DEBUG.offset(-2));
        chatty.debug("detail", []);
        chatty.log(Level::DEBUG.offset(-2), "edge", []);
        chatty.trace("too chatty", []);

        // The parent gate is untouched.
        logger.log(Level::DEBUG.offset(-2), "parent drops this", []);
        assert_eq!(logger.level(), Level::DEBUG);

        let lines = parsed(&buffer);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "DEBUG");
        assert_eq!(lines[1]["level"], "DEBUG-2");
    }

    #[test]
    fn test_zero_verbosity_shares_slot() {
        let (logger, _buffer) = json_logger();
        let same = logger.v(0);
        same.set_level(Level::ERROR);
        assert_eq!(logger.level(), Level::ERROR);
    }

    #[test]
    fn test_transform_level() {
        let (logger, buffer) = json_logger();
        let quieter = logger.transform_level(|level| level.offset(-4));

        quieter.warn("demoted", []);
        logger.warn("unchanged", []);

        let lines = parsed(&buffer);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[1]["level"], "WARN");
    }

    #[test]
    fn test_try_build_validates_batch() {
        let buffer = MemoryBuffer::new();
        let result = Logger::builder()
            .handler(StructuredHandler::json(
                SharedWriter::new(buffer.clone()),
                HandlerOptions::new(),
            ))
            .batch(BatchConfig::new(0, std::time::Duration::ZERO))
            .try_build();
        assert!(matches!(
            result,
            Err(LoggerError::InvalidConfiguration { .. })
        ));

        let logger = Logger::builder()
            .handler(StructuredHandler::json(
                SharedWriter::new(buffer.clone()),
                HandlerOptions::new(),
            ))
            .batch(BatchConfig::by_size(2))
            .try_build()
            .expect("valid batch config");
        logger.info("one", []);
        logger.info("two", []);
        assert_eq!(buffer.lines().len(), 2);

        assert!(Logger::builder().try_build().is_ok());
    }

    #[test]
    fn test_error_adds_attribute() {
        let (logger, buffer) = json_logger();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        logger.error(&err, "open failed", [Attr::string("path", "/etc/app.toml")]);

        let lines = parsed(&buffer);
        assert_eq!(lines[0]["level"], "ERROR");
        assert_eq!(lines[0]["error"], "no such file");
        assert_eq!(lines[0]["path"], "/etc/app.toml");
    }

    #[test]
    fn test_log_kv_extracts_message() {
        let (logger, buffer) = json_logger();
        logger
            .log_kv([
                ("user", Value::from("ann")),
                ("msg", Value::from("login")),
                ("attempt", Value::from(2)),
            ])
            .unwrap();

        let lines = parsed(&buffer);
        assert_eq!(lines[0]["msg"], "login");
        assert_eq!(lines[0]["user"], "ann");
        assert_eq!(lines[0]["attempt"], 2);
    }

    #[test]
    fn test_derived_loggers() {
        let (logger, buffer) = json_logger();
        let child = logger
            .with_values([("svc", "api")])
            .with_name("http")
            .with_attrs([Attr::int("port", 8080)]);

        child.info("listening", []);
        logger.info("root", []);

        let lines = parsed(&buffer);
        assert_eq!(lines[0]["svc"], "api");
        assert_eq!(lines[0]["http"]["port"], 8080);
        assert!(lines[1].get("svc").is_none());
    }

    #[test]
    fn test_try_log_reports_write_failure() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let logger = Logger::builder()
            .handler(StructuredHandler::json(SharedWriter::new(Closed), HandlerOptions::new()))
            .build();
        let err = logger.try_log(Level::INFO, "lost", []).unwrap_err();
        assert!(matches!(err, LoggerError::IoOperation { .. }));

        // The plain call swallows it.
        logger.info("lost again", []);
    }

    #[test]
    fn test_discard() {
        let logger = Logger::discard();
        assert!(!logger.enabled(Level::WARN));
        assert!(logger.try_log(Level::ERROR, "ignored", []).is_ok());
    }

    #[test]
    fn test_set_output_keeps_level() {
        let (logger, _buffer) = json_logger();
        logger.set_level(Level::WARN);

        let file = tempfile::NamedTempFile::new().expect("temp file");
        logger.set_output(file.reopen().expect("reopen"));
        assert_eq!(logger.level(), Level::WARN);

        logger.warn("to file", []);
        let written = std::fs::read_to_string(file.path()).expect("read back");
        let line: serde_json::Value = serde_json::from_str(written.trim()).expect("json line");
        assert_eq!(line["msg"], "to file");
    }

    #[test]
    fn test_log_at_records_source() {
        let (logger, buffer) = json_logger();
        logger.log_at(Source::new("src/lib.rs", 3), Level::INFO, "here", []);
        assert!(buffer.contents().contains("here"));
    }
}
