//! Structured (JSON / logfmt) handler

use crate::core::{
    Attr, Encoder, Handler, HandlerOptions, Level, OutputFormat, Record, Result, SharedWriter,
};
use std::any::Any;
use std::sync::Arc;

/// Writes one machine-readable line per record.
///
/// Records below the configured threshold are ignored inside `handle`, so the
/// handler is safe to place behind a fan-out that does not pre-check levels.
#[derive(Debug, Clone)]
pub struct StructuredHandler {
    writer: SharedWriter,
    encoder: Encoder,
}

impl StructuredHandler {
    pub fn new(writer: SharedWriter, format: OutputFormat, options: HandlerOptions) -> Self {
        Self {
            writer,
            encoder: Encoder::new(format, options),
        }
    }

    pub fn json(writer: SharedWriter, options: HandlerOptions) -> Self {
        Self::new(writer, OutputFormat::Json, options)
    }

    pub fn logfmt(writer: SharedWriter, options: HandlerOptions) -> Self {
        Self::new(writer, OutputFormat::Logfmt, options)
    }

    pub fn format(&self) -> OutputFormat {
        self.encoder.format()
    }

    pub fn writer(&self) -> &SharedWriter {
        &self.writer
    }
}

impl Handler for StructuredHandler {
    fn enabled(&self, level: Level) -> bool {
        level >= self.encoder.options().level.level()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        let line = self.encoder.encode_record(record);
        self.writer.write_record(line.as_bytes())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Handler> {
        Arc::new(Self {
            writer: self.writer.clone(),
            encoder: self.encoder.with_attrs(attrs),
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(Self {
            writer: self.writer.clone(),
            encoder: self.encoder.with_group(name),
        })
    }

    fn name(&self) -> &str {
        match self.encoder.format() {
            OutputFormat::Json => "json",
            OutputFormat::Logfmt => "logfmt",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryBuffer;

    #[test]
    fn test_json_line_per_record() {
        let buffer = MemoryBuffer::new();
        let handler = StructuredHandler::json(SharedWriter::new(buffer.clone()), HandlerOptions::new());

        handler
            .handle(&Record::new(Level::INFO, "first").with_attrs([Attr::int("n", 1)]))
            .unwrap();
        handler.handle(&Record::new(Level::WARN, "second")).unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["msg"], "first");
        assert_eq!(first["level"], "INFO");
        assert_eq!(first["n"], 1);
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let buffer = MemoryBuffer::new();
        let handler = StructuredHandler::logfmt(
            SharedWriter::new(buffer.clone()),
            HandlerOptions::new().with_level(Level::WARN),
        );
        assert!(!handler.enabled(Level::INFO));
        handler.handle(&Record::new(Level::INFO, "quiet")).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_derived_handlers_share_destination() {
        let buffer = MemoryBuffer::new();
        let handler = StructuredHandler::json(SharedWriter::new(buffer.clone()), HandlerOptions::new());
        let derived = handler.with_group("req").with_attrs(&[Attr::string("id", "r-7")]);

        let derived = derived
            .as_any()
            .downcast_ref::<StructuredHandler>()
            .expect("structured handler");
        assert!(derived.writer().same_destination(handler.writer()));

        derived.handle(&Record::new(Level::INFO, "child")).unwrap();
        handler.handle(&Record::new(Level::INFO, "parent")).unwrap();

        let lines = buffer.lines();
        assert!(lines[0].contains(r#""req":{"id":"r-7"}"#));
        assert!(!lines[1].contains("req"));
    }

    #[cfg(unix)]
    #[test]
    fn test_structured_preset_drops_empty_values() {
        let buffer = MemoryBuffer::new();
        let handler =
            StructuredHandler::json(SharedWriter::new(buffer.clone()), HandlerOptions::structured());

        handler
            .handle(
                &Record::new(Level::INFO, "m")
                    .with_source("/home/dev/app/src/main.rs", 42)
                    .with_attrs([Attr::string("blank", ""), Attr::int("a", 0)]),
            )
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(parsed["source"], "main.rs:42");
        assert!(parsed.get("blank").is_none());
        assert_eq!(parsed["a"], 0);
    }
}
