//! # Rust Log Facade
//!
//! A structured-logging façade: one [`Handler`] abstraction behind key/value,
//! leveled and structured-attribute call styles, rendering records as JSON,
//! logfmt or colorized console lines.
//!
//! ## Features
//!
//! - **Composable handlers**: level gate, fan-out, batching, console, structured
//! - **Value normalization**: arbitrary values become printable, empty ones are omitted
//! - **Thread safe**: one mutex per destination, shared by derived handlers
//! - **Runtime reconfiguration**: thresholds and fan-out members change in place
//!
//! ```
//! use rust_log_facade::prelude::*;
//!
//! let buffer = MemoryBuffer::new();
//! let logger = Logger::builder()
//!     .handler(ConsoleHandler::new(SharedWriter::new(buffer.clone())))
//!     .build();
//!
//! logger.with_group("req").info("served", [Attr::int("status", 200)]);
//! assert!(buffer.contents().ends_with("INF \"served\" attrs=req.status=200\n"));
//! ```

pub mod core;
pub mod handlers;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        Attr, Handler, HandlerOptions, Level, LevelVar, Logger, LoggerBuilder, LoggerError,
        MemoryBuffer, OutputFormat, Record, Result, SharedWriter, Source, TimestampFormat, Value,
    };
    pub use crate::handlers::{
        maybe_console_handler, BatchConfig, BatchHandler, ConsoleHandler, LevelHandler,
        LevelTransformHandler, MultiHandler, StructuredHandler,
    };
}

pub use crate::core::{
    Attr, Handler, HandlerOptions, Level, LevelVar, Logger, LoggerBuilder, LoggerError, Record,
    Result, Value,
};
pub use crate::handlers::{
    BatchConfig, BatchHandler, ConsoleHandler, LevelHandler, LevelTransformHandler, MultiHandler,
    StructuredHandler,
};
