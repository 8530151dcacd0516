//! Core logging types and traits

pub mod attr;
pub mod error;
pub mod handler;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod normalize;
pub mod options;
pub mod output_format;
pub mod record;
pub mod timestamp;
pub mod writer;

pub use attr::{AnyValue, Attr, DynamicValue, MarshalJson, Value};
pub use error::{LoggerError, Result};
pub use handler::Handler;
pub use log_level::{Level, LevelVar};
pub use logger::{Logger, LoggerBuilder, ERROR_KEY};
pub use metrics::BatchMetrics;
pub use normalize::normalize_any;
pub use options::{
    HandlerOptions, ReplaceAttr, LEVEL_KEY, MESSAGE_KEY, RESERVED_KEYS, SOURCE_KEY, TIME_KEY,
};
pub use output_format::{quote, quote_into, AttrScope, Encoder, OutputFormat};
pub use record::{trim_root_path, Record, Source};
pub use timestamp::{TimestampFormat, CLOCK_PATTERN, CLOCK_WIDTH};
pub use writer::{MemoryBuffer, SharedWriter};
