//! Handler configuration
//!
//! [`HandlerOptions`] is shared by the structured and console handlers. It
//! carries the threshold, whether call-sites are rendered, the timestamp
//! format, and an optional attribute rewriting hook.

use super::attr::Attr;
use super::log_level::{Level, LevelVar};
use super::timestamp::TimestampFormat;
use std::fmt;
use std::sync::Arc;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const SOURCE_KEY: &str = "source";
pub const MESSAGE_KEY: &str = "msg";

/// Keys a handler renders itself; user attributes never take their place.
pub const RESERVED_KEYS: [&str; 4] = [TIME_KEY, LEVEL_KEY, SOURCE_KEY, MESSAGE_KEY];

/// Attribute rewriting hook.
///
/// Called with the open group path for every non-group attribute before it is
/// encoded; returning `None` drops the attribute.
pub type ReplaceAttr = Arc<dyn Fn(&[String], Attr) -> Option<Attr> + Send + Sync>;

#[derive(Clone)]
pub struct HandlerOptions {
    /// Minimum level handled
    pub level: LevelVar,
    /// Whether to render the call-site of each record
    pub add_source: bool,
    /// Format of the record timestamp
    pub time_format: TimestampFormat,
    pub replace_attr: Option<ReplaceAttr>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            level: LevelVar::default(),
            add_source: false,
            time_format: TimestampFormat::default(),
            replace_attr: None,
        }
    }
}

impl HandlerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for machine-readable output: call-sites on, empty values dropped.
    #[must_use]
    pub fn structured() -> Self {
        Self::new()
            .with_source(true)
            .with_replace_attr(Arc::new(|_groups: &[String], mut attr: Attr| {
                if RESERVED_KEYS.contains(&attr.key.as_str()) {
                    return Some(attr);
                }
                if attr.value.normalize() {
                    None
                } else {
                    Some(attr)
                }
            }))
    }

    /// Set a fixed minimum level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = LevelVar::new(level);
        self
    }

    /// Share an existing runtime-adjustable level
    #[must_use]
    pub fn with_level_var(mut self, level: LevelVar) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }

    #[must_use]
    pub fn with_time_format(mut self, format: TimestampFormat) -> Self {
        self.time_format = format;
        self
    }

    #[must_use]
    pub fn with_replace_attr(mut self, replace: ReplaceAttr) -> Self {
        self.replace_attr = Some(replace);
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("level", &self.level)
            .field("add_source", &self.add_source)
            .field("time_format", &self.time_format)
            .field("replace_attr", &self.replace_attr.is_some())
            .finish()
    }
}
