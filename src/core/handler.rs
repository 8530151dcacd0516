//! Handler trait for record destinations

use super::{attr::Attr, error::Result, log_level::Level, record::Record};
use std::any::Any;
use std::sync::Arc;

/// A destination-aware component accepting log records.
///
/// Handlers are value-like: `with_attrs` and `with_group` return a new handler
/// over the same destination and leave `self` untouched, so a handler already
/// shared between threads can be derived from at any time.
pub trait Handler: Send + Sync {
    /// Whether a record at `level` would be handled.
    fn enabled(&self, level: Level) -> bool;

    /// Process one record. Must be safe to call even when `enabled` is false.
    fn handle(&self, record: &Record) -> Result<()>;

    /// Handler whose records carry `attrs` in addition to their own.
    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Handler>;

    /// Handler whose subsequent attributes are nested under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;

    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}
