//! Level-gated handler

use crate::core::{Attr, Handler, Level, LevelVar, Record, Result};
use std::any::Any;
use std::sync::Arc;

/// Wraps a handler with a runtime-adjustable minimum level.
///
/// Gates never chain: building a gate over another gate keeps only the inner
/// gate's destination, so there is exactly one threshold per segment.
#[derive(Clone)]
pub struct LevelHandler {
    level: LevelVar,
    inner: Option<Arc<dyn Handler>>,
}

impl LevelHandler {
    pub fn new(level: Level, inner: Option<Arc<dyn Handler>>) -> Self {
        Self::with_level_var(LevelVar::new(level), inner)
    }

    /// Gate sharing an existing threshold.
    pub fn with_level_var(level: LevelVar, inner: Option<Arc<dyn Handler>>) -> Self {
        let inner = inner.and_then(|h| match h.as_any().downcast_ref::<LevelHandler>() {
            Some(gate) => gate.inner.clone(),
            None => Some(h),
        });
        Self { level, inner }
    }

    pub fn level(&self) -> Level {
        self.level.level()
    }

    /// Visible to every holder of this gate and of gates derived from it.
    pub fn set_level(&self, level: Level) {
        self.level.set(level);
    }

    pub fn level_var(&self) -> &LevelVar {
        &self.level
    }

    /// The gated destination, `None` when not configured yet.
    pub fn handler(&self) -> Option<&Arc<dyn Handler>> {
        self.inner.as_ref()
    }
}

impl Handler for LevelHandler {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level.level()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        match &self.inner {
            Some(inner) => inner.handle(record),
            None => Ok(()),
        }
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Handler> {
        Arc::new(Self {
            level: self.level.clone(),
            inner: self.inner.as_ref().map(|h| h.with_attrs(attrs)),
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(Self {
            level: self.level.clone(),
            inner: self.inner.as_ref().map(|h| h.with_group(name)),
        })
    }

    fn name(&self) -> &str {
        "level"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
