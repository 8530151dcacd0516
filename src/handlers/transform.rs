//! Level-rewriting handler

use crate::core::{Attr, Handler, Level, Record, Result};
use std::any::Any;
use std::sync::Arc;

type LevelFn = dyn Fn(Level) -> Level + Send + Sync;

/// Rewrites each record's level before passing it on.
///
/// [`enabled`](Handler::enabled) asks the inner handler about the level the
/// caller used, not the rewritten one. Derived handlers keep the rewrite.
#[derive(Clone)]
pub struct LevelTransformHandler {
    inner: Arc<dyn Handler>,
    transform: Arc<LevelFn>,
}

impl LevelTransformHandler {
    pub fn new<F>(inner: Arc<dyn Handler>, transform: F) -> Self
    where
        F: Fn(Level) -> Level + Send + Sync + 'static,
    {
        Self {
            inner,
            transform: Arc::new(transform),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Handler> {
        &self.inner
    }

    fn wrap(&self, inner: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(Self {
            inner,
            transform: Arc::clone(&self.transform),
        })
    }
}

impl Handler for LevelTransformHandler {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let mut record = record.clone();
        record.level = (self.transform)(record.level);
        self.inner.handle(&record)
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Handler> {
        self.wrap(self.inner.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        self.wrap(self.inner.with_group(name))
    }

    fn name(&self) -> &str {
        "level-transform"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
