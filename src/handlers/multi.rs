//! Fan-out handler
//!
//! Delivers every record to all member handlers. The member list is a
//! copy-on-write snapshot: `add` and `replace` swap in a new list, so a
//! `handle` in progress keeps iterating the list it started with.

use crate::core::{Attr, Handler, Level, LoggerError, Record, Result};
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

pub struct MultiHandler {
    members: RwLock<Arc<Vec<Arc<dyn Handler>>>>,
}

impl MultiHandler {
    pub fn new(members: Vec<Arc<dyn Handler>>) -> Self {
        Self {
            members: RwLock::new(Arc::new(members)),
        }
    }

    pub fn add(&self, handler: Arc<dyn Handler>) {
        let mut members = self.members.write();
        let mut next = Vec::with_capacity(members.len() + 1);
        next.extend(members.iter().cloned());
        next.push(handler);
        *members = Arc::new(next);
    }

    pub fn replace(&self, handlers: Vec<Arc<dyn Handler>>) {
        *self.members.write() = Arc::new(handlers);
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<Vec<Arc<dyn Handler>>> {
        Arc::clone(&self.members.read())
    }
}

impl Default for MultiHandler {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Handler for MultiHandler {
    fn enabled(&self, level: Level) -> bool {
        self.snapshot().iter().any(|h| h.enabled(level))
    }

    /// Calls every member once, even after a failure, and returns the first error.
    ///
    /// A panicking member is isolated and reported as [`LoggerError::HandlerPanicked`].
    fn handle(&self, record: &Record) -> Result<()> {
        let mut first_error = None;

        for (idx, member) in self.snapshot().iter().enumerate() {
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| member.handle(record)));

            let err = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => {
                    let e = LoggerError::handler_panicked(idx, &*panic_info);
                    eprintln!("[LOGGER ERROR] Handler #{} ({}) panicked: {}", idx, member.name(), e);
                    e
                }
            };
            if first_error.is_none() {
                first_error = Some(err);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Handler> {
        let members = self.snapshot().iter().map(|h| h.with_attrs(attrs)).collect();
        Arc::new(Self::new(members))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let members = self.snapshot().iter().map(|h| h.with_group(name)).collect();
        Arc::new(Self::new(members))
    }

    fn name(&self) -> &str {
        "multi"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
