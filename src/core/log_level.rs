//! Severity levels and shared thresholds
//!
//! Levels are a signed integer scale where a higher value is more severe.
//! The four named levels leave gaps of four so callers can express levels in
//! between (`INFO+2`) or below the lowest named level (`TRACE` is `DEBUG-4`).

use super::error::LoggerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Distance between the named levels, also used to place `TRACE` below `DEBUG`.
const LEVEL_STEP: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(i32);

impl Level {
    pub const TRACE: Level = Level(-2 * LEVEL_STEP);
    pub const DEBUG: Level = Level(-LEVEL_STEP);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(LEVEL_STEP);
    pub const ERROR: Level = Level(2 * LEVEL_STEP);

    #[must_use]
    pub const fn new(value: i32) -> Self {
        Level(value)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Shift the level by `delta`, saturating at the ends of the scale.
    #[must_use]
    pub const fn offset(self, delta: i32) -> Self {
        Level(self.0.saturating_add(delta))
    }

    /// Three-letter console label; out-of-range values clamp to the nearest bucket.
    #[must_use]
    pub fn label(self) -> &'static str {
        if self < Level::INFO {
            "DBG"
        } else if self < Level::WARN {
            "INF"
        } else if self < Level::ERROR {
            "WRN"
        } else {
            "ERR"
        }
    }

    fn base(self) -> (&'static str, Level) {
        if self < Level::INFO {
            ("DEBUG", Level::DEBUG)
        } else if self < Level::WARN {
            ("INFO", Level::INFO)
        } else if self < Level::ERROR {
            ("WARN", Level::WARN)
        } else {
            ("ERROR", Level::ERROR)
        }
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Level(value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = self.base();
        let delta = i64::from(self.0) - i64::from(base.0);
        if delta == 0 {
            f.write_str(name)
        } else {
            write!(f, "{}{:+}", name, delta)
        }
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i32>() {
            return Ok(Level(value));
        }

        let sign = trimmed
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '+' || *c == '-')
            .map(|(idx, _)| idx);

        let (name, delta) = match sign {
            Some(idx) => {
                let (name, offset) = trimmed.split_at(idx);
                let delta = offset
                    .parse::<i32>()
                    .map_err(|_| LoggerError::invalid_level(s))?;
                (name, delta)
            }
            None => (trimmed, 0),
        };

        let base = match name.to_uppercase().as_str() {
            "TRACE" => Level::TRACE,
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" | "WARNING" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => return Err(LoggerError::invalid_level(s)),
        };
        Ok(base.offset(delta))
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i32),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(Level(value)),
            Repr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A level that can be changed at runtime.
///
/// Clones share the same underlying value, so every handler holding a clone
/// observes [`LevelVar::set`] immediately.
#[derive(Clone)]
pub struct LevelVar {
    value: Arc<AtomicI32>,
}

impl LevelVar {
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            value: Arc::new(AtomicI32::new(level.as_i32())),
        }
    }

    #[inline]
    pub fn level(&self) -> Level {
        Level(self.value.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, level: Level) {
        self.value.store(level.as_i32(), Ordering::Release);
    }

    /// Whether both handles refer to the same threshold.
    pub fn same_as(&self, other: &LevelVar) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl Default for LevelVar {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl From<Level> for LevelVar {
    fn from(level: Level) -> Self {
        Self::new(level)
    }
}

impl fmt::Debug for LevelVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LevelVar({})", self.level())
    }
}
