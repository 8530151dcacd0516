//! Log record structure

use super::attr::Attr;
use super::log_level::Level;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::MAIN_SEPARATOR;

/// Call-site of a log statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub file: String,
    pub line: u32,
}

impl Source {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// `file:line` with the file made project-relative.
    pub fn trimmed(&self) -> String {
        format!("{}:{}", trim_root_path(&self.file), self.line)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Strip the machine-specific prefix from a source path.
///
/// Files of registry dependencies (`.../registry/src/<index>/<crate>-<version>/...`)
/// keep the versioned crate directory onward; anything else loses everything up
/// to and including its `src` directory.
pub fn trim_root_path(path: &str) -> &str {
    let registry = format!("{sep}registry{sep}src{sep}", sep = MAIN_SEPARATOR);
    if let Some(idx) = path.find(&registry) {
        let rest = &path[idx + registry.len()..];
        if let Some((_, crate_path)) = rest.split_once(MAIN_SEPARATOR) {
            let crate_dir = crate_path.split(MAIN_SEPARATOR).next().unwrap_or_default();
            if has_version_marker(crate_dir) {
                return crate_path;
            }
        }
    }

    let src = format!("{sep}src{sep}", sep = MAIN_SEPARATOR);
    match path.find(&src) {
        Some(idx) => &path[idx + src.len()..],
        None => path,
    }
}

fn has_version_marker(dir: &str) -> bool {
    dir.rsplit_once('-')
        .and_then(|(_, version)| version.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// A single log event as handed to handlers.
///
/// Handlers only read records; one that needs to rewrite fields clones first.
#[derive(Debug, Clone)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub source: Option<Source>,
    attrs: Vec<Attr>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            source: None,
            attrs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    #[must_use]
    pub fn with_source(mut self, file: impl Into<String>, line: u32) -> Self {
        self.source = Some(Source::new(file, line));
        self
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn add_attr(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn num_attrs(&self) -> usize {
        self.attrs.len()
    }
}
