//! Structured encoding of records
//!
//! Provides the two machine-readable output formats:
//! - Json: one object per line, groups as nested objects
//! - Logfmt: `key=value` pairs, groups as dot-joined key prefixes
//!
//! Attributes added through `with_attrs`/`with_group` are kept in an
//! [`AttrScope`] and merged with the record's own attributes at encoding time,
//! which is also where group paths turn into key namespaces.

use super::attr::{Attr, Value};
use super::options::{HandlerOptions, LEVEL_KEY, MESSAGE_KEY, SOURCE_KEY, TIME_KEY};
use super::record::Record;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Output format for structured handlers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// `{"time":"...","level":"INFO","msg":"Request processed","status":200}`
    #[default]
    Json,

    /// `time=... level=INFO msg="Request processed" status=200`
    Logfmt,
}

#[derive(Debug, Clone)]
struct Frame {
    name: String,
    attrs: Vec<Attr>,
}

/// Attributes and groups accumulated by handler derivation.
#[derive(Debug, Clone)]
pub struct AttrScope {
    frames: Vec<Frame>,
}

impl Default for AttrScope {
    fn default() -> Self {
        Self {
            frames: vec![Frame {
                name: String::new(),
                attrs: Vec::new(),
            }],
        }
    }
}

impl AttrScope {
    #[must_use]
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        let mut scope = self.clone();
        if let Some(frame) = scope.frames.last_mut() {
            frame.attrs.extend_from_slice(attrs);
        }
        scope
    }

    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        let mut scope = self.clone();
        if !name.is_empty() {
            scope.frames.push(Frame {
                name: name.to_string(),
                attrs: Vec::new(),
            });
        }
        scope
    }

    /// Names of the currently open groups, outermost first.
    pub fn groups(&self) -> Vec<String> {
        self.frames.iter().skip(1).map(|f| f.name.clone()).collect()
    }

    /// Nest `record_attrs` inside the open groups, after the scoped attributes.
    pub fn assemble(&self, record_attrs: &[Attr]) -> Vec<Attr> {
        let mut frames = self.frames.iter().rev();
        let Some(innermost) = frames.next() else {
            return record_attrs.to_vec();
        };

        let mut attrs = innermost.attrs.clone();
        attrs.extend_from_slice(record_attrs);
        let mut name = innermost.name.clone();

        for frame in frames {
            let mut outer = frame.attrs.clone();
            outer.push(Attr::group(name, attrs));
            attrs = outer;
            name = frame.name.clone();
        }
        attrs
    }
}

/// Attribute after rewriting, normalization, and pruning.
#[derive(Debug)]
enum Field {
    Scalar(String, Value),
    Group(String, Vec<Field>),
}

/// Encoder shared by the structured and console handlers.
#[derive(Debug, Clone)]
pub struct Encoder {
    format: OutputFormat,
    options: HandlerOptions,
    scope: AttrScope,
}

impl Encoder {
    pub fn new(format: OutputFormat, options: HandlerOptions) -> Self {
        Self {
            format,
            options,
            scope: AttrScope::default(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Same scope and options, different output format.
    #[must_use]
    pub fn with_format(&self, format: OutputFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        Self {
            scope: self.scope.with_attrs(attrs),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        Self {
            scope: self.scope.with_group(name),
            ..self.clone()
        }
    }

    /// Full record including time, level, source and message, newline-terminated.
    pub fn encode_record(&self, record: &Record) -> String {
        let mut fields = Vec::with_capacity(4 + record.num_attrs());

        let builtins = [
            Some(Attr::time(TIME_KEY, record.time)),
            Some(Attr::string(LEVEL_KEY, record.level.to_string())),
            record
                .source
                .as_ref()
                .filter(|_| self.options.add_source)
                .map(|s| Attr::string(SOURCE_KEY, s.trimmed())),
            Some(Attr::string(MESSAGE_KEY, record.message.clone())),
        ];
        let mut groups = Vec::new();
        for attr in builtins.into_iter().flatten() {
            self.resolve_into(&mut fields, attr, &mut groups);
        }
        fields.extend(self.resolve(self.scope.assemble(record.attrs())));

        let mut out = self.render(&fields);
        out.push('\n');
        out
    }

    /// Only the attributes of a record, without a trailing newline.
    ///
    /// Returns an empty string when every attribute was dropped.
    pub fn encode_attrs(&self, record: &Record) -> String {
        let fields = self.resolve(self.scope.assemble(record.attrs()));
        if fields.is_empty() {
            return String::new();
        }
        self.render(&fields)
    }

    fn render(&self, fields: &[Field]) -> String {
        let mut out = String::with_capacity(128);
        match self.format {
            OutputFormat::Json => {
                out.push('{');
                self.write_json_fields(&mut out, fields);
                out.push('}');
            }
            OutputFormat::Logfmt => self.write_logfmt_fields(&mut out, fields, ""),
        }
        out
    }

    fn resolve(&self, attrs: Vec<Attr>) -> Vec<Field> {
        let mut fields = Vec::with_capacity(attrs.len());
        let mut groups = Vec::new();
        for attr in attrs {
            self.resolve_into(&mut fields, attr, &mut groups);
        }
        fields
    }

    fn resolve_into(&self, fields: &mut Vec<Field>, attr: Attr, groups: &mut Vec<String>) {
        let attr = if attr.value.is_group() {
            attr
        } else {
            let rewritten = match &self.options.replace_attr {
                Some(replace) => replace(groups.as_slice(), attr),
                None => Some(attr),
            };
            match rewritten {
                Some(mut attr) => {
                    attr.value.normalize();
                    attr
                }
                None => return,
            }
        };

        match attr.value {
            Value::Group(children) => {
                if attr.key.is_empty() {
                    for child in children {
                        self.resolve_into(fields, child, groups);
                    }
                    return;
                }
                groups.push(attr.key.clone());
                let mut nested = Vec::with_capacity(children.len());
                for child in children {
                    self.resolve_into(&mut nested, child, groups);
                }
                groups.pop();
                if !nested.is_empty() {
                    fields.push(Field::Group(attr.key, nested));
                }
            }
            value => {
                if !attr.key.is_empty() {
                    fields.push(Field::Scalar(attr.key, value));
                }
            }
        }
    }

    fn write_json_fields(&self, out: &mut String, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match field {
                Field::Scalar(key, value) => {
                    write_json_string(out, key);
                    out.push(':');
                    self.write_json_value(out, value);
                }
                Field::Group(key, children) => {
                    write_json_string(out, key);
                    out.push_str(":{");
                    self.write_json_fields(out, children);
                    out.push('}');
                }
            }
        }
    }

    fn write_json_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::String(s) => write_json_string(out, s),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Value::Uint(u) => {
                let _ = write!(out, "{}", u);
            }
            Value::Float(f) if f.is_finite() => {
                out.push_str(&serde_json::to_string(f).unwrap_or_default());
            }
            Value::Float(f) => write_json_string(out, &float_text(*f)),
            Value::Duration(d) => {
                let _ = write!(out, "{}", d.as_nanos());
            }
            Value::Time(t) if self.options.time_format.is_numeric() => {
                out.push_str(&self.options.time_format.format(t));
            }
            Value::Time(t) => write_json_string(out, &self.options.time_format.format(t)),
            Value::Group(_) | Value::Any(_) => write_json_string(out, &format!("{:?}", value)),
        }
    }

    fn write_logfmt_fields(&self, out: &mut String, fields: &[Field], prefix: &str) {
        for field in fields {
            match field {
                Field::Scalar(key, value) => {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    write_logfmt_text(out, &format!("{}{}", prefix, key));
                    out.push('=');
                    self.write_logfmt_value(out, value);
                }
                Field::Group(key, children) => {
                    let nested = format!("{}{}.", prefix, key);
                    self.write_logfmt_fields(out, children, &nested);
                }
            }
        }
    }

    fn write_logfmt_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::String(s) => write_logfmt_text(out, s),
            Value::Bool(b) => {
                let _ = write!(out, "{}", b);
            }
            Value::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Value::Uint(u) => {
                let _ = write!(out, "{}", u);
            }
            Value::Float(f) => out.push_str(&float_text(*f)),
            Value::Duration(d) => {
                let _ = write!(out, "{:?}", d);
            }
            Value::Time(t) => write_logfmt_text(out, &self.options.time_format.format(t)),
            Value::Group(_) | Value::Any(_) => write_logfmt_text(out, &format!("{:?}", value)),
        }
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "+Inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        f.to_string()
    }
}

fn write_json_string(out: &mut String, s: &str) {
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}

fn write_logfmt_text(out: &mut String, s: &str) {
    if needs_quoting(s) {
        quote_into(out, s);
    } else {
        out.push_str(s);
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c == '=' || c == '"' || c.is_whitespace() || c.is_control())
}

/// Append `s` as a double-quoted string literal, escaping quotes, backslashes
/// and control characters.
pub fn quote_into(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// `s` as a double-quoted string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    quote_into(&mut out, s);
    out
}
