//! Attributes attached to log records
//!
//! An [`Attr`] is a key paired with a [`Value`]. Values are a closed set of
//! kinds; anything the application hands over that is not one of them travels
//! as an [`AnyValue`] until the normalizer turns it into a canonical kind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Value of an attribute
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Duration(Duration),
    Time(DateTime<Utc>),
    /// Nested attributes; an empty key inlines them into the parent.
    Group(Vec<Attr>),
    /// Application value awaiting normalization.
    Any(AnyValue),
}

/// A value whose JSON form is produced by the value itself.
pub trait MarshalJson: fmt::Debug + Send + Sync {
    fn marshal_json(&self) -> super::error::Result<serde_json::Value>;
}

/// Type-erased serializable value, inspected by the normalizer.
pub trait DynamicValue: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> DynamicValue for T
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Arbitrary application value
#[derive(Clone)]
pub enum AnyValue {
    Nil,
    Error(Option<Arc<dyn std::error::Error + Send + Sync>>),
    Marshal(Arc<dyn MarshalJson>),
    Display(Arc<dyn fmt::Display + Send + Sync>),
    /// Address of a callable, `None` when absent.
    Func(Option<usize>),
    Dynamic(Arc<dyn DynamicValue>),
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyValue::Nil => f.write_str("<nil>"),
            AnyValue::Error(Some(err)) => write!(f, "{:?}", err),
            AnyValue::Error(None) => f.write_str("<nil>"),
            AnyValue::Marshal(m) => write!(f, "{:?}", m),
            AnyValue::Display(d) => write!(f, "{}", d),
            AnyValue::Func(Some(addr)) => write!(f, "{:#x}", addr),
            AnyValue::Func(None) => f.write_str("<nil>"),
            AnyValue::Dynamic(v) => write!(f, "{:?}", v),
        }
    }
}

impl Value {
    pub fn nil() -> Self {
        Value::Any(AnyValue::Nil)
    }

    /// Wrap any serializable value; the normalizer decides its final kind.
    pub fn any<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Value::Any(AnyValue::Dynamic(Arc::new(value)))
    }

    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Value::Any(AnyValue::Error(Some(Arc::new(err))))
    }

    pub fn display<D>(value: D) -> Self
    where
        D: fmt::Display + Send + Sync + 'static,
    {
        Value::Any(AnyValue::Display(Arc::new(value)))
    }

    pub fn marshal<M: MarshalJson + 'static>(value: M) -> Self {
        Value::Any(AnyValue::Marshal(Arc::new(value)))
    }

    /// Reference a callable by address.
    pub fn func<F: ?Sized>(f: Option<&F>) -> Self {
        Value::Any(AnyValue::Func(
            f.map(|f| f as *const F as *const () as usize),
        ))
    }

    pub fn group(attrs: Vec<Attr>) -> Self {
        Value::Group(attrs)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Value::Group(_))
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

value_from! {
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    isize => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    u64 => Uint as u64,
    usize => Uint as u64,
    f32 => Float as f64,
    f64 => Float as f64,
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(attrs: Vec<Attr>) -> Self {
        Value::Group(attrs)
    }
}

impl From<AnyValue> for Value {
    fn from(v: AnyValue) -> Self {
        Value::Any(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or_else(Value::nil, Into::into)
    }
}

/// Key/value pair attached to a record
#[derive(Debug, Clone)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, Value::Uint(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Value::Float(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, Value::Time(value))
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self::new(key, Value::Group(attrs))
    }

    pub fn any<T>(key: impl Into<String>, value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(key, Value::any(value))
    }

    pub fn error<E>(key: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(key, Value::error(err))
    }
}
