//! Attribute value normalization
//!
//! Turns every [`Value`] into one of the canonical kinds an encoder knows how
//! to write, and decides whether the value is "empty" so that renderers can
//! omit it. Failures inside application code (a panicking `Display`, a failing
//! marshaller) never escape: the value degrades to a readable placeholder.

use super::attr::{AnyValue, Value};
use super::error::panic_message;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

impl Value {
    /// Replace `self` with its canonical form and report whether it is empty.
    ///
    /// Only absent values and zero-length strings are empty; numbers and
    /// booleans never are, whatever their value.
    pub fn normalize(&mut self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::Any(any) => {
                let (value, empty) = normalize_any(any);
                *self = value;
                empty
            }
            _ => false,
        }
    }

    /// Canonical form of the value, leaving `self` untouched.
    #[must_use]
    pub fn normalized(&self) -> Value {
        let mut value = self.clone();
        value.normalize();
        value
    }
}

/// Convert an application value into a canonical [`Value`] plus its emptiness.
pub fn normalize_any(value: &AnyValue) -> (Value, bool) {
    match panic::catch_unwind(AssertUnwindSafe(|| convert(value))) {
        Ok(result) => result,
        Err(payload) => (Value::String(fallback_text(value, &*payload)), false),
    }
}

fn convert(value: &AnyValue) -> (Value, bool) {
    match value {
        AnyValue::Nil => (Value::String(String::new()), true),
        AnyValue::Error(None) => (Value::String(String::new()), true),
        AnyValue::Error(Some(err)) => (Value::String(err.to_string()), false),
        AnyValue::Marshal(m) => match m.marshal_json() {
            Ok(serde_json::Value::Null) => (Value::String(String::new()), true),
            Ok(json) => (from_json(json), false),
            Err(_) => (Value::String(format!("{:?}", m)), false),
        },
        AnyValue::Display(d) => {
            let s = d.to_string();
            let empty = s.is_empty();
            (Value::String(s), empty)
        }
        AnyValue::Func(None) => (Value::String(String::new()), true),
        AnyValue::Func(Some(addr)) => (Value::String(format!("{:#x}", addr)), false),
        AnyValue::Dynamic(v) => {
            if let Some(canonical) = downcast_primitive(v.as_any()) {
                let empty = matches!(&canonical, Value::String(s) if s.is_empty());
                return (canonical, empty);
            }
            match v.to_json() {
                Ok(json) => match json.to_string().as_str() {
                    r#""""# | "[]" | "{}" | "null" => (Value::String(String::new()), true),
                    text => (Value::String(text.to_string()), false),
                },
                Err(_) => {
                    let text = format!("{:?}", v);
                    let empty = text.is_empty();
                    (Value::String(text), empty)
                }
            }
        }
    }
}

fn downcast_primitive(v: &dyn std::any::Any) -> Option<Value> {
    macro_rules! try_cast {
        ($($ty:ty => |$x:ident| $conv:expr),* $(,)?) => {
            $(
                if let Some(&$x) = v.downcast_ref::<$ty>() {
                    return Some($conv);
                }
            )*
        };
    }

    if let Some(s) = v.downcast_ref::<String>() {
        return Some(Value::String(s.clone()));
    }
    if let Some(s) = v.downcast_ref::<&'static str>() {
        return Some(Value::String((*s).to_string()));
    }
    if let Some(t) = v.downcast_ref::<DateTime<Utc>>() {
        return Some(Value::Time(*t));
    }

    try_cast! {
        bool => |x| Value::Bool(x),
        i8 => |x| Value::Int(i64::from(x)),
        i16 => |x| Value::Int(i64::from(x)),
        i32 => |x| Value::Int(i64::from(x)),
        i64 => |x| Value::Int(x),
        isize => |x| Value::Int(x as i64),
        u8 => |x| Value::Int(i64::from(x)),
        u16 => |x| Value::Int(i64::from(x)),
        u32 => |x| Value::Int(i64::from(x)),
        u64 => |x| unsigned(x),
        usize => |x| unsigned(x as u64),
        f32 => |x| Value::Float(f64::from(x)),
        f64 => |x| Value::Float(x),
        Duration => |x| Value::Duration(x),
    }
    None
}

/// Unsigned values beyond the signed range are kept as decimal text so that
/// consumers parsing numbers as signed 64-bit integers do not lose them.
fn unsigned(x: u64) -> Value {
    if x > i64::MAX as u64 {
        Value::String(x.to_string())
    } else {
        Value::Uint(x)
    }
}

/// Map a JSON document onto the canonical kinds; composites stay as JSON text.
pub(crate) fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::String(String::new()),
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                unsigned(u)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        other => Value::String(other.to_string()),
    }
}

fn fallback_text(value: &AnyValue, payload: &(dyn std::any::Any + Send)) -> String {
    let reason = panic_message(payload);
    match panic::catch_unwind(AssertUnwindSafe(|| format!("{:?}", value))) {
        Ok(text) if !matches!(value, AnyValue::Display(_)) => text,
        _ => format!("!PANIC: {}", reason),
    }
}

/// Plain text of a value as it would appear in a message.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}={}", attr.key, attr.value)?;
                }
                f.write_str("]")
            }
            Value::Any(any) => write!(f, "{}", normalize_any(any).0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{LoggerError, Result};
    use serde::Serialize;
    use std::fmt;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Failing;

    impl crate::core::attr::MarshalJson for Failing {
        fn marshal_json(&self) -> Result<serde_json::Value> {
            Err(LoggerError::other("cannot marshal"))
        }
    }

    #[derive(Debug)]
    struct NullMarshal;

    impl crate::core::attr::MarshalJson for NullMarshal {
        fn marshal_json(&self) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    struct Exploding;

    impl fmt::Display for Exploding {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("display exploded")
        }
    }

    #[derive(Debug, Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Debug, Serialize, Default)]
    struct Empty {}

    fn norm(mut v: Value) -> (Value, bool) {
        let empty = v.normalize();
        (v, empty)
    }

    #[test]
    fn test_nil_is_empty() {
        let (v, empty) = norm(Value::nil());
        assert!(empty);
        assert!(matches!(v, Value::String(s) if s.is_empty()));
    }

    #[test]
    fn test_strings() {
        assert!(norm(Value::from("")).1);
        assert!(!norm(Value::from("x")).1);
        assert!(norm(Value::any(String::new())).1);
    }

    #[test]
    fn test_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let (v, empty) = norm(Value::error(io));
        assert!(!empty);
        assert!(matches!(v, Value::String(s) if s == "disk gone"));

        assert!(norm(Value::Any(AnyValue::Error(None))).1);
    }

    #[test]
    fn test_marshal() {
        let (v, empty) = norm(Value::marshal(Failing));
        assert!(!empty);
        assert!(matches!(v, Value::String(s) if s == "Failing"));

        assert!(norm(Value::marshal(NullMarshal)).1);
    }

    #[test]
    fn test_display() {
        assert!(norm(Value::display("")).1);
        let (v, empty) = norm(Value::display(42));
        assert!(!empty);
        assert!(matches!(v, Value::String(s) if s == "42"));
    }

    #[test]
    fn test_panicking_display_degrades() {
        let (v, empty) = norm(Value::Any(AnyValue::Display(Arc::new(Exploding))));
        assert!(!empty);
        assert!(matches!(v, Value::String(s) if s.contains("display exploded")));
    }

    #[test]
    fn test_numbers_never_empty() {
        assert!(matches!(norm(Value::any(0i32)), (Value::Int(0), false)));
        assert!(matches!(norm(Value::any(0u8)), (Value::Int(0), false)));
        assert!(matches!(norm(Value::any(false)), (Value::Bool(false), false)));
        assert!(matches!(norm(Value::any(0.0f64)), (Value::Float(_), false)));
        assert!(matches!(norm(Value::any(12u64)), (Value::Uint(12), false)));
    }

    #[test]
    fn test_large_unsigned_becomes_text() {
        let (v, empty) = norm(Value::any(u64::MAX));
        assert!(!empty);
        assert!(matches!(v, Value::String(s) if s == "18446744073709551615"));
    }

    #[test]
    fn test_funcs() {
        assert!(norm(Value::func::<fn()>(None)).1);
        let f: fn() = || {};
        let (v, empty) = norm(Value::func(Some(&f)));
        assert!(!empty);
        assert!(matches!(v, Value::String(s) if s.starts_with("0x")));
    }

    #[test]
    fn test_composites() {
        let (v, empty) = norm(Value::any(Point { x: 1, y: 2 }));
        assert!(!empty);
        assert!(matches!(v, Value::String(s) if s == r#"{"x":1,"y":2}"#));

        assert!(norm(Value::any(Empty::default())).1);
        assert!(norm(Value::any(Vec::<i32>::new())).1);
        assert!(norm(Value::any(())).1);
        assert!(!norm(Value::any(vec![1, 2])).1);
    }

    #[test]
    fn test_canonical_values_untouched() {
        let (v, empty) = norm(Value::Int(0));
        assert!(!empty);
        assert!(matches!(v, Value::Int(0)));
        assert!(!norm(Value::Duration(Duration::ZERO)).1);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(Value::from(42u8).to_string(), "42");
        assert_eq!(Value::from(Duration::from_millis(1500)).to_string(), "1.5s");
        assert_eq!(Value::any(Point { x: 1, y: 2 }).to_string(), r#"{"x":1,"y":2}"#);
        assert_eq!(
            Value::group(vec![crate::core::attr::Attr::int("a", 1)]).to_string(),
            "[a=1]"
        );
    }
}
