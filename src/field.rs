use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use std::error::Error;
use std::fmt;

/// A user-supplied field value, typed once when the field is collected.
///
/// Integers keep their signedness and the widest width they fit in, floats
/// keep their precision (an `f32` renders with `f32` shortest digits), and
/// anything without a scalar representation is captured as text at
/// ingestion time.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F32(f32),
    F64(f64),
    /// Display text of an error or any `Display` value, including plain strings.
    Text(String),
    /// Debug rendering of a value that has no better representation.
    Opaque(String),
}

impl FieldValue {
    /// Capture an error by its display text.
    pub fn error(err: &(dyn Error + 'static)) -> Self {
        FieldValue::Text(err.to_string())
    }

    /// Capture any value by its display text.
    pub fn display(value: impl fmt::Display) -> Self {
        FieldValue::Text(value.to_string())
    }

    /// Capture any value by its debug text (slices, structs, ...).
    pub fn debug(value: impl fmt::Debug) -> Self {
        FieldValue::Opaque(format!("{:?}", value))
    }

    /// Render the value as a JSON token.
    ///
    /// Booleans, integers and finite floats are unquoted; everything else is
    /// a quoted, escaped JSON string. This never fails: non-finite floats
    /// are not valid JSON numbers and fall back to their quoted text
    /// (`"NaN"`, `"inf"`, `"-inf"`).
    pub fn to_token(&self) -> String {
        match self {
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::I64(v) => v.to_string(),
            FieldValue::U64(v) => v.to_string(),
            FieldValue::I128(v) => v.to_string(),
            FieldValue::U128(v) => v.to_string(),
            FieldValue::F32(v) => float_token(v, v.is_finite()),
            FieldValue::F64(v) => float_token(v, v.is_finite()),
            FieldValue::Text(s) | FieldValue::Opaque(s) => quote(s),
        }
    }
}

// `Display` for floats never uses exponent notation and drops a zero
// fraction, so `42.0` renders as `42`.
fn float_token(value: impl fmt::Display, finite: bool) -> String {
    if finite {
        value.to_string()
    } else {
        quote(&value.to_string())
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Serializes as the pre-rendered token. Only meaningful with `serde_json`.
impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.to_token()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

macro_rules! from_as {
    ($variant:ident($target:ty): $($t:ty),+) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::$variant(v as $target)
                }
            }
        )+
    };
}

from_as!(I64(i64): i8, i16, i32, i64, isize);
from_as!(U64(u64): u8, u16, u32, u64, usize);
from_as!(I128(i128): i128);
from_as!(U128(u128): u128);
from_as!(F32(f32): f32);
from_as!(F64(f64): f64);

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}
