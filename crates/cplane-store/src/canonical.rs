//! Canonical rendering of structured key data
//!
//! Cache ids hash the extra-key payload, so two payloads that differ only in
//! object field order must render identically. [`canonical_json`] produces a
//! stable, recursively key-sorted JSON rendering.

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt::Debug;

/// Render `value` as JSON with object keys sorted recursively
///
/// Arrays keep their order. Numbers render by value, so `1`, `1.0` and
/// `1e0` are the same key; the string `"1"` stays distinct.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Number(n) => write_number(n, out),
        Value::Null | Value::Bool(_) | Value::String(_) => {
            out.push_str(&value.to_string());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}

/// Integers as integers; integral floats within `i64` range as integers;
/// anything else in shortest round-trip decimal form without an exponent
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn write_number(n: &Number, out: &mut String) {
    if n.is_i64() || n.is_u64() {
        out.push_str(&n.to_string());
        return;
    }
    let Some(f) = n.as_f64() else {
        out.push_str(&n.to_string());
        return;
    };
    // 2^63 is exact as f64; the range check keeps the cast lossless
    if f.fract() == 0.0 && f >= -(2f64.powi(63)) && f < 2f64.powi(63) {
        out.push_str(&(f as i64).to_string());
    } else {
        out.push_str(&f.to_string());
    }
}

/// Canonicalized extra-key data, ready to be hashed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyExtra(String);

impl KeyExtra {
    /// No extra data (renders as `null`)
    #[must_use]
    pub fn none() -> Self {
        Self("null".to_string())
    }

    /// Canonicalize an arbitrary JSON value
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self(canonical_json(value))
    }

    /// Canonicalize an optional JSON value; `None` is the same as `null`
    #[must_use]
    pub fn from_option(value: Option<&Value>) -> Self {
        value.map_or_else(Self::none, Self::from_value)
    }

    /// Canonicalize any serializable value
    ///
    /// Values serde_json cannot represent (maps with non-string keys, for
    /// instance) are coerced to a JSON string of their `Debug` rendering.
    /// Non-finite floats become `null`, following serde_json.
    pub fn from_serializable<T>(value: &T) -> Self
    where
        T: Serialize + Debug + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(v) => Self::from_value(&v),
            Err(e) => {
                tracing::warn!(
                    "key extra is not representable as JSON ({e}); using debug rendering"
                );
                Self::from_value(&Value::String(format!("{value:?}")))
            }
        }
    }

    /// The canonical text
    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.0
    }
}

impl Default for KeyExtra {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&Value> for KeyExtra {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}
