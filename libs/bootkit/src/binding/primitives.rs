use std::time::Duration;

use super::{Bind, BindError, FieldPath};
use crate::value::Value;

/// Duration suffixes accepted by integer targets, with their scale in
/// nanoseconds. `ms` must be tried before `m` and `s`.
pub const DURATION_UNITS: [(&str, i128); 5] = [
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
    ("d", 86_400 * 1_000_000_000),
];

/// Parses an integer written either plainly (`"42"`, `"-7"`) or with a
/// duration unit (`"5s"`, `"250ms"`, `"2d"`), the latter scaled to
/// nanoseconds. Returns `None` for anything else.
#[must_use]
pub fn parse_scaled_integer(text: &str) -> Option<i128> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i128>() {
        return Some(n);
    }
    DURATION_UNITS.iter().find_map(|(suffix, scale)| {
        let digits = text.strip_suffix(suffix)?;
        let n = digits.trim_end().parse::<i64>().ok()?;
        i128::from(n).checked_mul(*scale)
    })
}

fn integer_from(value: &Value, path: &FieldPath) -> Result<i128, BindError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i128::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Ok(i128::from(u));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38 => {
                    #[allow(clippy::cast_possible_truncation)]
                    let whole = f as i128;
                    Ok(whole)
                }
                _ => Err(BindError::type_mismatch(path, "integer", value)),
            }
        }
        Value::String(s) => {
            parse_scaled_integer(s).ok_or_else(|| BindError::type_mismatch(path, "integer or duration string", value))
        }
        _ => Err(BindError::type_mismatch(path, "integer", value)),
    }
}

macro_rules! bind_integer {
    ($($t:ty),*) => {
        $(
            impl Bind for $t {
                fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
                    let wide = integer_from(value, path)?;
                    *self = <$t>::try_from(wide).map_err(|_| {
                        BindError::out_of_range(path, format!("{wide} does not fit in {}", stringify!($t)))
                    })?;
                    Ok(())
                }
            }
        )*
    };
}

bind_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Bind for Duration {
    /// Durations follow the integer rule and count nanoseconds.
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        let nanos = integer_from(value, path)?;
        let nanos = u64::try_from(nanos)
            .map_err(|_| BindError::out_of_range(path, format!("{nanos}ns is not a valid duration")))?;
        *self = Duration::from_nanos(nanos);
        Ok(())
    }
}

impl Bind for f64 {
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        match value {
            Value::Number(n) => {
                *self = n
                    .as_f64()
                    .ok_or_else(|| BindError::type_mismatch(path, "float", value))?;
                Ok(())
            }
            _ => Err(BindError::type_mismatch(path, "float", value)),
        }
    }
}

impl Bind for f32 {
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        let mut wide = 0.0_f64;
        wide.bind(value, path)?;
        #[allow(clippy::cast_possible_truncation)]
        let narrow = wide as f32;
        if narrow.is_finite() {
            *self = narrow;
            Ok(())
        } else {
            Err(BindError::out_of_range(path, format!("{wide} does not fit in f32")))
        }
    }
}

impl Bind for bool {
    /// Accepts a boolean, or a string token compared case-insensitively:
    /// `1 t true yes on` and `0 f false no off`.
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        match value {
            Value::Bool(b) => {
                *self = *b;
                Ok(())
            }
            Value::String(s) => {
                *self = match s.trim().to_ascii_lowercase().as_str() {
                    "1" | "t" | "true" | "yes" | "on" => true,
                    "0" | "f" | "false" | "no" | "off" => false,
                    _ => return Err(BindError::type_mismatch(path, "bool", value)),
                };
                Ok(())
            }
            _ => Err(BindError::type_mismatch(path, "bool", value)),
        }
    }
}

impl Bind for String {
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        match value {
            Value::String(s) => {
                s.clone_into(self);
                Ok(())
            }
            _ => Err(BindError::type_mismatch(path, "string", value)),
        }
    }
}

impl Bind for char {
    fn bind(&mut self, _value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        Err(BindError::unsupported_shape(path, "char"))
    }
}

impl Bind for () {
    fn bind(&mut self, _value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        Err(BindError::unsupported_shape(path, "unit"))
    }
}

impl<T, const N: usize> Bind for [T; N] {
    fn bind(&mut self, _value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        Err(BindError::unsupported_shape(path, "fixed-size array"))
    }
}

impl Bind for Value {
    /// Raw values are copied verbatim; the component interprets them itself.
    fn bind(&mut self, value: &Value, _path: &mut FieldPath) -> Result<(), BindError> {
        value.clone_into(self);
        Ok(())
    }
}

/// Configuration type for components that take no configuration.
///
/// Accepts only null or an empty mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoConfig;

impl Bind for NoConfig {
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        match value {
            Value::Null => Ok(()),
            Value::Map(entries) => match entries.keys().next() {
                None => Ok(()),
                Some(key) => {
                    path.push_field(key);
                    let err = BindError::UnknownField {
                        path: path.to_string(),
                        key: key.clone(),
                    };
                    path.pop();
                    Err(err)
                }
            },
            _ => Err(BindError::type_mismatch(path, "empty mapping", value)),
        }
    }
}
