//! Binding engine: coerces a [`Value`] tree into typed configuration.
//!
//! The target's static shape drives the coercion. Every supported shape
//! implements [`Bind`]; records get their implementation from
//! `#[derive(Bind)]`, which dispatches mapping keys to fields through
//! [`bind_record`].
//!
//! Records bind in place: fields bound before a failure keep their new
//! values. Sequences and mappings are built in a fresh container that replaces
//! the target only once every element has bound.

mod collections;
mod path;
mod primitives;

use thiserror::Error;

use crate::value::Value;

pub use path::FieldPath;
pub use primitives::{DURATION_UNITS, NoConfig, parse_scaled_integer};

/// Errors produced while binding. Each carries the rendered path of the value
/// that failed, e.g. `tcp-config.tls.handshake-timeout` or `levels[2].pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("{path}: unknown field '{key}'")]
    UnknownField { path: String, key: String },

    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: String,
    },

    #[error("{path}: {detail}")]
    OutOfRange { path: String, detail: String },

    #[error("{path}: unsupported target shape ({shape})")]
    UnsupportedShape { path: String, shape: &'static str },
}

impl BindError {
    /// Rendered location of the offending value.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::UnknownField { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::OutOfRange { path, .. }
            | Self::UnsupportedShape { path, .. } => path,
        }
    }

    #[must_use]
    pub fn type_mismatch(path: &FieldPath, expected: &'static str, found: &Value) -> Self {
        let found = match found {
            Value::String(s) => format!("string {s:?}"),
            Value::Number(n) => format!("number {n}"),
            Value::Bool(b) => format!("bool {b}"),
            other => other.kind().to_owned(),
        };
        Self::TypeMismatch {
            path: path.to_string(),
            expected,
            found,
        }
    }

    #[must_use]
    pub fn out_of_range(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self::OutOfRange {
            path: path.to_string(),
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn unsupported_shape(path: &FieldPath, shape: &'static str) -> Self {
        Self::UnsupportedShape {
            path: path.to_string(),
            shape,
        }
    }
}

/// A typed slot that can be populated from a [`Value`].
pub trait Bind {
    /// Populates `self` from `value`. `path` locates `value` inside the
    /// document being bound and is restored before returning.
    ///
    /// # Errors
    /// Returns the first [`BindError`] encountered; nothing is retried.
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError>;
}

/// Binds `value` into `target`, starting from the document root.
///
/// # Errors
/// See [`Bind::bind`].
pub fn bind_value<T: Bind + ?Sized>(target: &mut T, value: &Value) -> Result<(), BindError> {
    let mut path = FieldPath::root();
    target.bind(value, &mut path)
}

/// Record rule shared by every `#[derive(Bind)]` implementation.
///
/// `value` must be a mapping. Each key is converted with [`to_field_name`] and
/// handed to `field`, which binds the matching field and returns `Some`, or
/// returns `None` when the record has no such field.
///
/// # Errors
/// `TypeMismatch` when `value` is not a mapping, `UnknownField` for the first
/// key without a field, or whatever binding the field produced. Keys are
/// visited in sorted order and fields bound before the failing key keep
/// their new values.
pub fn bind_record<F>(value: &Value, path: &mut FieldPath, mut field: F) -> Result<(), BindError>
where
    F: FnMut(&str, &Value, &mut FieldPath) -> Option<Result<(), BindError>>,
{
    let Value::Map(entries) = value else {
        return Err(BindError::type_mismatch(path, "mapping", value));
    };

    for (key, item) in entries {
        let name = to_field_name(key);
        path.push_field(key);
        let outcome = match field(&name, item, path) {
            Some(result) => result,
            None => Err(BindError::UnknownField {
                path: path.to_string(),
                key: key.clone(),
            }),
        };
        path.pop();
        outcome?;
    }
    Ok(())
}

/// Converts a configuration key to a Rust field name.
///
/// `-`, `_`, space and `.` separate segments; an upper-case letter following a
/// lower-case one starts a segment; a letter following a digit starts a
/// segment. Other characters are dropped. Segments are lower-cased and joined
/// with `_`.
///
/// ```
/// use bootkit::binding::to_field_name;
///
/// assert_eq!(to_field_name("handshake-timeout"), "handshake_timeout");
/// assert_eq!(to_field_name("TcpConfig"), "tcp_config");
/// assert_eq!(to_field_name("ipv4address"), "ipv4_address");
/// ```
#[must_use]
pub fn to_field_name(key: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum Prev {
        Start,
        Lower,
        Upper,
        Digit,
        Separator,
    }

    let mut out = String::with_capacity(key.len() + 4);
    let mut prev = Prev::Start;
    for ch in key.trim().chars() {
        let next = if ch.is_ascii_lowercase() {
            Prev::Lower
        } else if ch.is_ascii_uppercase() {
            Prev::Upper
        } else if ch.is_ascii_digit() {
            Prev::Digit
        } else if matches!(ch, '-' | '_' | ' ' | '.') {
            if prev != Prev::Start {
                prev = Prev::Separator;
            }
            continue;
        } else {
            continue;
        };

        let boundary = matches!(
            (prev, next),
            (Prev::Separator, _) | (Prev::Lower, Prev::Upper) | (Prev::Digit, Prev::Lower | Prev::Upper)
        );
        if boundary {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
        prev = next;
    }
    out
}
