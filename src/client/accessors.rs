//! Typed Accessors
//!
//! Every accessor returns a [`Lookup`]: the converted value, or the caller's
//! default together with the reason the default was used.

use super::Client;
use crate::error::AccessError;
use crate::value::{Value, ValueKind};
use serde::de::DeserializeOwned;

/// Result of a typed lookup
///
/// `value` is always usable: it holds either the configured value or the
/// default supplied by the caller. `error` is `Some` exactly when the
/// default was used.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Lookup<T> {
    pub value: T,
    pub error: Option<AccessError>,
}

impl<T> Lookup<T> {
    pub(crate) fn found(value: T) -> Self {
        Self { value, error: None }
    }

    pub(crate) fn fallback(default: T, error: AccessError) -> Self {
        Self {
            value: default,
            error: Some(error),
        }
    }

    /// True when the default was returned
    pub fn is_default(&self) -> bool {
        self.error.is_some()
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn error(&self) -> Option<&AccessError> {
        self.error.as_ref()
    }

    pub fn into_parts(self) -> (T, Option<AccessError>) {
        (self.value, self.error)
    }

    /// Drop the default and surface the error instead
    pub fn into_result(self) -> Result<T, AccessError> {
        match self.error {
            None => Ok(self.value),
            Some(e) => Err(e),
        }
    }
}

impl Client {
    /// Raw value for `name` from the current snapshot
    pub fn get_value(&self, name: &str) -> Result<Value, AccessError> {
        if self.is_closed() {
            return Err(AccessError::Closed);
        }

        self.repository()
            .get_data(name)
            .ok_or_else(|| AccessError::NotFound {
                key: name.to_owned(),
            })
    }

    fn lookup<T>(
        &self,
        name: &str,
        default: T,
        expected: ValueKind,
        view: impl FnOnce(&Value) -> Option<T>,
    ) -> Lookup<T> {
        let value = match self.get_value(name) {
            Ok(value) => value,
            Err(e) => return Lookup::fallback(default, e),
        };

        match view(&value) {
            Some(converted) => Lookup::found(converted),
            None => Lookup::fallback(
                default,
                AccessError::TypeMismatch {
                    key: name.to_owned(),
                    expected,
                    found: value.kind(),
                },
            ),
        }
    }

    /// Decode a value of any serde-deserializable shape
    ///
    /// A mapping or sequence shaped like `T` succeeds; anything else returns
    /// `default` with [`AccessError::Decode`].
    pub fn get_config<T: DeserializeOwned>(&self, name: &str, default: T) -> Lookup<T> {
        let value = match self.get_value(name) {
            Ok(value) => value,
            Err(e) => return Lookup::fallback(default, e),
        };

        match value.decode::<T>() {
            Ok(decoded) => Lookup::found(decoded),
            Err(e) => Lookup::fallback(
                default,
                AccessError::Decode {
                    key: name.to_owned(),
                    message: e.to_string(),
                },
            ),
        }
    }

    pub fn get_config_string(&self, name: &str, default: impl Into<String>) -> Lookup<String> {
        self.lookup(name, default.into(), ValueKind::String, |v| {
            v.as_str().map(str::to_owned)
        })
    }

    /// Only integers qualify; `3.0` is a float and yields the default
    pub fn get_config_int(&self, name: &str, default: i64) -> Lookup<i64> {
        self.lookup(name, default, ValueKind::Integer, Value::as_i64)
    }

    /// Only floats qualify; `3` is an integer and yields the default
    pub fn get_config_float(&self, name: &str, default: f64) -> Lookup<f64> {
        self.lookup(name, default, ValueKind::Float, Value::as_f64)
    }

    pub fn get_config_bool(&self, name: &str, default: bool) -> Lookup<bool> {
        self.lookup(name, default, ValueKind::Bool, Value::as_bool)
    }

    /// All elements must be strings, otherwise the whole default is returned
    pub fn get_config_array_of_strings(
        &self,
        name: &str,
        default: Vec<String>,
    ) -> Lookup<Vec<String>> {
        self.lookup(name, default, ValueKind::StringSequence, Value::as_string_list)
    }
}
