use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::{Bind, BindError, FieldPath};
use crate::value::Value;

impl<T: Bind + Default> Bind for Vec<T> {
    /// Builds a fresh vector; the target is replaced only when every element
    /// bound successfully.
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        let Value::Seq(items) = value else {
            return Err(BindError::type_mismatch(path, "sequence", value));
        };

        let mut fresh = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            path.push_index(index);
            let mut element = T::default();
            let result = element.bind(item, path);
            path.pop();
            result?;
            fresh.push(element);
        }
        *self = fresh;
        Ok(())
    }
}

fn bind_entries<T, I>(value: &Value, path: &mut FieldPath, mut insert: I) -> Result<(), BindError>
where
    T: Bind + Default,
    I: FnMut(String, T),
{
    let Value::Map(entries) = value else {
        return Err(BindError::type_mismatch(path, "mapping", value));
    };

    for (key, item) in entries {
        path.push_key(key);
        let mut element = T::default();
        let result = element.bind(item, path);
        path.pop();
        result?;
        insert(key.clone(), element);
    }
    Ok(())
}

impl<T: Bind + Default, S: BuildHasher + Default> Bind for HashMap<String, T, S> {
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        let mut fresh = HashMap::with_hasher(S::default());
        bind_entries(value, path, |k, v| {
            fresh.insert(k, v);
        })?;
        *self = fresh;
        Ok(())
    }
}

impl<T: Bind + Default> Bind for BTreeMap<String, T> {
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        let mut fresh = BTreeMap::new();
        bind_entries(value, path, |k, v| {
            fresh.insert(k, v);
        })?;
        *self = fresh;
        Ok(())
    }
}

impl<T: Bind + Default> Bind for Option<T> {
    /// Null clears the option. Anything else binds into the existing value,
    /// or into `T::default()` which is stored only on success.
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.bind(value, path),
            None => {
                let mut inner = T::default();
                inner.bind(value, path)?;
                *self = Some(inner);
                Ok(())
            }
        }
    }
}

impl<T: Bind + ?Sized> Bind for Box<T> {
    fn bind(&mut self, value: &Value, path: &mut FieldPath) -> Result<(), BindError> {
        (**self).bind(value, path)
    }
}
