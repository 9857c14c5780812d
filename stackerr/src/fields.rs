use std::collections::{BTreeMap, HashMap};

pub use serde_json::Value;

/// Key/value diagnostics attached to an error.
pub type Fields = BTreeMap<String, Value>;

/// Types which can be turned into a [`Fields`] map.
///
/// Implemented for maps and collections of `(key, value)` pairs, and derivable for plain structs
/// through [`derive(Fields)`](stackerr_derive::Fields).
pub trait IntoFields {
    /// Converts `self` into a field map.
    fn into_fields(self) -> Fields;
}

impl<K, V> IntoFields for BTreeMap<K, V>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_fields(self) -> Fields {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V, S> IntoFields for HashMap<K, V, S>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_fields(self) -> Fields {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V, const N: usize> IntoFields for [(K, V); N]
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_fields(self) -> Fields {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V> IntoFields for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_fields(self) -> Fields {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

/// Union of `base` and `new`, entries of `new` winning on collision.
pub(crate) fn merge(base: &Fields, new: Fields) -> Fields {
    let mut merged = base.clone();
    merged.extend(new);
    merged
}

/// Builds a field map out of a leading pair plus `extras` read as alternating keys and values.
///
/// A dangling key at the end gets [`Value::Null`].
pub(crate) fn from_pairs<I>(key: String, value: Value, extras: I) -> Fields
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let mut fields = Fields::new();
    fields.insert(key, value);

    let mut extras = extras.into_iter().map(Into::into);
    while let Some(key) = extras.next() {
        let value = extras.next().unwrap_or(Value::Null);
        fields.insert(key_string(key), value);
    }

    fields
}

fn key_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
