use serde_json::{
    Map,
    Value,
};
use tunemint_core::{
    Address,
    ObjectId,
};

/// Borrowed view over the `fields` object of parsed Move content
///
/// Nested structs render as `{ "type": ..., "fields": {...} }`, `UID` as `{ "id": "0x.." }`,
/// `ID` and `address` as plain hex strings, and 64 bit numbers as strings
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    pub fn of(value: &'a Value) -> Option<Self> { value.as_object().map(Self) }

    pub fn get(&self, key: &str) -> Option<&'a Value> { self.0.get(key) }

    pub fn str(&self, key: &str) -> Option<&'a str> { self.get(key).and_then(Value::as_str) }

    /// Non-empty string field, or `default`
    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.str(key).filter(|s| !s.is_empty()).unwrap_or(default).to_owned()
    }

    /// Scalar rendered as text, whatever its JSON representation
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => self.nested(key).and_then(|f| f.text("name").or_else(|| f.text("value"))),
            other => Some(other.to_string()),
        }
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::String(s) => s.parse().ok(),
            v => v.as_u64(),
        }
    }

    pub fn address(&self, key: &str) -> Option<Address> { self.str(key).and_then(|s| s.parse().ok()) }

    /// An `ID` string or a `UID` object
    pub fn id(&self, key: &str) -> Option<ObjectId> {
        match self.get(key)? {
            Value::String(s) => s.parse().ok(),
            Value::Object(o) => o.get("id").and_then(Value::as_str).and_then(|s| s.parse().ok()),
            _ => None,
        }
    }

    /// The object's own `id: UID`
    pub fn uid(&self) -> Option<ObjectId> { self.id("id") }

    /// Fields of a nested struct value
    pub fn nested(&self, key: &str) -> Option<Fields<'a>> {
        let value = self.get(key)?;
        match value.get("fields") {
            Some(inner) => Self::of(inner),
            None => Self::of(value),
        }
    }

    pub fn contains(&self, key: &str) -> bool { self.0.contains_key(key) }
}
