//! Tagged value tree decoded from click payloads.
//!
//! [`TaggedValue`] mirrors the twelve payload tag kinds one to one. A decoded
//! compound is represented as [`NamedValues`], an insertion-ordered list of
//! key/value pairs.

use serde::ser::{Serialize, SerializeMap, Serializer};

// =============================================================================
// Type Codes
// =============================================================================

/// Wire type codes for each tag kind.
pub mod type_id {
    /// Terminates a compound.
    pub const END: u8 = 0;
    pub const BYTE: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const INT: u8 = 3;
    pub const LONG: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const BYTE_ARRAY: u8 = 7;
    pub const STRING: u8 = 8;
    pub const LIST: u8 = 9;
    pub const COMPOUND: u8 = 10;
    pub const INT_ARRAY: u8 = 11;
    pub const LONG_ARRAY: u8 = 12;
}

// =============================================================================
// TaggedValue
// =============================================================================

/// A recursively typed payload value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TaggedValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<TaggedValue>),
    Compound(NamedValues),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl TaggedValue {
    /// Returns the wire type code of this value.
    pub fn type_id(&self) -> u8 {
        match self {
            Self::Byte(_) => type_id::BYTE,
            Self::Short(_) => type_id::SHORT,
            Self::Int(_) => type_id::INT,
            Self::Long(_) => type_id::LONG,
            Self::Float(_) => type_id::FLOAT,
            Self::Double(_) => type_id::DOUBLE,
            Self::ByteArray(_) => type_id::BYTE_ARRAY,
            Self::String(_) => type_id::STRING,
            Self::List(_) => type_id::LIST,
            Self::Compound(_) => type_id::COMPOUND,
            Self::IntArray(_) => type_id::INT_ARRAY,
            Self::LongArray(_) => type_id::LONG_ARRAY,
        }
    }

    /// Returns a short name for the tag kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::ByteArray(_) => "byte_array",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Compound(_) => "compound",
            Self::IntArray(_) => "int_array",
            Self::LongArray(_) => "long_array",
        }
    }

    /// Returns the value as a string slice if it is a string tag.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i32` if it is an int tag.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `i64`, widening any integral tag.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `f64`, widening any numeric tag.
    ///
    /// Number range inputs arrive as floats, so readers usually want this.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Interprets a byte tag as a boolean (boolean inputs are sent as `0`/`1`).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Byte(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Returns the nested compound if this is a compound tag.
    pub fn as_compound(&self) -> Option<&NamedValues> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the elements if this is a list tag.
    pub fn as_list(&self) -> Option<&[TaggedValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i8> for TaggedValue {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<bool> for TaggedValue {
    fn from(v: bool) -> Self {
        Self::Byte(i8::from(v))
    }
}

impl From<i16> for TaggedValue {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for TaggedValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for TaggedValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for TaggedValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for TaggedValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for TaggedValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for TaggedValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NamedValues> for TaggedValue {
    fn from(v: NamedValues) -> Self {
        Self::Compound(v)
    }
}

// =============================================================================
// NamedValues
// =============================================================================

/// Insertion-ordered `(key, value)` pairs decoded from one compound.
///
/// Keys are unique: inserting an existing key replaces its value in place,
/// so the last write wins while the original position is kept.
///
/// Serializes as a map in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValues {
    entries: Vec<(String, TaggedValue)>,
}

impl NamedValues {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value for the key if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<TaggedValue>,
    ) -> Option<TaggedValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<TaggedValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<TaggedValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the first entry.
    ///
    /// Payloads used to be read as a single value; this accessor keeps that
    /// shape available without special-casing the decoder.
    pub fn first(&self) -> Option<(&str, &TaggedValue)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaggedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for NamedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl IntoIterator for NamedValues {
    type Item = (String, TaggedValue);
    type IntoIter = std::vec::IntoIter<(String, TaggedValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<TaggedValue>> FromIterator<(K, V)> for NamedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_last_write_wins_keeps_position() {
        let mut values = NamedValues::new();
        values.insert("a", 1i32);
        values.insert("b", "two");
        let prev = values.insert("a", 3i32);

        assert_eq!(prev, Some(TaggedValue::Int(1)));
        assert_eq!(values.len(), 2);
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(values.get("a"), Some(&TaggedValue::Int(3)));
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(TaggedValue::Short(7).as_i64(), Some(7));
        assert_eq!(TaggedValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(TaggedValue::Byte(1).as_bool(), Some(true));
        assert_eq!(TaggedValue::String("x".into()).as_f64(), None);
    }

    #[test]
    fn test_first_entry() {
        let values: NamedValues = [("amount", 5i32)].into_iter().collect();
        let (key, value) = values.first().unwrap();
        assert_eq!(key, "amount");
        assert_eq!(value.as_i32(), Some(5));
    }

    #[test]
    fn test_serialize_shape() {
        let values = NamedValues::new().with("ok", true);
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": {"type": "byte", "value": 1}})
        );
    }
}
