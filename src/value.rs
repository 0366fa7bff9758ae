//! Configuration Values
//!
//! Loosely-typed configuration values as parsed from a YAML or JSON document.
//! Every accessor view is strict: a value is only seen as the type it was
//! parsed as, no numeric or string coercion happens here.

use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parsed configuration document, keyed by top-level name
pub type Snapshot = BTreeMap<String, Value>;

/// A single loosely-typed configuration value
///
/// Integers are signed 64-bit; a document integer outside that range is a
/// parse error rather than a silently rounded float. Scalar mapping keys
/// (`80: http`, `true: on`) are kept as their string form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

/// Kind of a [`Value`], used in type-mismatch diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Sequence,
    Mapping,
    /// A sequence whose every element is a string
    StringSequence,
    /// A caller-defined structured type
    Structured,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
            ValueKind::StringSequence => "array of strings",
            ValueKind::Structured => "structured value",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Mapping(_) => ValueKind::Mapping,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; an integral float is not an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view; an integer is not a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// All-or-nothing view of a sequence of strings
    ///
    /// Returns `None` if the value is not a sequence or if any element is
    /// not a string; partial results are never produced.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        self.as_sequence()?
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect()
    }

    /// Decode this value into a caller-defined type through serde
    ///
    /// The value is converted into a `serde_yaml::Value` tree and decoded
    /// from there, so no textual round trip is involved.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_yaml::Error> {
        let tree = serde_yaml::to_value(self)?;
        serde_yaml::from_value(tree)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| E::custom(format!("integer {} is out of range for a 64-bit signed integer", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = BTreeMap::new();
        while let Some(MappingKey(key)) = map.next_key()? {
            let value = map.next_value()?;
            entries.insert(key, value);
        }
        Ok(Value::Mapping(entries))
    }
}

/// Mapping key accepted from a document: any scalar, kept in string form
struct MappingKey(String);

impl<'de> Deserialize<'de> for MappingKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MappingKeyVisitor).map(MappingKey)
    }
}

struct MappingKeyVisitor;

impl<'de> Visitor<'de> for MappingKeyVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key (string, number, bool or null)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok("null".to_owned())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(format!("{:?}", v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Mapping(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn parse_yaml(doc: &str) -> Snapshot {
        serde_yaml::from_str(doc).unwrap()
    }

    #[test]
    fn test_yaml_scalars_keep_their_kind() {
        let snapshot = parse_yaml(
            "name: service\nport: 8080\nratio: 0.5\nwhole: 3.0\nenabled: true\nmissing: ~\n",
        );

        assert_eq!(snapshot["name"], Value::from("service"));
        assert_eq!(snapshot["port"], Value::Integer(8080));
        assert_eq!(snapshot["ratio"], Value::Float(0.5));
        assert_eq!(snapshot["whole"], Value::Float(3.0));
        assert_eq!(snapshot["enabled"], Value::Bool(true));
        assert!(snapshot["missing"].is_null());
    }

    #[test]
    fn test_json_scalars_keep_their_kind() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"port": 8080, "ratio": 1.0, "tags": ["a", "b"]}"#).unwrap();

        assert_eq!(snapshot["port"].kind(), ValueKind::Integer);
        assert_eq!(snapshot["ratio"].kind(), ValueKind::Float);
        assert_eq!(snapshot["tags"].kind(), ValueKind::Sequence);
    }

    #[test]
    fn test_scalar_mapping_keys_become_strings() {
        let snapshot = parse_yaml("ports:\n  80: http\n  443: https\nflags:\n  true: on\n  1.5: ratio\n");

        let ports = snapshot["ports"].as_mapping().unwrap();
        assert_eq!(ports["80"], Value::from("http"));
        assert_eq!(ports["443"], Value::from("https"));

        let flags = snapshot["flags"].as_mapping().unwrap();
        assert_eq!(flags["true"], Value::from("on"));
        assert_eq!(flags["1.5"], Value::from("ratio"));
    }

    #[test]
    fn test_collection_mapping_keys_are_rejected() {
        let err = serde_yaml::from_str::<Snapshot>("outer:\n  ? [a, b]\n  : value\n").unwrap_err();
        assert!(err.to_string().contains("scalar mapping key"), "{}", err);
    }

    #[test]
    fn test_integer_beyond_i64_is_rejected() {
        let err = serde_yaml::from_str::<Snapshot>("big: 18446744073709551615\n").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);

        let snapshot = parse_yaml("max: 9223372036854775807\nmin: -9223372036854775808\n");
        assert_eq!(snapshot["max"], Value::Integer(i64::MAX));
        assert_eq!(snapshot["min"], Value::Integer(i64::MIN));
    }

    #[test]
    fn test_strict_numeric_views() {
        assert_eq!(Value::Integer(3).as_f64(), None);
        assert_eq!(Value::Float(3.0).as_i64(), None);
        assert_eq!(Value::from("3").as_i64(), None);
        assert_eq!(Value::Integer(3).as_i64(), Some(3));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
    }

    #[test]
    fn test_string_list_is_all_or_nothing() {
        let good = Value::from(vec!["a", "b"]);
        assert_eq!(good.as_string_list(), Some(vec!["a".to_string(), "b".to_string()]));

        let mixed = Value::Sequence(vec![Value::from("a"), Value::from("b"), Value::Integer(3)]);
        assert_eq!(mixed.as_string_list(), None);

        assert_eq!(Value::from("a").as_string_list(), None);
        assert_eq!(Value::Sequence(vec![]).as_string_list(), Some(vec![]));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        host: String,
        port: u16,
        replicas: Vec<String>,
    }

    #[test]
    fn test_decode_nested_mapping() {
        let snapshot = parse_yaml(
            "database:\n  host: db.internal\n  port: 5432\n  replicas: [r1, r2]\n",
        );

        let db: Database = snapshot["database"].decode().unwrap();
        assert_eq!(
            db,
            Database {
                host: "db.internal".into(),
                port: 5432,
                replicas: vec!["r1".into(), "r2".into()],
            }
        );
    }

    #[test]
    fn test_decode_shape_mismatch_fails() {
        let snapshot = parse_yaml("database: just-a-string\n");
        assert!(snapshot["database"].decode::<Database>().is_err());
    }
}
