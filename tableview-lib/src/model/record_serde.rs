//! Custom serialization for Record.
//!
//! Records travel as flat JSON objects:
//! - Scalar fields serialize as their JSON equivalents
//! - Child rows (`Value::Records`) serialize as arrays of objects
//! - Nested records serialize as objects
//!
//! Deserialization is the inverse, with the string sniffing of
//! [`Value`]: UUID strings become `Guid`, RFC 3339 strings become `DateTime`.

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;

use super::Record;
use super::Value;

// =============================================================================
// Serialization
// =============================================================================

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Deserialization
// =============================================================================

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map representing a table record")
    }

    fn visit_map<M>(self, mut map: M) -> Result<Record, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut record = Record::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: Value = map.next_value()?;
            record.fields.insert(key, value);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_simple_fields() {
        let record = Record::new().set("name", "Contoso").set("age", 30);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"name\":\"Contoso\""));
        assert!(json.contains("\"age\":30"));
    }

    #[test]
    fn test_serialize_children_as_array() {
        let record = Record::new()
            .set("id", 1)
            .with_children("children", vec![Record::new().set("id", 2)]);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"children":[{"id":2}],"id":1}"#);
    }

    #[test]
    fn test_deserialize_tree() {
        let json = r#"{"id": 1, "children": [{"id": 2, "children": [{"id": 3}]}]}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        let children = record.children("children").unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].get_long("id").unwrap(), Some(2));
        let grandchildren = children[0].children("children").unwrap();
        assert_eq!(grandchildren[0].get_long("id").unwrap(), Some(3));
    }

    #[test]
    fn test_deserialize_sniffs_datetime() {
        let json = r#"{"created": "2024-03-01T10:00:00Z", "note": "plain"}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert!(record.get_datetime("created").unwrap().is_some());
        assert_eq!(record.get_string("note").unwrap(), Some("plain"));
    }
}
