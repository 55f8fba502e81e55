//! Dynamic table record

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;

use super::Value;
use crate::error::FieldError;

/// A dynamic table record.
///
/// Records hold field values as a map from field name to [`Value`]. A record
/// becomes a tree node when one of its fields holds [`Value::Records`]; which
/// field that is depends on the table's configured children column, so the
/// record itself never assumes a name.
///
/// # Example
///
/// ```
/// use tableview_lib::model::Record;
///
/// let record = Record::new()
///     .set("id", 1)
///     .set("name", "Contoso")
///     .with_children("children", vec![Record::new().set("id", 2)]);
///
/// assert_eq!(record.get_string("name").unwrap(), Some("Contoso"));
/// assert_eq!(record.children("children").map(|c| c.len()), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// The field values.
    pub(crate) fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    pub(crate) fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
        }
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Follows a data path through nested records.
    ///
    /// `["address", "city"]` reads the `city` field of the record stored
    /// under `address`. An empty path yields `None`.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        self.lookup_path(path).ok()
    }

    /// Like [`get_path`](Self::get_path), but says where the walk stopped.
    pub fn lookup_path<S: AsRef<str>>(&self, path: &[S]) -> Result<&Value, FieldError> {
        let joined = || {
            path.iter()
                .map(|segment| segment.as_ref())
                .collect::<Vec<_>>()
                .join(".")
        };
        let Some((first, rest)) = path.split_first() else {
            return Err(FieldError::missing(""));
        };
        let mut segment = first.as_ref();
        let mut current = self
            .fields
            .get(segment)
            .ok_or_else(|| FieldError::missing(joined()))?;
        for next in rest {
            current = match current {
                Value::Record(inner) => inner
                    .fields
                    .get(next.as_ref())
                    .ok_or_else(|| FieldError::missing(joined()))?,
                other => return Err(FieldError::not_nested(joined(), segment, other.type_name())),
            };
            segment = next.as_ref();
        }
        Ok(current)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // =========================================================================
    // Tree relation
    // =========================================================================

    /// Returns the child records stored under `field`.
    ///
    /// `None` means the record is a leaf; `Some(&[])` means the field is
    /// present but holds no children.
    pub fn children(&self, field: &str) -> Option<&[Record]> {
        match self.fields.get(field) {
            Some(Value::Records(children)) => Some(children.as_slice()),
            _ => None,
        }
    }

    /// Returns `true` if the record has at least one child under `field`.
    pub fn has_children(&self, field: &str) -> bool {
        self.children(field).is_some_and(|children| !children.is_empty())
    }

    /// Sets the children under `field` (builder pattern).
    pub fn with_children(mut self, field: impl Into<String>, children: Vec<Record>) -> Self {
        self.fields.insert(field.into(), Value::Records(children));
        self
    }

    /// Returns a copy of this record whose children under `field` are
    /// replaced. The original record is left untouched.
    pub fn replace_children(&self, field: &str, children: Vec<Record>) -> Record {
        let mut copy = self.clone();
        copy.fields.insert(field.to_string(), Value::Records(children));
        copy
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is Value::Null.
    // =========================================================================

    /// Gets a string field value.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "string",
                other.type_name(),
            )),
        }
    }

    /// Gets a boolean field value.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", other.type_name())),
        }
    }

    /// Gets an i64 field value.
    pub fn get_long(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Long(n)) => Ok(Some(*n)),
            Some(Value::Int(n)) => Ok(Some(i64::from(*n))), // Allow widening
            Some(other) => Err(FieldError::type_mismatch(field, "long", other.type_name())),
        }
    }

    /// Gets an f64 field value.
    pub fn get_float(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Float(n)) => Ok(Some(*n)),
            Some(other) => Err(FieldError::type_mismatch(field, "float", other.type_name())),
        }
    }

    /// Gets a DateTime field value.
    pub fn get_datetime(&self, field: &str) -> Result<Option<DateTime<Utc>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::DateTime(dt)) => Ok(Some(*dt)),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "datetime",
                other.type_name(),
            )),
        }
    }

    /// Gets a collection of child records.
    pub fn get_records(&self, field: &str) -> Result<Option<&Vec<Record>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Records(r)) => Ok(Some(r)),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "records",
                other.type_name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_path_walks_nested_records() {
        let record = Record::new().set("address", Record::new().set("city", "Ghent"));
        assert_eq!(
            record.get_path(&["address", "city"]),
            Some(&Value::from("Ghent"))
        );
        assert_eq!(record.get_path(&["address", "zip"]), None);
        assert_eq!(record.get_path::<&str>(&[]), None);
    }

    #[test]
    fn test_lookup_path_reports_where_it_stopped() {
        let record = Record::new()
            .set("name", "Ada")
            .set("address", Record::new().set("city", "Ghent"));

        assert_eq!(
            record.lookup_path(&["address", "zip"]),
            Err(FieldError::missing("address.zip"))
        );
        assert_eq!(
            record.lookup_path(&["name", "first"]),
            Err(FieldError::not_nested("name.first", "name", "string"))
        );
    }

    #[test]
    fn test_replace_children_leaves_original() {
        let original = Record::new()
            .set("id", 1)
            .with_children("children", vec![Record::new().set("id", 2)]);
        let replaced = original.replace_children("children", Vec::new());

        assert_eq!(original.children("children").map(|c| c.len()), Some(1));
        assert_eq!(replaced.children("children").map(|c| c.len()), Some(0));
        assert!(!replaced.has_children("children"));
    }

    #[test]
    fn test_typed_getter_errors() {
        let record = Record::new().set("age", 30).set("gone", Value::Null);
        assert_eq!(record.get_long("age").unwrap(), Some(30));
        assert_eq!(record.get_long("gone").unwrap(), None);
        assert!(matches!(
            record.get_string("age"),
            Err(FieldError::TypeMismatch { .. })
        ));
        assert!(matches!(
            record.get_string("missing"),
            Err(FieldError::Missing { .. })
        ));
    }
}
