//! Row identity: key derivation and the lazy key index.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::model::Record;
use crate::model::Value;

/// Identity of a record within its visible scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    /// Numeric key.
    Number(i64),
    /// Textual key.
    Text(String),
}

impl RowKey {
    /// Derives a key from a field value.
    ///
    /// Integral numbers become [`RowKey::Number`], strings and GUIDs become
    /// [`RowKey::Text`]. Null and structured values yield `None`.
    pub fn from_value(value: &Value) -> Option<RowKey> {
        match value {
            Value::Int(n) => Some(RowKey::Number(i64::from(*n))),
            Value::Long(n) => Some(RowKey::Number(*n)),
            Value::Float(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(RowKey::Number(*n as i64))
            }
            Value::Float(_) | Value::Decimal(_) | Value::Bool(_) | Value::DateTime(_) => {
                Some(RowKey::Text(value.key_string()))
            }
            Value::String(s) => Some(RowKey::Text(s.clone())),
            Value::Guid(g) => Some(RowKey::Text(g.to_string())),
            Value::Null | Value::Record(_) | Value::Records(_) | Value::Json(_) => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Number(n) => write!(f, "{}", n),
            RowKey::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for RowKey {
    fn from(v: i64) -> Self {
        RowKey::Number(v)
    }
}

impl From<i32> for RowKey {
    fn from(v: i32) -> Self {
        RowKey::Number(i64::from(v))
    }
}

impl From<&str> for RowKey {
    fn from(v: &str) -> Self {
        RowKey::Text(v.to_string())
    }
}

impl From<String> for RowKey {
    fn from(v: String) -> Self {
        RowKey::Text(v)
    }
}

/// Key function of a record alone.
pub type KeyFn = Arc<dyn Fn(&Record) -> RowKey + Send + Sync>;

/// Key function that also reads the record's sibling index.
pub type IndexedKeyFn = Arc<dyn Fn(&Record, usize) -> RowKey + Send + Sync>;

/// How a record's [`RowKey`] is derived.
#[derive(Clone)]
pub enum RowKeyStrategy {
    /// Read the key from a field.
    Field(String),
    /// Compute the key from the record.
    Func(KeyFn),
    /// Compute the key from the record and its sibling index.
    ///
    /// Indexes shift under sorting, filtering and nesting, so keys derived
    /// this way are unreliable; using it raises
    /// [`Diagnostic::IndexedRowKey`].
    Indexed(IndexedKeyFn),
}

impl RowKeyStrategy {
    /// Reads the key from `field`.
    pub fn field(name: impl Into<String>) -> Self {
        RowKeyStrategy::Field(name.into())
    }

    /// Computes the key with `f`.
    pub fn func(f: impl Fn(&Record) -> RowKey + Send + Sync + 'static) -> Self {
        RowKeyStrategy::Func(Arc::new(f))
    }

    /// Computes the key with `f`, which also receives the sibling index.
    pub fn indexed(f: impl Fn(&Record, usize) -> RowKey + Send + Sync + 'static) -> Self {
        RowKeyStrategy::Indexed(Arc::new(f))
    }

    /// Returns `true` if keys depend on positional context.
    pub fn needs_index(&self) -> bool {
        matches!(self, RowKeyStrategy::Indexed(_))
    }

    /// Derives the key, or `None` when the key field is missing or null.
    pub fn key_of(&self, record: &Record, index: usize) -> Option<RowKey> {
        match self {
            RowKeyStrategy::Field(name) => record.get(name).and_then(RowKey::from_value),
            RowKeyStrategy::Func(f) => Some(f(record)),
            RowKeyStrategy::Indexed(f) => Some(f(record, index)),
        }
    }
}

impl Default for RowKeyStrategy {
    fn default() -> Self {
        RowKeyStrategy::Field("key".to_string())
    }
}

impl fmt::Debug for RowKeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKeyStrategy::Field(name) => f.debug_tuple("Field").field(name).finish(),
            RowKeyStrategy::Func(_) => f.write_str("Func(..)"),
            RowKeyStrategy::Indexed(_) => f.write_str("Indexed(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for RowKeyStrategy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(RowKeyStrategy::Field)
    }
}

/// Location of an indexed record: sibling indexes from the root down.
type RowPath = Vec<usize>;

#[derive(Debug, Default)]
struct KeyIndex {
    paths: HashMap<RowKey, RowPath>,
    diagnostics: Vec<Diagnostic>,
}

/// Resolves keys for a dataset and looks records up by key.
///
/// The key → record index covers every record reachable through the
/// children field. It is built on the first lookup and reused until the
/// resolver is replaced; a new dataset or key strategy means a new resolver.
pub struct RowKeyResolver {
    data: Arc<Vec<Record>>,
    strategy: RowKeyStrategy,
    children_field: String,
    warnings: Vec<Diagnostic>,
    index: OnceCell<KeyIndex>,
}

impl RowKeyResolver {
    /// Creates a resolver over `data`.
    pub fn new(
        data: Arc<Vec<Record>>,
        strategy: RowKeyStrategy,
        children_field: impl Into<String>,
    ) -> Self {
        let mut warnings = Vec::new();
        if strategy.needs_index() {
            let diagnostic = Diagnostic::IndexedRowKey;
            log::warn!("{}", diagnostic);
            warnings.push(diagnostic);
        }
        Self {
            data,
            strategy,
            children_field: children_field.into(),
            warnings,
            index: OnceCell::new(),
        }
    }

    /// Returns the root records.
    pub fn data(&self) -> &[Record] {
        &self.data
    }

    /// Returns a shared handle to the root records.
    pub fn data_arc(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.data)
    }

    /// Returns the key strategy.
    pub fn strategy(&self) -> &RowKeyStrategy {
        &self.strategy
    }

    /// Returns the children field name.
    pub fn children_field(&self) -> &str {
        &self.children_field
    }

    /// Returns the key of `record` at sibling position `index`.
    ///
    /// Records without a usable key fall back to their index.
    pub fn row_key(&self, record: &Record, index: usize) -> RowKey {
        self.strategy
            .key_of(record, index)
            .unwrap_or(RowKey::Number(index as i64))
    }

    /// Looks a record up by key anywhere in the tree.
    pub fn get(&self, key: &RowKey) -> Option<&Record> {
        let path = self.index().paths.get(key)?;
        self.record_at(path)
    }

    /// Returns `true` if a record with `key` exists.
    pub fn contains(&self, key: &RowKey) -> bool {
        self.index().paths.contains_key(key)
    }

    /// Returns `true` once the key index has been built.
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.index().paths.len()
    }

    /// Returns `true` if no record is indexed.
    pub fn is_empty(&self) -> bool {
        self.index().paths.is_empty()
    }

    /// Keys of the ancestors of `key`, root first.
    pub fn ancestors(&self, key: &RowKey) -> Vec<RowKey> {
        let Some(path) = self.index().paths.get(key) else {
            return Vec::new();
        };
        let mut ancestors = Vec::with_capacity(path.len().saturating_sub(1));
        let mut level: &[Record] = &self.data;
        for &position in path.iter().take(path.len().saturating_sub(1)) {
            let Some(record) = level.get(position) else {
                break;
            };
            ancestors.push(self.row_key(record, position));
            level = record.children(&self.children_field).unwrap_or(&[]);
        }
        ancestors
    }

    /// Depth-first list of `(key, record)` over `records` and their children.
    pub fn flatten<'r>(&self, records: &'r [Record]) -> Vec<(RowKey, &'r Record)> {
        let mut out = Vec::new();
        self.flatten_into(records, &mut out);
        out
    }

    /// Depth-first list of keys over `records` and their children.
    pub fn flatten_keys(&self, records: &[Record]) -> Vec<RowKey> {
        self.flatten(records).into_iter().map(|(key, _)| key).collect()
    }

    /// Keys of every descendant of `record`, depth first.
    pub fn descendant_keys(&self, record: &Record) -> Vec<RowKey> {
        record
            .children(&self.children_field)
            .map(|children| self.flatten_keys(children))
            .unwrap_or_default()
    }

    /// Warnings raised so far, including those from building the index.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = self.warnings.clone();
        if let Some(index) = self.index.get() {
            all.extend(index.diagnostics.iter().cloned());
        }
        all
    }

    fn flatten_into<'r>(&self, records: &'r [Record], out: &mut Vec<(RowKey, &'r Record)>) {
        for (position, record) in records.iter().enumerate() {
            out.push((self.row_key(record, position), record));
            if let Some(children) = record.children(&self.children_field) {
                self.flatten_into(children, out);
            }
        }
    }

    fn record_at(&self, path: &[usize]) -> Option<&Record> {
        let (first, rest) = path.split_first()?;
        let mut record = self.data.get(*first)?;
        for &position in rest {
            record = record.children(&self.children_field)?.get(position)?;
        }
        Some(record)
    }

    fn index(&self) -> &KeyIndex {
        self.index.get_or_init(|| self.build_index())
    }

    fn build_index(&self) -> KeyIndex {
        log::trace!("building row key index over {} root records", self.data.len());
        let mut index = KeyIndex::default();
        let mut missing = 0usize;
        let mut path = Vec::new();
        self.index_level(&self.data, &mut path, &mut index, &mut missing);

        if missing > 0
            && let RowKeyStrategy::Field(field) = &self.strategy
        {
            let diagnostic = Diagnostic::MissingRowKey {
                field: field.clone(),
                count: missing,
            };
            log::warn!("{}", diagnostic);
            index.diagnostics.push(diagnostic);
        }
        index
    }

    fn index_level(
        &self,
        records: &[Record],
        path: &mut RowPath,
        index: &mut KeyIndex,
        missing: &mut usize,
    ) {
        for (position, record) in records.iter().enumerate() {
            let key = match self.strategy.key_of(record, position) {
                Some(key) => key,
                None => {
                    *missing += 1;
                    RowKey::Number(position as i64)
                }
            };

            path.push(position);
            if index.paths.contains_key(&key) {
                let diagnostic = Diagnostic::DuplicateRowKey { key };
                if !index.diagnostics.contains(&diagnostic) {
                    log::warn!("{}", diagnostic);
                    index.diagnostics.push(diagnostic);
                }
            } else {
                index.paths.insert(key, path.clone());
            }
            if let Some(children) = record.children(&self.children_field) {
                self.index_level(children, path, index, missing);
            }
            path.pop();
        }
    }
}

impl fmt::Debug for RowKeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowKeyResolver")
            .field("records", &self.data.len())
            .field("strategy", &self.strategy)
            .field("children_field", &self.children_field)
            .field("indexed", &self.is_indexed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Arc<Vec<Record>> {
        Arc::new(vec![
            Record::new().set("id", 1).with_children(
                "children",
                vec![
                    Record::new()
                        .set("id", 11)
                        .with_children("children", vec![Record::new().set("id", 111)]),
                    Record::new().set("id", 12),
                ],
            ),
            Record::new().set("id", 2),
        ])
    }

    #[test]
    fn test_index_is_lazy() {
        let resolver = RowKeyResolver::new(tree(), RowKeyStrategy::field("id"), "children");
        assert!(!resolver.is_indexed());

        assert!(resolver.get(&RowKey::from(111)).is_some());
        assert!(resolver.is_indexed());
        assert_eq!(resolver.len(), 5);
    }

    #[test]
    fn test_lookup_reaches_nested_children() {
        let resolver = RowKeyResolver::new(tree(), RowKeyStrategy::field("id"), "children");
        let record = resolver.get(&RowKey::from(12)).unwrap();
        assert_eq!(record.get_long("id").unwrap(), Some(12));
        assert!(resolver.get(&RowKey::from(99)).is_none());
    }

    #[test]
    fn test_ancestors_root_first() {
        let resolver = RowKeyResolver::new(tree(), RowKeyStrategy::field("id"), "children");
        assert_eq!(
            resolver.ancestors(&RowKey::from(111)),
            vec![RowKey::from(1), RowKey::from(11)]
        );
        assert!(resolver.ancestors(&RowKey::from(2)).is_empty());
    }

    #[test]
    fn test_children_field_is_configurable() {
        let data = Arc::new(vec![
            Record::new()
                .set("id", 1)
                .with_children("items", vec![Record::new().set("id", 2)]),
        ]);
        let resolver = RowKeyResolver::new(Arc::clone(&data), RowKeyStrategy::field("id"), "items");
        assert!(resolver.contains(&RowKey::from(2)));

        let other = RowKeyResolver::new(data, RowKeyStrategy::field("id"), "children");
        assert!(!other.contains(&RowKey::from(2)));
    }

    #[test]
    fn test_missing_key_falls_back_to_index() {
        let data = Arc::new(vec![Record::new().set("name", "a"), Record::new().set("name", "b")]);
        let resolver = RowKeyResolver::new(data, RowKeyStrategy::field("id"), "children");
        assert_eq!(resolver.row_key(&resolver.data()[1], 1), RowKey::Number(1));
        assert!(resolver.contains(&RowKey::Number(0)));
        assert!(
            resolver
                .diagnostics()
                .contains(&Diagnostic::MissingRowKey {
                    field: "id".to_string(),
                    count: 2
                })
        );
    }

    #[test]
    fn test_indexed_strategy_warns() {
        let resolver = RowKeyResolver::new(
            tree(),
            RowKeyStrategy::indexed(|_, index| RowKey::Number(index as i64)),
            "children",
        );
        assert_eq!(resolver.diagnostics(), vec![Diagnostic::IndexedRowKey]);
    }

    #[test]
    fn test_duplicate_key_first_wins() {
        let data = Arc::new(vec![
            Record::new().set("id", 1).set("name", "first"),
            Record::new().set("id", 1).set("name", "second"),
        ]);
        let resolver = RowKeyResolver::new(data, RowKeyStrategy::field("id"), "children");
        let record = resolver.get(&RowKey::from(1)).unwrap();
        assert_eq!(record.get_string("name").unwrap(), Some("first"));
        assert!(resolver.diagnostics().contains(&Diagnostic::DuplicateRowKey {
            key: RowKey::from(1)
        }));
    }

    #[test]
    fn test_flatten_keys_depth_first() {
        let resolver = RowKeyResolver::new(tree(), RowKeyStrategy::field("id"), "children");
        let keys = resolver.flatten_keys(resolver.data());
        assert_eq!(
            keys,
            vec![
                RowKey::from(1),
                RowKey::from(11),
                RowKey::from(111),
                RowKey::from(12),
                RowKey::from(2)
            ]
        );
    }
}
