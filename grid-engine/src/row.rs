//! FILENAME: grid-engine/src/row.rs
//! PURPOSE: Ordered, schemaless row records and the shared dataset handle.
//! CONTEXT: Rows are immutable once they enter the pipeline. They are passed
//! around as `RowRef` (an `Arc<Row>`) so that filtering and sorting only move
//! pointers and row identity survives every stage.

use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::Value;

/// Separator used by dotted field names ("customer.address.city").
pub const PATH_SEPARATOR: char = '.';

/// An ordered mapping from column name to value.
/// Keys keep their insertion order; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

/// Shared handle to an immutable row. Pointer identity is row identity.
pub type RowRef = Arc<Row>;

impl Row {
    pub fn new() -> Self {
        Row { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Row {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Builds a row from `(key, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }

    /// Sets a value, replacing the existing one for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Looks up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Nested-field accessor: reads `key`, then walks `path` through nested
    /// sub-objects. Returns `None` as soon as a step is missing or not an object.
    pub fn get_nested<S: AsRef<str>>(&self, key: &str, path: &[S]) -> Option<&Value> {
        let mut current = self.get(key)?;
        for segment in path {
            match current {
                Value::Nested(inner) => current = inner.get(segment.as_ref())?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Field lookup by column name. A literal key always wins; otherwise a
    /// dotted name is resolved through `get_nested`.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.get(name) {
            return Some(value);
        }
        let mut segments = name.split(PATH_SEPARATOR);
        let key = segments.next()?;
        let path: Vec<&str> = segments.collect();
        if path.is_empty() {
            return None;
        }
        self.get_nested(key, &path)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a row object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            row.insert(key, value);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// The base array handed to the pipeline. Cloning is cheap and keeps the
/// same identity; building a new dataset gives a new identity.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Arc<[RowRef]>,
}

impl Dataset {
    pub fn new(rows: Vec<RowRef>) -> Self {
        Dataset { rows: Arc::from(rows) }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Dataset::new(rows.into_iter().map(Arc::new).collect())
    }

    /// Parses a JSON array of row objects. `null` is treated as zero rows.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let rows: Option<Vec<Row>> = serde_json::from_str(json)?;
        Ok(Dataset::from_rows(rows.unwrap_or_default()))
    }

    pub fn rows(&self) -> &[RowRef] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Address of the shared row array; equal for clones of one dataset.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.rows) as *const RowRef as usize
    }

    pub fn same_as(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::new(Vec::new())
    }
}

impl From<Vec<Row>> for Dataset {
    fn from(rows: Vec<Row>) -> Self {
        Dataset::from_rows(rows)
    }
}
