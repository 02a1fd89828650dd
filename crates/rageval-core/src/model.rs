//! Core data model types for rageval.
//!
//! Ground truth ("qrels") and predictions ("runs") arrive either as keyed
//! mappings or as tables with named columns. Both keep the order their
//! entries were written in, so score records come out in a reproducible
//! order.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::measure::Measure;

/// Opaque identifier of a question.
pub type QueryId = String;

/// Ground truth keyed by query id.
pub type Qrels = AnswerMap<GoldAnswer>;

/// Predictions keyed by query id.
pub type Run = AnswerMap<String>;

/// One or more acceptable reference answers for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GoldAnswer {
    Single(String),
    Multiple(Vec<String>),
}

impl GoldAnswer {
    /// Number of reference answers.
    pub fn len(&self) -> usize {
        match self {
            GoldAnswer::Single(_) => 1,
            GoldAnswer::Multiple(answers) => answers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first reference answer, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            GoldAnswer::Single(answer) => Some(answer),
            GoldAnswer::Multiple(answers) => answers.first().map(String::as_str),
        }
    }
}

impl From<&str> for GoldAnswer {
    fn from(answer: &str) -> Self {
        GoldAnswer::Single(answer.to_string())
    }
}

impl From<String> for GoldAnswer {
    fn from(answer: String) -> Self {
        GoldAnswer::Single(answer)
    }
}

impl From<Vec<String>> for GoldAnswer {
    fn from(answers: Vec<String>) -> Self {
        GoldAnswer::Multiple(answers)
    }
}

impl<const N: usize> From<[&str; N]> for GoldAnswer {
    fn from(answers: [&str; N]) -> Self {
        GoldAnswer::Multiple(answers.iter().map(|a| a.to_string()).collect())
    }
}

// ---------------------------------------------------------------------------
// Ordered keyed mapping
// ---------------------------------------------------------------------------

/// A mapping from query id to a value that iterates in insertion order.
///
/// Re-inserting an existing key replaces its value but keeps its original
/// position.
#[derive(Clone, PartialEq)]
pub struct AnswerMap<V> {
    entries: Vec<(QueryId, V)>,
    index: HashMap<QueryId, usize>,
}

impl<V> AnswerMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a value, returning the previous value for the key if present.
    pub fn insert(&mut self, query_id: impl Into<QueryId>, value: V) -> Option<V> {
        let query_id = query_id.into();
        match self.index.get(&query_id) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(query_id.clone(), self.entries.len());
                self.entries.push((query_id, value));
                None
            }
        }
    }

    pub fn get(&self, query_id: &str) -> Option<&V> {
        self.index.get(query_id).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_mut(&mut self, query_id: &str) -> Option<&mut V> {
        match self.index.get(query_id) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    pub fn contains_key(&self, query_id: &str) -> bool {
        self.index.contains_key(query_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QueryId, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &QueryId> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> Default for AnswerMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for AnswerMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<QueryId>, V> FromIterator<(K, V)> for AnswerMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = AnswerMap::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V> IntoIterator for AnswerMap<V> {
    type Item = (QueryId, V);
    type IntoIter = std::vec::IntoIter<(QueryId, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for AnswerMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for AnswerMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnswerMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for AnswerMapVisitor<V> {
            type Value = AnswerMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from query id to answer")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = AnswerMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<QueryId, V>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(AnswerMapVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// Tabular input
// ---------------------------------------------------------------------------

/// A record set with named columns, the tabular counterpart of [`AnswerMap`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl Table {
    /// Build a table from records. Columns are collected in first-seen order.
    pub fn from_records(rows: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Build a table column by column. Shorter columns leave trailing cells
    /// empty.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut rows: Vec<Map<String, Value>> = Vec::new();
        for (name, values) in columns {
            let name = name.into();
            for (i, value) in values.into_iter().enumerate() {
                if rows.len() <= i {
                    rows.resize_with(i + 1, Map::new);
                }
                rows[i].insert(name.clone(), value);
            }
            names.push(name);
        }
        Self {
            columns: names,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ground truth or predictions in either accepted shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<V> {
    Mapping(AnswerMap<V>),
    Table(Table),
}

impl<V> From<AnswerMap<V>> for Input<V> {
    fn from(map: AnswerMap<V>) -> Self {
        Input::Mapping(map)
    }
}

impl<V> From<Table> for Input<V> {
    fn from(table: Table) -> Self {
        Input::Table(table)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The score of one measure for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub query_id: QueryId,
    pub measure: Measure,
    pub value: f64,
}

impl fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{:.4}", self.query_id, self.measure, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_map_keeps_insertion_order() {
        let mut map = AnswerMap::new();
        map.insert("q2", 2);
        map.insert("q1", 1);
        map.insert("q3", 3);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["q2", "q1", "q3"]);
    }

    #[test]
    fn answer_map_reinsert_keeps_position() {
        let mut map: AnswerMap<&str> = [("a", "x"), ("b", "y")].into_iter().collect();
        assert_eq!(map.insert("a", "z"), Some("x"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().next(), Some((&"a".to_string(), &"z")));
    }

    #[test]
    fn answer_map_deserializes_in_document_order() {
        let map: AnswerMap<GoldAnswer> =
            serde_json::from_str(r#"{"z": "last", "a": ["one", "two"]}"#).unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(map.get("a"), Some(&GoldAnswer::from(["one", "two"])));
    }

    #[test]
    fn gold_answer_untagged_shapes() {
        let single: GoldAnswer = serde_json::from_value(json!("Glasgow")).unwrap();
        let multi: GoldAnswer = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(single.first(), Some("Glasgow"));
        assert_eq!(multi.len(), 2);
        assert!(serde_json::from_value::<GoldAnswer>(json!(42)).is_err());
    }

    #[test]
    fn table_from_records_collects_columns() {
        let table = Table::from_records(vec![
            json!({"qid": "q1"}).as_object().unwrap().clone(),
            json!({"qid": "q2", "gold_answer": "x"}).as_object().unwrap().clone(),
        ]);
        assert_eq!(table.columns(), &["qid".to_string(), "gold_answer".to_string()]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn table_from_columns_builds_rows() {
        let table = Table::from_columns(vec![
            ("qid", vec![json!("q1"), json!("q2")]),
            ("pred_answer", vec![json!("a")]),
        ]);
        assert_eq!(table.len(), 2);
        assert!(table.has_column("pred_answer"));
        assert!(table.rows()[1].get("pred_answer").is_none());
    }
}
