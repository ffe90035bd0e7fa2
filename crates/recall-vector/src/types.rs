//! Common types for recall-vector.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Unique identifier for a vector in an index.
pub type VectorId = String;

/// Metadata associated with a vector.
///
/// Scalar key-value pairs stored alongside vectors. Keys are kept sorted so
/// formatted output is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    data: BTreeMap<String, MetadataValue>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metadata from a list of key-value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build metadata from a JSON object, dropping values that are not scalars.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: object
                .iter()
                .filter_map(|(k, v)| MetadataValue::from_json(v).map(|v| (k.clone(), v)))
                .collect(),
        }
    }

    /// Convert to a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Insert a key-value pair, replacing any previous value.
    pub fn insert<K: Into<String>, V: Into<MetadataValue>>(&mut self, key: K, value: V) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.data.get(key)
    }

    /// Get a string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.data.get(key)? {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn extend(&mut self, other: Metadata) {
        self.data.extend(other.data);
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.data.iter()
    }

    /// Check if metadata is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of metadata entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// A scalar metadata value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
}

impl MetadataValue {
    /// Convert a JSON scalar. Arrays, objects and null yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(MetadataValue::Int)
                .or_else(|| n.as_f64().map(MetadataValue::Float)),
            serde_json::Value::String(s) => Some(MetadataValue::String(s.clone())),
            _ => None,
        }
    }

    /// Convert to a JSON scalar.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetadataValue::Bool(b) => serde_json::Value::Bool(*b),
            MetadataValue::Int(i) => serde_json::Value::from(*i),
            MetadataValue::Float(f) => serde_json::Value::from(*f),
            MetadataValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Int(i) => Some(*i as f64),
            MetadataValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

// Integers and floats compare numerically so that values which made a JSON
// round trip through a remote backend still match.
impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MetadataValue::Bool(a), MetadataValue::Bool(b)) => a == b,
            (MetadataValue::String(a), MetadataValue::String(b)) => a == b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (MetadataValue::Bool(a), MetadataValue::Bool(b)) => a.partial_cmp(b),
            (MetadataValue::String(a), MetadataValue::String(b)) => a.partial_cmp(b),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Int(i)
    }
}

impl From<i32> for MetadataValue {
    fn from(i: i32) -> Self {
        MetadataValue::Int(i as i64)
    }
}

impl From<usize> for MetadataValue {
    fn from(i: usize) -> Self {
        MetadataValue::Int(i as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(f: f64) -> Self {
        MetadataValue::Float(f)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

/// A stored vector with its identifier and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// External string ID.
    pub id: VectorId,
    /// The vector data.
    pub vector: Vec<f32>,
    /// Metadata stored with the vector.
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorEntry {
    /// Create a new entry.
    pub fn new(id: impl Into<VectorId>, vector: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
        }
    }
}

/// A scored match returned by [`FlatIndex::search`](crate::FlatIndex::search).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    /// ID of the matched vector.
    pub id: VectorId,
    /// Similarity score (higher = more similar).
    pub score: f32,
    /// Metadata associated with the vector.
    pub metadata: Metadata,
}
