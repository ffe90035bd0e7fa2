//! Linear-scan vector index.
//!
//! Entries are kept in insertion order in a flat `Vec`. Every search scores
//! the query against every stored vector, so cost is O(n·d). That is plenty
//! for development corpora and gives exact (not approximate) rankings.

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::distance::cosine_similarity;
use crate::error::{Error, Result};
use crate::filter::MetadataFilter;
use crate::types::{ScoredEntry, VectorEntry};

/// Flat, exact nearest-neighbour index.
///
/// # Thread Safety
///
/// All state sits behind a single `parking_lot::RwLock`, so concurrent
/// upserts of the same id cannot both append.
pub struct FlatIndex {
    inner: RwLock<FlatInner>,
}

#[derive(Default)]
struct FlatInner {
    /// Fixed by the first inserted vector unless configured up front.
    dimensions: Option<usize>,
    entries: Vec<VectorEntry>,
}

impl FlatIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(FlatInner::default()),
        }
    }

    /// Create an empty index that only accepts vectors of `dimensions` length.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            inner: RwLock::new(FlatInner {
                dimensions: Some(dimensions),
                entries: Vec::new(),
            }),
        }
    }

    /// Dimensionality of stored vectors, if known yet.
    pub fn dimensions(&self) -> Option<usize> {
        self.inner.read().dimensions
    }

    /// Insert an entry, replacing any existing entry with the same id in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector is empty, contains infinities, or its
    /// length differs from the index dimensionality.
    pub fn upsert(&self, entry: VectorEntry) -> Result<()> {
        let mut inner = self.inner.write();
        Self::upsert_locked(&mut inner, entry)
    }

    /// Upsert several entries under one lock. Stops at the first invalid entry;
    /// entries before it stay inserted.
    pub fn upsert_batch<I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = VectorEntry>,
    {
        let mut inner = self.inner.write();
        let mut count = 0;
        for entry in entries {
            Self::upsert_locked(&mut inner, entry)?;
            count += 1;
        }
        debug!(count, "Upserted batch");
        Ok(count)
    }

    fn upsert_locked(inner: &mut FlatInner, entry: VectorEntry) -> Result<()> {
        if entry.vector.is_empty() {
            return Err(Error::EmptyVector(entry.id));
        }
        if entry.vector.iter().any(|v| v.is_infinite()) {
            return Err(Error::InvalidVector(format!(
                "vector '{}' contains infinite components",
                entry.id
            )));
        }
        match inner.dimensions {
            Some(expected) if expected != entry.vector.len() => {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: entry.vector.len(),
                });
            }
            Some(_) => {}
            None => inner.dimensions = Some(entry.vector.len()),
        }

        match inner.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => {
                trace!(id = %entry.id, "Replacing existing entry");
                *existing = entry;
            }
            None => inner.entries.push(entry),
        }
        Ok(())
    }

    /// Remove entries by id. Returns how many were removed.
    pub fn delete(&self, ids: &[String]) -> usize {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|e| !ids.contains(&e.id));
        before - inner.entries.len()
    }

    /// Remove every entry whose metadata satisfies `filter`. Returns how many
    /// were removed.
    pub fn delete_matching(&self, filter: &MetadataFilter) -> usize {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|e| !filter.matches(&e.metadata));
        before - inner.entries.len()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<VectorEntry> {
        self.inner.read().entries.iter().find(|e| e.id == id).cloned()
    }

    /// Score every entry against `query`, keep those passing `filter`, and
    /// return the best `top_k` by descending score. Ties keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the query length differs from
    /// the stored vectors.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredEntry>> {
        let inner = self.inner.read();

        if let Some(expected) = inner.dimensions {
            if expected != query.len() && !inner.entries.is_empty() {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut results = Vec::new();
        for entry in &inner.entries {
            if let Some(filter) = filter {
                if !filter.matches(&entry.metadata) {
                    continue;
                }
            }
            let score = cosine_similarity(query, &entry.vector)?;
            results.push(ScoredEntry {
                id: entry.id.clone(),
                score,
                metadata: entry.metadata.clone(),
            });
        }

        // Stable sort: equal scores keep insertion order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        debug!(
            scanned = inner.entries.len(),
            returned = results.len(),
            "Linear scan complete"
        );
        Ok(results)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Remove every entry. With `keep_dimensions` false the next insert fixes
    /// the dimensionality again.
    pub fn clear(&self, keep_dimensions: bool) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        if !keep_dimensions {
            inner.dimensions = None;
        }
    }
}

impl Default for FlatIndex {
    fn default() -> Self {
        Self::new()
    }
}
