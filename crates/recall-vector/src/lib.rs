//! # recall-vector
//!
//! Exact, in-process vector search for small personal corpora.
//!
//! ## Features
//!
//! - **Exact ranking**: every query is scored against every stored vector
//! - **Thread-Safe**: one `parking_lot::RwLock` guards the store
//! - **Metadata filters**: equality, allow-list and range conditions
//! - **Cosine** similarity with NaN-tolerant scoring
//!
//! ## Quick Start
//!
//! ```rust
//! use recall_vector::{FlatIndex, Metadata, MetadataFilter, VectorEntry};
//!
//! let index = FlatIndex::default();
//! index
//!     .upsert(VectorEntry::new(
//!         "doc1",
//!         vec![1.0, 0.0, 0.0],
//!         Metadata::from_pairs([("category", "notes")]),
//!     ))
//!     .unwrap();
//!
//! let filter = MetadataFilter::from_pairs([("category", "notes")]);
//! let hits = index.search(&[1.0, 0.0, 0.0], 5, Some(&filter)).unwrap();
//! assert_eq!(hits[0].id, "doc1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod filter;
pub mod index;
pub mod types;

pub use distance::cosine_similarity;
pub use error::{Error, Result};
pub use filter::{FilterCondition, MetadataFilter};
pub use index::FlatIndex;
pub use types::{Metadata, MetadataValue, ScoredEntry, VectorEntry, VectorId};
