//! fwdlens - A Rust library for building forward indexes for text search.
//!
//! The builder turns a stream of heterogeneous document records into a
//! compact integer-keyed forward index on disk:
//! - **Parallel ingestion**: records are grouped into batches and indexed
//!   by a pool of workers behind a bounded backpressure gate, so memory
//!   stays bounded no matter how large the collection is.
//! - **External term merge**: per-batch term dictionaries are unified into
//!   one lexicographically sorted global dictionary with a balanced
//!   two-way span merge.
//! - **Remap and concatenate**: batch-local term ids are rewritten in
//!   place to global ids and the batches are stitched into one index file
//!   with `.documents`, `.urls`, and `.terms` sidecars.
//!
//! Record parsing, content splitting, and term normalization are
//! caller-supplied callbacks; plaintext and HTML splitters ship with the
//! crate.

pub mod batch;
pub mod builder;
pub mod content;
pub mod error;
pub mod format;
pub mod record;
pub mod terms;
pub mod types;

// Re-export commonly used types
pub use batch::{batch_file, BatchProcess};
pub use builder::ForwardIndexBuilder;
pub use content::{split_html, split_plaintext, ContentFormat};
pub use error::{Error, Result};
pub use format::IndexReader;
pub use record::read_plaintext_record;
pub use types::{DocId, DocumentRecord, TermId};
