//! Shared utilities: dense indexing and the hybrid bit set.

pub mod hybrid_bitset;
pub mod indexer;

pub use hybrid_bitset::HybridBitSet;
pub use indexer::{Indexer, MapIndexer};
