//! Embedding and vector-ranking collaborators.
//!
//! The recommendation path only needs two capabilities: turning text into a
//! vector ([`Embedder`]) and ordering a corpus of vectors by distance to a
//! query ([`DistanceRanker`]). Both are object-safe so the HTTP layer can hold
//! them as `Arc<dyn ...>`.

mod hashing;
mod ranking;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use hashing::HashingEmbedder;
pub use ranking::NegativeInnerProduct;

/// Turns free text into a fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Human-readable name (e.g. "hashing-384").
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Orders corpus vectors by ascending distance to a query vector.
pub trait DistanceRanker: Send + Sync {
    /// Return at most `top_k` corpus ids, closest first.
    ///
    /// Entries whose dimension differs from `query` are skipped.
    fn rank_by_distance(&self, corpus: &[(Uuid, &[f32])], query: &[f32], top_k: usize) -> Vec<Uuid>;
}

// Compile-time assertion: both collaborators are usable as trait objects.
const _: () = {
    fn _assert_object_safe(_: &dyn Embedder, _: &dyn DistanceRanker) {}
};
