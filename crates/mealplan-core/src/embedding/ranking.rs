use uuid::Uuid;

use super::DistanceRanker;

/// Negative inner product distance, `-(a · b)`.
///
/// Matches the `<#>` operator of pgvector-style stores: for normalized
/// vectors it orders exactly like cosine distance. Ties keep corpus order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegativeInnerProduct;

impl NegativeInnerProduct {
    pub fn distance(a: &[f32], b: &[f32]) -> f32 {
        -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>()
    }
}

impl DistanceRanker for NegativeInnerProduct {
    fn rank_by_distance(&self, corpus: &[(Uuid, &[f32])], query: &[f32], top_k: usize) -> Vec<Uuid> {
        let mut scored: Vec<(f32, Uuid)> = corpus
            .iter()
            .filter(|(_, v)| v.len() == query.len())
            .map(|(id, v)| (Self::distance(v, query), *id))
            .collect();
        // Stable sort keeps corpus order on ties.
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.into_iter().take(top_k).map(|(_, id)| id).collect()
    }
}
