//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and nearest-neighbour ranking used by the
//! in-memory store.

use ragchat_core::artifact::EmbeddingRecord;
use ragchat_core::store::QueryMatch;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length, empty, or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank records by cosine similarity to `query`, closest first.
///
/// `distance` on each match is the cosine distance (`1 - similarity`).
/// Ties keep insertion order.
pub fn nearest(records: &[EmbeddingRecord], query: &[f32], top_n: usize) -> Vec<QueryMatch> {
    let mut scored: Vec<(f32, &EmbeddingRecord)> = records
        .iter()
        .map(|r| (cosine_similarity(&r.embedding, query), r))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_n);
    scored
        .into_iter()
        .map(|(sim, r)| QueryMatch {
            id: r.id.clone(),
            metadata: Some(r.metadata.clone()),
            distance: Some(1.0 - sim),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::artifact::{ArtifactKind, RecordMetadata};

    fn record(id: &str, embedding: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            id: id.into(),
            embedding,
            metadata: RecordMetadata::new(ArtifactKind::Document),
        }
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // [1,1] · [1,0] = 1, |[1,1]| = sqrt(2), |[1,0]| = 1
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn nearest_ranks_closest_first() {
        let records = vec![
            record("a", vec![0.0, 1.0, 0.0]), // orthogonal
            record("b", vec![1.0, 0.0, 0.0]), // identical
            record("c", vec![0.5, 0.5, 0.0]), // ~0.707
        ];

        let hits = nearest(&records, &[1.0, 0.0, 0.0], 10);
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert!(hits[0].distance.unwrap().abs() < 1e-6);
    }

    #[test]
    fn nearest_respects_top_n() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("r{i}"), vec![1.0, i as f32 * 0.1]))
            .collect();
        assert_eq!(nearest(&records, &[1.0, 0.0], 3).len(), 3);
    }

    #[test]
    fn nearest_on_empty_is_empty() {
        assert!(nearest(&[], &[1.0], 3).is_empty());
    }
}
