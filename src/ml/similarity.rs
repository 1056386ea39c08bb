/// Cosine similarity of two vectors.
///
/// Returns 0 for zero vectors or when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Candidates scoring at least `threshold` against `query`, best first,
/// truncated to `limit`.
pub fn rank_by_similarity<'a, T, I>(
    query: &[f32],
    candidates: I,
    threshold: f32,
    limit: usize,
) -> Vec<(T, f32)>
where
    I: IntoIterator<Item = (T, &'a [f32])>,
{
    let mut scored: Vec<(T, f32)> = candidates
        .into_iter()
        .filter_map(|(item, vector)| {
            let score = cosine_similarity(query, vector);
            (score >= threshold).then_some((item, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}
