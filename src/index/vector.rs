use serde::{Deserialize, Serialize};

/// One fixed-length vector per chunk, ordered to match the chunk list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    pub dimension: usize,
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingMatrix {
    pub fn rows(&self) -> usize {
        self.vectors.len()
    }

    /// All rows present and of the declared dimension.
    pub fn is_consistent(&self) -> bool {
        self.dimension > 0 && self.vectors.iter().all(|v| v.len() == self.dimension)
    }
}

/// Flat inner-product similarity index over L2-normalized vectors.
///
/// Rows are pre-normalized at build time, so the inner product with a
/// normalized query is cosine similarity. Read-only after construction;
/// rebuilding replaces the whole index.
pub struct SimilarityIndex {
    matrix: EmbeddingMatrix,
}

impl SimilarityIndex {
    pub fn from_matrix(matrix: EmbeddingMatrix) -> Self {
        Self { matrix }
    }

    pub fn len(&self) -> usize {
        self.matrix.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.matrix.dimension
    }

    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    /// Top-k nearest rows by cosine similarity, descending score.
    ///
    /// `k` is clamped to the row count; a zero `k`, an empty index, or a
    /// dimension-mismatched query yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 || self.matrix.vectors.is_empty() || query.len() != self.matrix.dimension {
            return Vec::new();
        }

        let mut normalized = query.to_vec();
        l2_normalize(&mut normalized);

        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .vectors
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let dot: f32 = normalized.iter().zip(row.iter()).map(|(a, b)| a * b).sum();
                (i, dot)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k.min(self.matrix.vectors.len()));
        scored
    }
}

/// Scale a vector to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in v.iter_mut() {
            *val /= norm;
        }
    }
}
