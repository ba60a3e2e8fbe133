/*!
 * Pairwise cosine similarity over embedding vectors.
 */

/// Cosine similarity of two vectors in [-1, 1].
///
/// Zero-norm vectors and vectors of different length compare as 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    ((dot / (norm_a * norm_b)) as f64).clamp(-1.0, 1.0)
}

/// Symmetric similarity matrix with a unit diagonal.
///
/// Only the strict upper triangle is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    upper: Vec<f64>,
}

impl SimilarityMatrix {
    /// Compute the matrix for a set of embeddings
    pub fn from_embeddings(embeddings: &[Vec<f32>]) -> Self {
        let size = embeddings.len();
        let mut upper = Vec::with_capacity(size * size.saturating_sub(1) / 2);
        for i in 0..size {
            for j in (i + 1)..size {
                upper.push(cosine_similarity(&embeddings[i], &embeddings[j]));
            }
        }
        Self { size, upper }
    }

    /// Build from precomputed upper-triangle values in row-major order
    pub fn from_upper(size: usize, upper: Vec<f64>) -> Option<Self> {
        (upper.len() == size * size.saturating_sub(1) / 2).then_some(Self { size, upper })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Similarity between rows `i` and `j`; `None` when out of range
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.size || j >= self.size {
            return None;
        }
        if i == j {
            return Some(1.0);
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        Some(self.upper[self.offset(i) + (j - i - 1)])
    }

    /// Pairs `(i, j)` with `i < j` and similarity strictly above `threshold`,
    /// in row-major order.
    pub fn conflicting_pairs(&self, threshold: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        let mut values = self.upper.iter();
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if values.next().is_some_and(|&sim| sim > threshold) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Start of row `i` in the packed upper triangle
    fn offset(&self, i: usize) -> usize {
        i * (2 * self.size - i - 1) / 2
    }
}
