//! Core type definitions shared by trainers, predictors, and the model record

/// Sparse feature vector with sorted indices
///
/// This is the element type a model record borrows from the training set (or
/// owns after deserialization). Kernel evaluation over these vectors belongs
/// to the prediction collaborator, not to this crate.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate over (index, value) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation_sorts_indices() {
        let sv = SparseVector::new(vec![2, 0, 4], vec![2.0, 1.0, 3.0]);

        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sparse_vector_get() {
        let sv = SparseVector::new(vec![1, 3, 5], vec![1.0, 2.0, 3.0]);

        assert_eq!(sv.get(0), 0.0);
        assert_eq!(sv.get(1), 1.0);
        assert_eq!(sv.get(3), 2.0);
        assert_eq!(sv.get(5), 3.0);
        assert_eq!(sv.get(6), 0.0);
    }

    #[test]
    fn test_sparse_vector_norm() {
        let sv = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        assert_eq!(sv.norm_squared(), 25.0);
        assert_eq!(sv.norm(), 5.0);
    }

    #[test]
    fn test_sparse_vector_iter() {
        let sv = SparseVector::new(vec![3, 1], vec![30.0, 10.0]);
        let pairs: Vec<_> = sv.iter().collect();
        assert_eq!(pairs, vec![(1, 10.0), (3, 30.0)]);
    }

    #[test]
    fn test_sparse_vector_utilities() {
        let sv = SparseVector::new(vec![1, 3], vec![2.0, 4.0]);
        assert_eq!(sv.nnz(), 2);
        assert!(!sv.is_empty());

        let empty = SparseVector::empty();
        assert_eq!(empty.nnz(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }
}
