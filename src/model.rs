//! The model record for a fitted multi-class SVM
//!
//! [`SvmModel`] is the value a trainer populates and a prediction consumer
//! reads. It holds the training parameters, the retained support vectors,
//! and the dual weights and biases of every pairwise (one-vs-one) decision
//! function, laid out so that any class pair can be sliced in O(1).
//!
//! Support vectors are grouped contiguously by class: the first
//! `n_sv_per_class[0]` entries belong to class slot 0, the next
//! `n_sv_per_class[1]` to slot 1, and so on. That grouping is what lets
//! [`SvmModel::decision_function`] hand out weight and vector spans without
//! any auxiliary index structures.
//!
//! # Lifecycle
//!
//! A record starts empty ([`SvmModel::new`]), becomes ready through a single
//! all-or-nothing [`SvmModel::finalize`], and is torn down by
//! [`SvmModel::release`] (or by `Drop`, which releases owned storage the
//! same way). After `release`, every other operation fails with
//! [`ModelError::UseAfterRelease`].
//!
//! # Sharing
//!
//! A ready record is immutable and carries no interior mutability, so it can
//! be shared freely across threads. Callers must publish the record only
//! after `finalize` returns and must not call `release` while readers still
//! hold slices; the record does no internal synchronization.

use crate::core::{ModelError, Result, SparseVector};
use crate::params::SvmParams;
use std::ops::Range;

/// Backing storage for a model's support vectors
///
/// The variant records who owns the feature-vector storage: `Borrowed`
/// aliases the caller's training set (which must outlive the model), while
/// `Owned` holds a dedicated copy materialized at load time. This is the
/// statically-checked form of libsvm's `free_sv` flag.
#[derive(Debug, Clone)]
pub enum SupportVectorSet<'a> {
    /// References into a training set owned by the caller
    Borrowed(Vec<&'a SparseVector>),
    /// Dedicated storage, released together with the model
    Owned(Vec<SparseVector>),
}

impl<'a> SupportVectorSet<'a> {
    /// Number of support vectors in the set
    pub fn len(&self) -> usize {
        match self {
            Self::Borrowed(refs) => refs.len(),
            Self::Owned(vecs) => vecs.len(),
        }
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a support vector by position
    pub fn get(&self, index: usize) -> Option<&SparseVector> {
        match self {
            Self::Borrowed(refs) => refs.get(index).copied(),
            Self::Owned(vecs) => vecs.get(index),
        }
    }

    /// Whether this set owns its backing storage
    pub fn owns_storage(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    fn clear(&mut self) {
        match self {
            Self::Borrowed(refs) => {
                refs.clear();
                refs.shrink_to_fit();
            }
            Self::Owned(vecs) => {
                vecs.clear();
                vecs.shrink_to_fit();
            }
        }
    }
}

impl Default for SupportVectorSet<'_> {
    fn default() -> Self {
        Self::Owned(Vec::new())
    }
}

/// Everything a trainer supplies to [`SvmModel::finalize`]
///
/// `weights` and `biases` are indexed by pair in the order
/// (0,1), (0,2), ..., (0,k-1), (1,2), ... for k classes. `prob_a`/`prob_b`
/// are either both empty (no calibration) or both of pair length.
/// `source_indices` is either empty or one 1-based training-set row per
/// support vector.
#[derive(Debug, Default)]
pub struct ModelParts<'a> {
    /// Support vectors, grouped contiguously by class slot
    pub support_vectors: SupportVectorSet<'a>,
    /// Support vectors contributed by each class slot
    pub per_class_counts: Vec<usize>,
    /// Original label for each class slot
    pub labels: Vec<i32>,
    /// Dual weights, one inner sequence per pairwise decision function
    pub weights: Vec<Vec<f64>>,
    /// Constant offset of each pairwise decision function
    pub biases: Vec<f64>,
    /// Platt scaling A coefficients (empty when calibration is off)
    pub prob_a: Vec<f64>,
    /// Platt scaling B coefficients (empty when calibration is off)
    pub prob_b: Vec<f64>,
    /// 1-based training-set row of each support vector (empty when untracked)
    pub source_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelState {
    Unready,
    Ready,
    Released,
}

/// Fitted multi-class SVM model record
#[derive(Debug)]
pub struct SvmModel<'a> {
    params: SvmParams,
    state: ModelState,
    labels: Vec<i32>,
    n_sv_per_class: Vec<usize>,
    /// Prefix sums of `n_sv_per_class`; start offset of each class span
    class_starts: Vec<usize>,
    support_vectors: SupportVectorSet<'a>,
    sv_coef: Vec<Vec<f64>>,
    bias: Vec<f64>,
    prob_a: Vec<f64>,
    prob_b: Vec<f64>,
    sv_source_indices: Vec<usize>,
}

impl<'a> SvmModel<'a> {
    /// Create an empty, unready model holding only the training configuration
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            state: ModelState::Unready,
            labels: Vec::new(),
            n_sv_per_class: Vec::new(),
            class_starts: Vec::new(),
            support_vectors: SupportVectorSet::default(),
            sv_coef: Vec::new(),
            bias: Vec::new(),
            prob_a: Vec::new(),
            prob_b: Vec::new(),
            sv_source_indices: Vec::new(),
        }
    }

    fn guard(&self) -> Result<()> {
        if self.state == ModelState::Released {
            Err(ModelError::UseAfterRelease)
        } else {
            Ok(())
        }
    }

    /// Populate the record with trained quantities and transition to ready
    ///
    /// Validates every structural invariant before mutating anything, so a
    /// failed call leaves the record exactly as it was (unready). Fails with
    /// [`ModelError::EmptyModel`] for fewer than two classes and
    /// [`ModelError::InvalidShape`] for any length mismatch.
    pub fn finalize(&mut self, parts: ModelParts<'a>) -> Result<()> {
        self.guard()?;
        if self.state == ModelState::Ready {
            return Err(ModelError::InvalidShape(
                "model is already finalized".to_string(),
            ));
        }

        Self::validate(&parts)?;

        let ModelParts {
            support_vectors,
            per_class_counts,
            labels,
            weights,
            biases,
            prob_a,
            prob_b,
            source_indices,
        } = parts;

        let mut class_starts = Vec::with_capacity(per_class_counts.len());
        let mut offset = 0;
        for &count in &per_class_counts {
            class_starts.push(offset);
            offset += count;
        }

        self.labels = labels;
        self.n_sv_per_class = per_class_counts;
        self.class_starts = class_starts;
        self.support_vectors = support_vectors;
        self.sv_coef = weights;
        self.bias = biases;
        self.prob_a = prob_a;
        self.prob_b = prob_b;
        self.sv_source_indices = source_indices;
        self.state = ModelState::Ready;

        Ok(())
    }

    fn validate(parts: &ModelParts<'_>) -> Result<()> {
        let n_classes = parts.labels.len();
        if n_classes < 2 {
            return Err(ModelError::EmptyModel { n_classes });
        }

        if parts.per_class_counts.len() != n_classes {
            return Err(ModelError::InvalidShape(format!(
                "per-class counts has length {}, expected {} (one per class)",
                parts.per_class_counts.len(),
                n_classes
            )));
        }

        let n_sv = parts.support_vectors.len();
        let count_sum: usize = parts.per_class_counts.iter().sum();
        if count_sum != n_sv {
            return Err(ModelError::InvalidShape(format!(
                "per-class counts sum to {count_sum}, but {n_sv} support vectors were supplied"
            )));
        }

        let n_pairs = n_classes * (n_classes - 1) / 2;
        if parts.weights.len() != n_pairs {
            return Err(ModelError::InvalidShape(format!(
                "got {} weight sequences, expected {} (one per class pair)",
                parts.weights.len(),
                n_pairs
            )));
        }
        if parts.biases.len() != n_pairs {
            return Err(ModelError::InvalidShape(format!(
                "got {} biases, expected {} (one per class pair)",
                parts.biases.len(),
                n_pairs
            )));
        }

        let mut pair = 0;
        for i in 0..n_classes {
            for j in (i + 1)..n_classes {
                let expected = parts.per_class_counts[i] + parts.per_class_counts[j];
                let actual = parts.weights[pair].len();
                if actual != expected {
                    return Err(ModelError::InvalidShape(format!(
                        "decision function ({i},{j}) has {actual} weights, expected {expected}"
                    )));
                }
                pair += 1;
            }
        }

        match (parts.prob_a.len(), parts.prob_b.len()) {
            (0, 0) => {}
            (a, b) if a == n_pairs && b == n_pairs => {}
            (a, b) => {
                return Err(ModelError::InvalidShape(format!(
                    "probability coefficients have lengths {a} and {b}, \
                     expected both 0 or both {n_pairs}"
                )));
            }
        }

        if !parts.source_indices.is_empty() {
            if parts.source_indices.len() != n_sv {
                return Err(ModelError::InvalidShape(format!(
                    "got {} source indices, expected {} (one per support vector)",
                    parts.source_indices.len(),
                    n_sv
                )));
            }
            if parts.source_indices.iter().any(|&idx| idx == 0) {
                return Err(ModelError::InvalidShape(
                    "source indices are 1-based training rows; found 0".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Whether the record holds a complete model and can be handed to a
    /// prediction consumer
    pub fn is_ready(&self) -> Result<bool> {
        self.guard()?;
        Ok(self.state == ModelState::Ready)
    }

    /// Whether Platt scaling coefficients were supplied at finalize time
    pub fn has_probability_calibration(&self) -> Result<bool> {
        self.guard()?;
        Ok(!self.prob_a.is_empty())
    }

    /// Look up the pairwise decision function between two classes
    ///
    /// The lookup is commutative: `decision_function(i, j)` and
    /// `decision_function(j, i)` return identical slices, stored for the
    /// ordered pair (min, max) — a positive decision value votes for the
    /// lower class slot. Fails with [`ModelError::InvalidClassIndex`] when
    /// either index is out of range or the two are equal.
    pub fn decision_function(&self, class_i: usize, class_j: usize) -> Result<DecisionFunction<'_, 'a>> {
        self.guard()?;

        let n_classes = self.labels.len();
        for &index in &[class_i, class_j] {
            if index >= n_classes {
                return Err(ModelError::InvalidClassIndex { index, n_classes });
            }
        }
        if class_i == class_j {
            return Err(ModelError::InvalidClassIndex {
                index: class_j,
                n_classes,
            });
        }

        let (lo, hi) = if class_i < class_j {
            (class_i, class_j)
        } else {
            (class_j, class_i)
        };

        let first_start = self.class_starts[lo];
        let second_start = self.class_starts[hi];
        Ok(DecisionFunction {
            model: self,
            pair: self.pair_index(lo, hi),
            classes: (lo, hi),
            first: first_start..first_start + self.n_sv_per_class[lo],
            second: second_start..second_start + self.n_sv_per_class[hi],
        })
    }

    /// Pair position in the (0,1),(0,2),...,(1,2),... ordering; requires i < j
    fn pair_index(&self, i: usize, j: usize) -> usize {
        let k = self.labels.len();
        i * (2 * k - i - 1) / 2 + (j - i - 1)
    }

    /// Release the backing support-vector storage and retire the record
    ///
    /// Drops owned feature-vector storage (a no-op on that storage when it
    /// is merely borrowed) and moves the record to its terminal state, after
    /// which every other operation fails with
    /// [`ModelError::UseAfterRelease`]. Idempotent. Dropping the model
    /// without calling this releases owned storage just the same.
    pub fn release(&mut self) {
        if self.state == ModelState::Released {
            return;
        }
        self.support_vectors.clear();
        self.state = ModelState::Released;
    }

    /// Training configuration the model was fitted with
    pub fn params(&self) -> Result<&SvmParams> {
        self.guard()?;
        Ok(&self.params)
    }

    /// Number of distinct classes (0 while unready)
    pub fn n_classes(&self) -> Result<usize> {
        self.guard()?;
        Ok(self.labels.len())
    }

    /// Total number of retained support vectors
    pub fn n_support_vectors(&self) -> Result<usize> {
        self.guard()?;
        Ok(self.support_vectors.len())
    }

    /// Original label of each class slot
    pub fn class_labels(&self) -> Result<&[i32]> {
        self.guard()?;
        Ok(&self.labels)
    }

    /// Support vectors contributed by each class slot
    pub fn support_vectors_per_class(&self) -> Result<&[usize]> {
        self.guard()?;
        Ok(&self.n_sv_per_class)
    }

    /// Get a support vector by its global position
    pub fn support_vector(&self, index: usize) -> Result<&SparseVector> {
        self.guard()?;
        self.support_vectors.get(index).ok_or_else(|| {
            ModelError::InvalidShape(format!(
                "support vector index {index} out of range ({} retained)",
                self.support_vectors.len()
            ))
        })
    }

    /// Whether the record owns its support-vector storage (true after
    /// deserialization, false when aliasing the caller's training set)
    pub fn owns_support_vectors(&self) -> Result<bool> {
        self.guard()?;
        Ok(self.support_vectors.owns_storage())
    }

    /// 1-based training-set row of each support vector; empty when the
    /// trainer did not track provenance. Meaningful only while the original
    /// training set is retained.
    pub fn source_indices(&self) -> Result<&[usize]> {
        self.guard()?;
        Ok(&self.sv_source_indices)
    }

    /// Platt A coefficients, one per class pair (empty without calibration)
    pub fn prob_a(&self) -> Result<&[f64]> {
        self.guard()?;
        Ok(&self.prob_a)
    }

    /// Platt B coefficients, one per class pair (empty without calibration)
    pub fn prob_b(&self) -> Result<&[f64]> {
        self.guard()?;
        Ok(&self.prob_b)
    }
}

/// View over one pairwise decision function of a ready model
///
/// Exposes the weight slice, the bias, and the two contiguous support-vector
/// spans a predictor needs to evaluate the kernel-weighted sum for this
/// class pair. Weight position i corresponds to the i-th vector yielded by
/// [`DecisionFunction::support_vectors`].
#[derive(Debug)]
pub struct DecisionFunction<'m, 'a> {
    model: &'m SvmModel<'a>,
    pair: usize,
    classes: (usize, usize),
    first: Range<usize>,
    second: Range<usize>,
}

impl<'m, 'a> DecisionFunction<'m, 'a> {
    /// The class slots this function discriminates, as (lower, higher)
    pub fn classes(&self) -> (usize, usize) {
        self.classes
    }

    /// Dual weights, one per participating support vector
    pub fn weights(&self) -> &'m [f64] {
        &self.model.sv_coef[self.pair]
    }

    /// Constant offset added to the kernel-weighted sum
    pub fn bias(&self) -> f64 {
        self.model.bias[self.pair]
    }

    /// Number of participating support vectors
    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    /// Check if the function has no support vectors
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a participating support vector by its position in weight order
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn support_vector(&self, position: usize) -> &'m SparseVector {
        let global = self
            .global_index(position)
            .expect("position out of range for decision function");
        self.model
            .support_vectors
            .get(global)
            .expect("class span outside support vector storage")
    }

    /// Iterate over the participating support vectors in weight order
    /// (the lower class's contiguous span, then the higher class's)
    pub fn support_vectors(&self) -> impl Iterator<Item = &'m SparseVector> + '_ {
        (0..self.len()).map(move |position| self.support_vector(position))
    }

    /// Global storage positions of the participating support vectors
    pub fn support_vector_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.first.clone().chain(self.second.clone())
    }

    fn global_index(&self, position: usize) -> Option<usize> {
        if position < self.first.len() {
            Some(self.first.start + position)
        } else if position < self.len() {
            Some(self.second.start + (position - self.first.len()))
        } else {
            None
        }
    }
}
