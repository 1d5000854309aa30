//! In-memory representation of trained multi-class SVM models
//!
//! This crate defines the model record a one-vs-one multi-class SVM trainer
//! populates and a prediction consumer reads: training parameters, support
//! vectors (borrowed from the training set or owned after deserialization),
//! per-pair dual weights and biases, class bookkeeping, and optional Platt
//! scaling coefficients. Training optimizers and kernel evaluation live in
//! their own crates and interoperate through this structure.
//!
//! # Quick Start
//!
//! ```rust
//! use mcsvm::{ModelParts, SupportVectorSet, SvmModel, SvmParams, SparseVector};
//!
//! # fn main() -> mcsvm::Result<()> {
//! // A trainer constructs an empty record, then finalizes it in one shot.
//! let mut model = SvmModel::new(SvmParams::default());
//! model.finalize(ModelParts {
//!     support_vectors: SupportVectorSet::Owned(vec![
//!         SparseVector::new(vec![0], vec![2.0]),
//!         SparseVector::new(vec![0], vec![-2.0]),
//!     ]),
//!     per_class_counts: vec![1, 1],
//!     labels: vec![-1, 1],
//!     weights: vec![vec![0.5, -0.5]],
//!     biases: vec![0.0],
//!     ..ModelParts::default()
//! })?;
//!
//! // A predictor slices out the pairwise decision function it needs.
//! let df = model.decision_function(0, 1)?;
//! assert_eq!(df.weights().len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod model;
pub mod params;
pub mod persistence;

// Re-export main types for convenience
pub use crate::core::error::{ModelError, Result};
pub use crate::core::types::SparseVector;
pub use crate::model::{DecisionFunction, ModelParts, SupportVectorSet, SvmModel};
pub use crate::params::{ClassWeight, KernelType, SvmParams};
pub use crate::persistence::{ModelMetadata, SerializableModel, SerializableVector};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
