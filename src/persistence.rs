//! Model serialization and persistence
//!
//! Converts a ready model record to and from a JSON representation. A
//! deserialized model always materializes its own copy of the support
//! vectors (the original training set is not available at load time), so it
//! comes back with owned storage, and reconstruction goes through
//! [`SvmModel::finalize`] so every structural invariant is re-verified
//! before the model can be used.

use crate::core::{ModelError, Result, SparseVector};
use crate::model::{ModelParts, SupportVectorSet, SvmModel};
use crate::params::SvmParams;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained multi-class SVM model
#[derive(Serialize, Deserialize)]
pub struct SerializableModel {
    /// Training parameters, stored verbatim
    pub params: SvmParams,
    /// Support vector features, in class-grouped order
    pub support_vectors: Vec<SerializableVector>,
    /// Dual weights per pairwise decision function
    pub weights: Vec<Vec<f64>>,
    /// Bias per pairwise decision function
    pub biases: Vec<f64>,
    /// Platt A coefficients (empty without calibration)
    pub prob_a: Vec<f64>,
    /// Platt B coefficients (empty without calibration)
    pub prob_b: Vec<f64>,
    /// 1-based training rows of the support vectors (empty when untracked)
    pub source_indices: Vec<usize>,
    /// Original label per class slot
    pub labels: Vec<i32>,
    /// Support vectors contributed by each class slot
    pub per_class_counts: Vec<usize>,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Serializable sparse feature vector
#[derive(Serialize, Deserialize, Clone)]
pub struct SerializableVector {
    /// Feature indices
    pub indices: Vec<usize>,
    /// Feature values
    pub values: Vec<f64>,
}

/// Model metadata for tracking and validation
#[derive(Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Number of classes
    pub n_classes: usize,
    /// Number of support vectors
    pub n_support_vectors: usize,
    /// Creation timestamp
    pub created_at: String,
}

impl From<&SparseVector> for SerializableVector {
    fn from(sv: &SparseVector) -> Self {
        Self {
            indices: sv.indices.clone(),
            values: sv.values.clone(),
        }
    }
}

impl From<&SerializableVector> for SparseVector {
    fn from(sv: &SerializableVector) -> Self {
        SparseVector::new(sv.indices.clone(), sv.values.clone())
    }
}

impl SerializableModel {
    /// Capture a ready model for persistence
    ///
    /// Fails if the model is released or was never finalized; a partial
    /// model cannot be replayed and must not be written out.
    pub fn from_model(model: &SvmModel<'_>) -> Result<Self> {
        if !model.is_ready()? {
            return Err(ModelError::InvalidShape(
                "cannot serialize a model that was never finalized".to_string(),
            ));
        }

        let n_sv = model.n_support_vectors()?;
        let mut support_vectors = Vec::with_capacity(n_sv);
        for i in 0..n_sv {
            support_vectors.push(SerializableVector::from(model.support_vector(i)?));
        }

        let n_classes = model.n_classes()?;
        let n_pairs = n_classes * (n_classes - 1) / 2;
        let mut weights = Vec::with_capacity(n_pairs);
        let mut biases = Vec::with_capacity(n_pairs);
        for i in 0..n_classes {
            for j in (i + 1)..n_classes {
                let df = model.decision_function(i, j)?;
                weights.push(df.weights().to_vec());
                biases.push(df.bias());
            }
        }

        Ok(Self {
            params: model.params()?.clone(),
            support_vectors,
            weights,
            biases,
            prob_a: model.prob_a()?.to_vec(),
            prob_b: model.prob_b()?.to_vec(),
            source_indices: model.source_indices()?.to_vec(),
            labels: model.class_labels()?.to_vec(),
            per_class_counts: model.support_vectors_per_class()?.to_vec(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                n_classes,
                n_support_vectors: n_sv,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        })
    }

    /// Save model to file as JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(ModelError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| ModelError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(ModelError::IoError)?;
        let reader = BufReader::new(file);
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| ModelError::SerializationError(e.to_string()))?;
        debug!(
            "loaded serialized model: {} classes, {} support vectors",
            model.metadata.n_classes, model.metadata.n_support_vectors
        );
        Ok(model)
    }

    /// Reconstruct a ready model record with owned support-vector storage
    ///
    /// Goes through the normal finalize path, so a tampered or truncated
    /// file fails with the same shape errors a misbehaving trainer would.
    pub fn to_model(&self) -> Result<SvmModel<'static>> {
        let vectors: Vec<SparseVector> =
            self.support_vectors.iter().map(SparseVector::from).collect();

        let mut model = SvmModel::new(self.params.clone());
        model.finalize(ModelParts {
            support_vectors: SupportVectorSet::Owned(vectors),
            per_class_counts: self.per_class_counts.clone(),
            labels: self.labels.clone(),
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            prob_a: self.prob_a.clone(),
            prob_b: self.prob_b.clone(),
            source_indices: self.source_indices.clone(),
        })?;

        debug!(
            "reconstructed model: {} classes, {} support vectors",
            self.metadata.n_classes, self.metadata.n_support_vectors
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::KernelType;
    use approx::assert_relative_eq;
    use tempfile::NamedTempFile;

    fn sample_model() -> SvmModel<'static> {
        let vectors = vec![
            SparseVector::new(vec![0, 2], vec![1.0, -0.25]),
            SparseVector::new(vec![1], vec![2.5]),
            SparseVector::new(vec![0, 3], vec![-1.5, 0.75]),
        ];

        let mut model = SvmModel::new(SvmParams {
            kernel: KernelType::Rbf { gamma: 0.5 },
            probability: true,
            ..SvmParams::default()
        });
        model
            .finalize(ModelParts {
                support_vectors: SupportVectorSet::Owned(vectors),
                per_class_counts: vec![2, 1],
                labels: vec![-1, 1],
                weights: vec![vec![0.5, -0.25, 1.25]],
                biases: vec![0.0625],
                prob_a: vec![-1.5],
                prob_b: vec![0.125],
                source_indices: vec![4, 9, 17],
            })
            .unwrap();
        model
    }

    #[test]
    fn test_serializable_vector_conversion() {
        let sv = SparseVector::new(vec![0, 2, 5], vec![1.0, 2.0, 3.0]);

        let serializable = SerializableVector::from(&sv);
        assert_eq!(serializable.indices, vec![0, 2, 5]);
        assert_eq!(serializable.values, vec![1.0, 2.0, 3.0]);

        let converted_back = SparseVector::from(&serializable);
        assert_eq!(converted_back, sv);
    }

    #[test]
    fn test_rejects_unready_model() {
        let model = SvmModel::new(SvmParams::default());
        assert!(matches!(
            SerializableModel::from_model(&model),
            Err(ModelError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_round_trip_preserves_decision_functions() -> Result<()> {
        let model = sample_model();
        let serializable = SerializableModel::from_model(&model)?;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        serializable.save_to_file(temp_file.path())?;
        let loaded = SerializableModel::load_from_file(temp_file.path())?;
        let restored = loaded.to_model()?;

        assert!(restored.is_ready()?);
        assert!(restored.owns_support_vectors()?);
        assert_eq!(restored.class_labels()?, model.class_labels()?);
        assert_eq!(
            restored.support_vectors_per_class()?,
            model.support_vectors_per_class()?
        );
        assert_eq!(restored.source_indices()?, model.source_indices()?);
        assert!(restored.has_probability_calibration()?);
        assert_eq!(restored.params()?, model.params()?);

        // decision function slices must come back bit-identical
        let before = model.decision_function(0, 1)?;
        let after = restored.decision_function(0, 1)?;
        assert_eq!(before.weights(), after.weights());
        assert_eq!(before.bias().to_bits(), after.bias().to_bits());
        let before_svs: Vec<_> = before.support_vectors().collect();
        let after_svs: Vec<_> = after.support_vectors().collect();
        assert_eq!(before_svs, after_svs);

        Ok(())
    }

    #[test]
    fn test_round_trip_probability_coefficients() -> Result<()> {
        let model = sample_model();
        let serializable = SerializableModel::from_model(&model)?;
        let restored = serializable.to_model()?;

        assert_relative_eq!(restored.prob_a()?[0], -1.5);
        assert_relative_eq!(restored.prob_b()?[0], 0.125);
        Ok(())
    }

    #[test]
    fn test_to_model_revalidates_invariants() -> Result<()> {
        let model = sample_model();
        let mut serializable = SerializableModel::from_model(&model)?;

        // simulate a truncated file: one support vector lost
        serializable.support_vectors.pop();

        assert!(matches!(
            serializable.to_model(),
            Err(ModelError::InvalidShape(_))
        ));
        Ok(())
    }

    #[test]
    fn test_metadata_is_populated() -> Result<()> {
        let model = sample_model();
        let serializable = SerializableModel::from_model(&model)?;

        assert_eq!(serializable.metadata.n_classes, 2);
        assert_eq!(serializable.metadata.n_support_vectors, 3);
        assert_eq!(
            serializable.metadata.library_version,
            env!("CARGO_PKG_VERSION")
        );
        assert!(!serializable.metadata.created_at.is_empty());
        Ok(())
    }
}
