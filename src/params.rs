//! Training configuration carried inside a model record
//!
//! The parameters are stored verbatim in the model so that a prediction
//! consumer can reproduce kernel evaluation and so a persisted model is
//! self-describing. They are populated before training starts and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};

/// Kernel function selection with its hyperparameters
///
/// Evaluation of these kernels is external to this crate; the model only
/// records which kernel the trainer used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// K(x, y) = <x, y>
    Linear,
    /// K(x, y) = (gamma * <x, y> + coef0)^degree
    Polynomial { degree: u32, gamma: f64, coef0: f64 },
    /// K(x, y) = exp(-gamma * ||x - y||^2)
    Rbf { gamma: f64 },
    /// K(x, y) = tanh(gamma * <x, y> + coef0)
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        Self::Linear
    }
}

/// Per-class cost multiplier (C_i = c * weight for the given label)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeight {
    /// Original class label the weight applies to
    pub label: i32,
    /// Multiplier applied to the cost parameter for this class
    pub weight: f64,
}

/// Configuration a trainer used to fit a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    /// Kernel function and its hyperparameters
    pub kernel: KernelType,
    /// Regularization parameter (upper bound for dual weights)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub epsilon: f64,
    /// Whether probability calibration (Platt scaling) was requested
    pub probability: bool,
    /// Per-class cost multipliers (empty means uniform cost)
    pub class_weights: Vec<ClassWeight>,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            kernel: KernelType::default(),
            c: 1.0,
            epsilon: 0.001,
            probability: false,
            class_weights: Vec::new(),
        }
    }
}

impl SvmParams {
    /// Look up the effective cost for a class label
    pub fn cost_for(&self, label: i32) -> f64 {
        self.class_weights
            .iter()
            .find(|w| w.label == label)
            .map_or(self.c, |w| self.c * w.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_params_default() {
        let params = SvmParams::default();
        assert_eq!(params.kernel, KernelType::Linear);
        assert_eq!(params.c, 1.0);
        assert_eq!(params.epsilon, 0.001);
        assert!(!params.probability);
        assert!(params.class_weights.is_empty());
    }

    #[test]
    fn test_cost_for_weighted_class() {
        let params = SvmParams {
            c: 2.0,
            class_weights: vec![ClassWeight {
                label: 3,
                weight: 0.5,
            }],
            ..SvmParams::default()
        };

        assert_relative_eq!(params.cost_for(3), 1.0);
        assert_relative_eq!(params.cost_for(1), 2.0);
    }

    #[test]
    fn test_kernel_serde_round_trip() {
        let kernel = KernelType::Polynomial {
            degree: 3,
            gamma: 0.5,
            coef0: 1.0,
        };
        let json = serde_json::to_string(&kernel).unwrap();
        let back: KernelType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kernel);
    }
}
