//! Error types for model construction and access

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Empty model: need at least 2 classes for classification, got {n_classes}")]
    EmptyModel { n_classes: usize },

    #[error("Invalid class index: {index} (model has {n_classes} classes)")]
    InvalidClassIndex { index: usize, n_classes: usize },

    #[error("Model used after release")]
    UseAfterRelease,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
