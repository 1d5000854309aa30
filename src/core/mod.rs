//! Core types shared across the crate

pub mod error;
pub mod types;

pub use self::error::*;
pub use self::types::*;
