use thiserror::Error;

use crate::buffer::BufferError;
use crate::config::ConfigError;

/// Errors raised while building or updating a trainer.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("Torch error: {0}")]
    Tch(#[from] tch::TchError),

    #[error("Batch field `{field}` has shape {actual:?}, expected {expected:?}")]
    BatchShape {
        field: &'static str,
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    #[error("Target network has no source variable `{0}`")]
    MissingVariable(String),
}
