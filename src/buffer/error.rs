use thiserror::Error;

/// Errors raised while storing or sampling episodes.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Buffer capacity and episode limit must be positive")]
    ZeroCapacity,

    #[error("Cannot sample from an empty buffer")]
    Empty,

    #[error("Batch size must be positive")]
    InvalidBatchSize,

    #[error("Requested {requested} episodes but only {available} are stored")]
    BatchTooLarge { requested: usize, available: usize },

    #[error("Episode has {actual} steps, expected {expected}")]
    TrajectoryLength { expected: usize, actual: usize },

    #[error("Step {step}: `{field}` has length {actual}, expected {expected}")]
    TransitionShape {
        step: usize,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to assemble batch array: {0}")]
    Assemble(#[from] ndarray::ShapeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_too_large_display() {
        let e = BufferError::BatchTooLarge {
            requested: 64,
            available: 10,
        };
        assert_eq!(e.to_string(), "Requested 64 episodes but only 10 are stored");
    }

    #[test]
    fn transition_shape_display() {
        let e = BufferError::TransitionShape {
            step: 3,
            field: "rewards",
            expected: 2,
            actual: 1,
        };
        assert_eq!(e.to_string(), "Step 3: `rewards` has length 1, expected 2");
    }
}
