//! MADDPG training with centralized critics and decentralized actors.
//!
//! Provides the tensor batch, the input-assembly helpers, target computation,
//! target-network synchronisation, the trainer and the collect-and-train
//! runner. This module is only available with the `nn` feature.

pub mod error;
pub mod maddpg;
pub mod runner;
pub mod shapes;
pub mod sync;
pub mod targets;
pub mod tensors;

pub use error::TrainingError;
pub use maddpg::{MaddpgTrainer, UpdateStats};
pub use runner::Runner;
pub use tensors::TensorBatch;
