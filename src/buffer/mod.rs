//! QMIX-style episode replay buffer.
//!
//! Stores whole episodes in a fixed number of slots, overwriting the oldest
//! once full, and assembles sampled episodes into `[batch, time, agent, feature]`
//! arrays ready for the trainer.

pub mod batch;
pub mod episode_buffer;
pub mod error;


pub use batch::{EpisodeBatch, SampledBatch};
pub use episode_buffer::{pad_episode, EpisodeBuffer};
pub use error::BufferError;
