//! Fixed-capacity ring of episodes.

use rand::Rng;
use tracing::debug;

use super::batch::{EpisodeBatch, SampledBatch};
use super::error::BufferError;
use crate::types::{Trajectory, Transition, TransitionShape};

/// Replay buffer holding whole episodes of a fixed length.
///
/// Episodes are written to slot `store_index`, which advances as
/// `episodes_recorded % capacity`, so once the buffer is full every new
/// episode replaces the oldest one.
#[derive(Debug, Clone)]
pub struct EpisodeBuffer {
    slots: Vec<Trajectory>,
    capacity: usize,
    episode_limit: usize,
    shape: TransitionShape,
    episodes_recorded: usize,
    store_index: usize,
}

impl EpisodeBuffer {
    /// Creates an empty buffer.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of stored episodes
    /// * `episode_limit` - Exact number of steps of every stored episode
    /// * `shape` - Dimensions every transition must match
    pub fn new(
        capacity: usize,
        episode_limit: usize,
        shape: TransitionShape,
    ) -> Result<Self, BufferError> {
        if capacity == 0 || episode_limit == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            episode_limit,
            shape,
            episodes_recorded: 0,
            store_index: 0,
        })
    }

    /// Stores an episode, replacing the oldest one when full.
    pub fn add(&mut self, trajectory: Trajectory) -> Result<(), BufferError> {
        if trajectory.len() != self.episode_limit {
            return Err(BufferError::TrajectoryLength {
                expected: self.episode_limit,
                actual: trajectory.len(),
            });
        }
        for (step, transition) in trajectory.iter().enumerate() {
            if let Some((field, expected, actual)) = self.shape.mismatch(transition) {
                return Err(BufferError::TransitionShape {
                    step,
                    field,
                    expected,
                    actual,
                });
            }
        }

        if self.slots.len() < self.capacity {
            self.slots.push(trajectory);
        } else {
            self.slots[self.store_index] = trajectory;
        }

        let slot = self.store_index;
        self.episodes_recorded += 1;
        self.store_index = self.episodes_recorded % self.capacity;
        debug!(
            target: "marl_ctde::buffer",
            slot,
            stored = self.slots.len(),
            recorded = self.episodes_recorded,
            "stored episode"
        );
        Ok(())
    }

    /// Samples distinct episodes uniformly without replacement.
    ///
    /// While the buffer is still filling, asking for more episodes than are
    /// stored returns all of them (in random order). Once full, asking for
    /// more than `capacity` is an error.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<SampledBatch, BufferError> {
        if batch_size == 0 {
            return Err(BufferError::InvalidBatchSize);
        }
        if self.is_empty() {
            return Err(BufferError::Empty);
        }

        let available = self.len();
        let amount = if self.is_full() {
            if batch_size > available {
                return Err(BufferError::BatchTooLarge {
                    requested: batch_size,
                    available,
                });
            }
            batch_size
        } else {
            batch_size.min(available)
        };

        let indices = rand::seq::index::sample(rng, available, amount).into_vec();
        debug!(
            target: "marl_ctde::buffer",
            requested = batch_size,
            sampled = amount,
            available,
            "sampled episodes"
        );
        let keys = indices
            .iter()
            .enumerate()
            .map(|(row, slot)| format!("transition_{}_idx_{}", slot, row))
            .collect();
        let episodes: Vec<&[Transition]> =
            indices.iter().map(|&slot| self.slots[slot].as_slice()).collect();
        let batch = EpisodeBatch::from_trajectories(&episodes, self.shape)?;

        Ok(SampledBatch {
            keys,
            indices,
            batch,
        })
    }

    /// Returns the episode stored in `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<&Trajectory> {
        self.slots.get(slot)
    }

    /// Removes every stored episode and resets the counters.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.episodes_recorded = 0;
        self.store_index = 0;
    }

    /// Number of stored episodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn episode_limit(&self) -> usize {
        self.episode_limit
    }

    pub fn shape(&self) -> TransitionShape {
        self.shape
    }

    /// Slot the next episode will be written to.
    pub fn store_index(&self) -> usize {
        self.store_index
    }

    /// Total number of episodes ever added, including overwritten ones.
    pub fn episodes_recorded(&self) -> usize {
        self.episodes_recorded
    }
}

/// Pads an early-terminated episode to `episode_limit` steps.
///
/// Padding steps are absorbing: they start and end at the last observed
/// next-state, carry zero actions and rewards, and are marked done so the
/// critic never bootstraps through them.
pub fn pad_episode(
    mut trajectory: Trajectory,
    episode_limit: usize,
) -> Result<Trajectory, BufferError> {
    let Some(last) = trajectory.last().filter(|_| trajectory.len() <= episode_limit) else {
        return Err(BufferError::TrajectoryLength {
            expected: episode_limit,
            actual: trajectory.len(),
        });
    };
    let filler = Transition {
        observations: last.next_observations.clone(),
        next_observations: last.next_observations.clone(),
        state: last.next_state.clone(),
        next_state: last.next_state.clone(),
        actions: last.actions.iter().map(|a| vec![0.0; a.len()]).collect(),
        rewards: vec![0.0; last.rewards.len()],
        done: true,
    };
    trajectory.resize(episode_limit, filler);
    Ok(trajectory)
}
