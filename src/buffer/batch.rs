//! Assembly of sampled episodes into dense arrays.

use ndarray::Array4;

use super::error::BufferError;
use crate::types::{Transition, TransitionShape};

/// Sampled episodes stacked into `[batch, time, agent, feature]` arrays.
///
/// Global state arrays keep a singleton agent axis so they can be expanded
/// to every agent without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeBatch {
    /// `(B, T, N, obs_dim)`
    pub observations: Array4<f32>,
    /// `(B, T, N, obs_dim)`
    pub next_observations: Array4<f32>,
    /// `(B, T, 1, state_dim)`
    pub states: Array4<f32>,
    /// `(B, T, 1, state_dim)`
    pub next_states: Array4<f32>,
    /// `(B, T, N, action_dim)`
    pub actions: Array4<f32>,
    /// `(B, T, N, 1)`
    pub rewards: Array4<f32>,
    /// `(B, T, N, 1)`, 1.0 where the step ended the episode.
    pub dones: Array4<f32>,
}

impl EpisodeBatch {
    /// Stacks equally long episodes in the given order.
    ///
    /// Every transition is assumed to match `shape`; the buffer checks this
    /// on insertion.
    pub fn from_trajectories(
        episodes: &[&[Transition]],
        shape: TransitionShape,
    ) -> Result<Self, BufferError> {
        let batch = episodes.len();
        let steps = episodes.first().map_or(0, |e| e.len());
        if let Some(bad) = episodes.iter().find(|e| e.len() != steps) {
            return Err(BufferError::TrajectoryLength {
                expected: steps,
                actual: bad.len(),
            });
        }
        let n = shape.n_agents;
        let transitions = move || episodes.iter().flat_map(|e| e.iter());

        let per_agent = |rows: fn(&Transition) -> &Vec<Vec<f32>>, width: usize| {
            let data: Vec<f32> = transitions()
                .flat_map(|t| rows(t).iter().flat_map(|row| row.iter().copied()))
                .collect();
            Array4::from_shape_vec((batch, steps, n, width), data)
        };
        let global = |row: fn(&Transition) -> &Vec<f32>| {
            let data: Vec<f32> = transitions().flat_map(|t| row(t).iter().copied()).collect();
            Array4::from_shape_vec((batch, steps, 1, shape.state_dim), data)
        };

        let rewards: Vec<f32> = transitions()
            .flat_map(|t| t.rewards.iter().copied())
            .collect();
        let dones: Vec<f32> = transitions()
            .flat_map(|t| std::iter::repeat(if t.done { 1.0 } else { 0.0 }).take(n))
            .collect();

        Ok(Self {
            observations: per_agent(|t| &t.observations, shape.obs_dim)?,
            next_observations: per_agent(|t| &t.next_observations, shape.obs_dim)?,
            states: global(|t| &t.state)?,
            next_states: global(|t| &t.next_state)?,
            actions: per_agent(|t| &t.actions, shape.action_dim)?,
            rewards: Array4::from_shape_vec((batch, steps, n, 1), rewards)?,
            dones: Array4::from_shape_vec((batch, steps, n, 1), dones)?,
        })
    }

    /// Number of episodes B.
    pub fn batch_size(&self) -> usize {
        self.observations.shape()[0]
    }

    /// Steps per episode T.
    pub fn episode_limit(&self) -> usize {
        self.observations.shape()[1]
    }

    /// Number of agents N.
    pub fn n_agents(&self) -> usize {
        self.observations.shape()[2]
    }
}

/// Result of [`EpisodeBuffer::sample`](super::EpisodeBuffer::sample).
#[derive(Debug, Clone)]
pub struct SampledBatch {
    /// One label per batch row: `transition_{slot}_idx_{row}`.
    pub keys: Vec<String>,
    /// Buffer slot of each batch row.
    pub indices: Vec<usize>,
    /// Stacked episode data.
    pub batch: EpisodeBatch,
}
