//! Conversion of sampled episode arrays into device tensors.

use ndarray::Array4;
use tch::{Device, Kind, Tensor};

use super::error::TrainingError;
use crate::buffer::EpisodeBatch;
use crate::config::MaddpgConfig;

/// An [`EpisodeBatch`] on a device, as `Kind::Float` tensors with the same
/// `[batch, time, agent, feature]` layout.
#[derive(Debug)]
pub struct TensorBatch {
    pub observations: Tensor,
    pub next_observations: Tensor,
    pub states: Tensor,
    pub next_states: Tensor,
    pub actions: Tensor,
    pub rewards: Tensor,
    pub dones: Tensor,
}

fn to_tensor(array: &Array4<f32>, device: Device) -> Tensor {
    let shape: Vec<i64> = array.shape().iter().map(|&d| d as i64).collect();
    let data: Vec<f32> = array.iter().copied().collect();
    Tensor::from_slice(&data)
        .reshape(shape)
        .to_kind(Kind::Float)
        .to_device(device)
}

impl TensorBatch {
    pub fn from_episode_batch(batch: &EpisodeBatch, device: Device) -> Self {
        Self {
            observations: to_tensor(&batch.observations, device),
            next_observations: to_tensor(&batch.next_observations, device),
            states: to_tensor(&batch.states, device),
            next_states: to_tensor(&batch.next_states, device),
            actions: to_tensor(&batch.actions, device),
            rewards: to_tensor(&batch.rewards, device),
            dones: to_tensor(&batch.dones, device),
        }
    }

    /// Batch size B.
    pub fn batch_size(&self) -> i64 {
        self.observations.size()[0]
    }

    /// Steps per episode T.
    pub fn episode_limit(&self) -> i64 {
        self.observations.size()[1]
    }

    /// Checks every field against the dimensions in `config`.
    pub fn validate(&self, config: &MaddpgConfig) -> Result<(), TrainingError> {
        let b = self.batch_size();
        let t = self.episode_limit();
        let n = config.n_agents as i64;
        let per_agent = |d: usize| vec![b, t, n, d as i64];
        let global = vec![b, t, 1, config.state_dim as i64];

        let checks = [
            ("observations", &self.observations, per_agent(config.obs_dim)),
            ("next_observations", &self.next_observations, per_agent(config.obs_dim)),
            ("states", &self.states, global.clone()),
            ("next_states", &self.next_states, global),
            ("actions", &self.actions, per_agent(config.action_dim)),
            ("rewards", &self.rewards, per_agent(1)),
            ("dones", &self.dones, per_agent(1)),
        ];
        for (field, tensor, expected) in checks {
            let actual = tensor.size();
            if actual != expected {
                return Err(TrainingError::BatchShape {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
