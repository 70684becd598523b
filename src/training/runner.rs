//! Collect-and-train loop.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::error::TrainingError;
use super::maddpg::{MaddpgTrainer, UpdateStats};
use super::tensors::TensorBatch;
use crate::buffer::{pad_episode, EpisodeBuffer};
use crate::config::{BufferConfig, ConfigError, RunnerConfig};
use crate::environment::Environment;
use crate::network::{Actor, ActorNetwork, Critic, CriticNetwork};
use crate::policy::Policy;
use crate::types::{Trajectory, Transition, TransitionShape};

/// Drives an environment, an episode buffer and a [`MaddpgTrainer`].
///
/// Every episode is collected with the trainer acting (exploration on),
/// padded to the buffer's episode limit and stored. Once `warmup_episodes`
/// are stored, each episode is followed by `updates_per_episode` sampled
/// updates.
pub struct Runner<E, A = ActorNetwork, C = CriticNetwork> {
    pub env: E,
    pub trainer: MaddpgTrainer<A, C>,
    pub buffer: EpisodeBuffer,
    config: RunnerConfig,
    rng: StdRng,
}

impl<E: Environment, A: Actor, C: Critic> Runner<E, A, C> {
    /// # Arguments
    ///
    /// * `env` - Environment to collect from
    /// * `trainer` - Trainer whose dimensions match `env`
    /// * `buffer_config` - Buffer sizing; `episode_limit` must match `env`
    /// * `config` - Loop settings
    pub fn new(
        env: E,
        trainer: MaddpgTrainer<A, C>,
        buffer_config: &BufferConfig,
        config: RunnerConfig,
    ) -> Result<Self, TrainingError> {
        buffer_config.validate()?;
        config.validate()?;
        if config.warmup_episodes > buffer_config.capacity {
            return Err(ConfigError::InvalidValue {
                field: "warmup_episodes",
                reason: "must not exceed buffer capacity".into(),
            }
            .into());
        }
        if config.batch_size > buffer_config.capacity {
            return Err(ConfigError::InvalidValue {
                field: "batch_size",
                reason: "must not exceed buffer capacity".into(),
            }
            .into());
        }
        if buffer_config.episode_limit != env.episode_limit() {
            return Err(ConfigError::InvalidValue {
                field: "episode_limit",
                reason: format!(
                    "buffer expects {} steps, environment runs {}",
                    buffer_config.episode_limit,
                    env.episode_limit()
                ),
            }
            .into());
        }

        let shape = TransitionShape::new(
            env.n_agents(),
            env.obs_dim(),
            env.state_dim(),
            env.action_dim(),
        );
        let model = &trainer.config;
        let expected = TransitionShape::new(
            model.n_agents,
            model.obs_dim,
            model.state_dim,
            model.action_dim,
        );
        if shape != expected {
            return Err(ConfigError::InvalidValue {
                field: "maddpg",
                reason: format!("trainer dimensions {expected:?} do not match environment {shape:?}"),
            }
            .into());
        }

        let buffer = EpisodeBuffer::new(buffer_config.capacity, buffer_config.episode_limit, shape)?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            env,
            trainer,
            buffer,
            config,
            rng,
        })
    }

    /// Plays one episode with the trainer and stores it.
    ///
    /// Returns the team return (sum of all agents' rewards).
    pub fn collect_episode(&mut self) -> Result<f64, TrainingError> {
        let limit = self.env.episode_limit();
        let mut trajectory: Trajectory = Vec::with_capacity(limit);
        let mut team_return = 0.0;

        self.trainer.reset();
        let mut current = self.env.reset();
        while trajectory.len() < limit {
            let actions = self.trainer.select_actions(&current.observations);
            let result = self.env.step(&actions);
            team_return += result.rewards.iter().map(|&r| r as f64).sum::<f64>();

            let done = result.done;
            let next = result.observation;
            trajectory.push(Transition {
                observations: current.observations,
                next_observations: next.observations.clone(),
                state: current.state,
                next_state: next.state.clone(),
                actions,
                rewards: result.rewards,
                done,
            });
            current = next;
            if done {
                break;
            }
        }

        let steps = trajectory.len();
        self.buffer.add(pad_episode(trajectory, limit)?)?;
        debug!(
            target: "marl_ctde::runner",
            steps,
            team_return,
            stored = self.buffer.len(),
            "collected episode"
        );
        Ok(team_return)
    }

    /// Samples one batch and runs one trainer update.
    pub fn train_step(&mut self) -> Result<UpdateStats, TrainingError> {
        let sampled = self.buffer.sample(self.config.batch_size, &mut self.rng)?;
        let batch = TensorBatch::from_episode_batch(&sampled.batch, self.trainer.device());
        self.trainer.update_parameters(&batch)
    }

    /// Runs the full loop.
    ///
    /// # Returns
    ///
    /// A vector of `(episode_index, team_return)` for the learning curve.
    pub fn run(&mut self) -> Result<Vec<(u32, f64)>, TrainingError> {
        let mut learning_curve = Vec::with_capacity(self.config.episodes as usize);
        self.trainer.set_exploration(true);

        for episode in 0..self.config.episodes {
            let team_return = self.collect_episode()?;
            learning_curve.push((episode, team_return));

            let mut last = None;
            if self.buffer.len() >= self.config.warmup_episodes {
                for _ in 0..self.config.updates_per_episode {
                    last = Some(self.train_step()?);
                }
            }

            if episode % self.config.log_interval == 0 {
                match last {
                    Some(stats) => info!(
                        target: "marl_ctde::runner",
                        episode,
                        episodes = self.config.episodes,
                        team_return,
                        actor_loss = stats.actor_loss,
                        critic_loss = stats.critic_loss,
                        updates = self.trainer.num_updates(),
                        "episode finished"
                    ),
                    None => info!(
                        target: "marl_ctde::runner",
                        episode,
                        episodes = self.config.episodes,
                        team_return,
                        stored = self.buffer.len(),
                        "warming up"
                    ),
                }
            }
        }

        Ok(learning_curve)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaddpgConfig;
    use crate::environment::RendezvousEnv;
    use tch::Device;

    fn trainer(n_agents: usize) -> MaddpgTrainer {
        let cfg = MaddpgConfig {
            n_agents,
            obs_dim: RendezvousEnv::OBS_DIM,
            state_dim: n_agents,
            action_dim: 1,
            hidden_dim: 16,
            ..MaddpgConfig::default()
        };
        MaddpgTrainer::new(cfg, Device::Cpu).unwrap()
    }

    fn buffer_config(limit: usize) -> BufferConfig {
        BufferConfig {
            capacity: 8,
            episode_limit: limit,
        }
    }

    fn runner_config() -> RunnerConfig {
        RunnerConfig {
            episodes: 4,
            warmup_episodes: 2,
            updates_per_episode: 2,
            batch_size: 2,
            seed: 7,
            log_interval: 1,
        }
    }

    #[test]
    fn collected_episodes_are_padded() {
        let env = RendezvousEnv::new(2, 6, 1).with_meet_radius(1.0);
        let mut runner = Runner::new(env, trainer(2), &buffer_config(6), runner_config()).unwrap();
        runner.collect_episode().unwrap();

        assert_eq!(runner.buffer.len(), 1);
        let stored = runner.buffer.get(0).unwrap();
        assert_eq!(stored.len(), 6);
        // everyone is within radius 1.0 after the first step
        assert!(stored[0].done);
        assert!(stored[1..].iter().all(|t| t.done && t.rewards.iter().all(|&r| r == 0.0)));
    }

    #[test]
    fn run_trains_after_warmup() {
        let env = RendezvousEnv::new(3, 5, 3);
        let mut runner = Runner::new(env, trainer(3), &buffer_config(5), runner_config()).unwrap();
        let curve = runner.run().unwrap();

        assert_eq!(curve.len(), 4);
        assert_eq!(curve[0].0, 0);
        assert!(curve.iter().all(|(_, r)| r.is_finite()));
        // warm from the second episode on: 3 episodes × 2 updates
        assert_eq!(runner.trainer.num_updates(), 6);
        assert_eq!(runner.buffer.episodes_recorded(), 4);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let env = RendezvousEnv::new(3, 5, 0);
        assert!(matches!(
            Runner::new(env, trainer(2), &buffer_config(5), runner_config()),
            Err(TrainingError::Config(_))
        ));
    }

    #[test]
    fn mismatched_episode_limit_is_rejected() {
        let env = RendezvousEnv::new(2, 5, 0);
        assert!(matches!(
            Runner::new(env, trainer(2), &buffer_config(10), runner_config()),
            Err(TrainingError::Config(_))
        ));
    }

    #[test]
    fn warmup_larger_than_capacity_is_rejected() {
        let env = RendezvousEnv::new(2, 5, 0);
        let config = RunnerConfig {
            warmup_episodes: 9,
            ..runner_config()
        };
        assert!(Runner::new(env, trainer(2), &buffer_config(5), config).is_err());
    }

    #[test]
    fn batch_larger_than_capacity_is_rejected() {
        let env = RendezvousEnv::new(2, 5, 0);
        let config = RunnerConfig {
            batch_size: 9,
            ..runner_config()
        };
        assert!(matches!(
            Runner::new(env, trainer(2), &buffer_config(5), config),
            Err(TrainingError::Config(ConfigError::InvalidValue {
                field: "batch_size",
                ..
            }))
        ));
    }

    #[test]
    fn run_keeps_training_after_buffer_fills() {
        let env = RendezvousEnv::new(2, 4, 5);
        let buffer = BufferConfig {
            capacity: 3,
            episode_limit: 4,
        };
        let config = RunnerConfig {
            episodes: 6,
            warmup_episodes: 1,
            updates_per_episode: 1,
            batch_size: 3,
            ..runner_config()
        };
        let mut runner = Runner::new(env, trainer(2), &buffer, config).unwrap();
        let curve = runner.run().unwrap();
        assert_eq!(curve.len(), 6);
        assert!(runner.buffer.is_full());
        assert_eq!(runner.trainer.num_updates(), 6);
    }
}
