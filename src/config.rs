//! Configuration for the replay buffer, the MADDPG trainer and the runner.
//!
//! All structs carry defaults suitable for the small cooperative tasks used in
//! the demos. With the `serde` feature an [`ExperimentConfig`] can be loaded
//! from a JSON file.

use thiserror::Error;

/// Errors raised while validating or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// MADDPG hyperparameters and problem dimensions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MaddpgConfig {
    // --- Problem dimensions ---
    /// Number of agents N.
    pub n_agents: usize,
    /// Per-agent observation dimension.
    pub obs_dim: usize,
    /// Global state dimension (critic input).
    pub state_dim: usize,
    /// Per-agent action dimension.
    pub action_dim: usize,

    // --- Networks ---
    /// Width of the hidden layers of the default networks.
    pub hidden_dim: usize,
    /// GRU hidden size of the actor; 0 selects a feed-forward actor.
    pub rnn_hidden_dim: usize,

    // --- Optimisation ---
    /// Discount factor γ.
    pub gamma: f64,
    /// Soft target update rate τ.
    pub tau: f64,
    /// Actor learning rate.
    pub actor_lr: f64,
    /// Critic learning rate.
    pub critic_lr: f64,
    /// Maximum global gradient norm.
    pub grad_clip: f64,
    /// Soft-update the targets every this many updates.
    pub target_update_interval: u64,
    /// Weight of the squared-action penalty added to the actor loss.
    pub action_regularization: f64,

    // --- Acting ---
    /// Standard deviation of the Gaussian noise added while collecting data.
    pub exploration_noise: f64,

    /// Emit a training log event every this many updates.
    pub log_interval: u64,
}

impl MaddpgConfig {
    /// Input width of the actor: observation plus one-hot agent id.
    pub fn actor_input_dim(&self) -> usize {
        self.obs_dim + self.n_agents
    }

    /// Input width of the critic: global state, joint action and agent id.
    pub fn critic_input_dim(&self) -> usize {
        self.state_dim + self.n_agents * self.action_dim + self.n_agents
    }

    /// Checks that every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("n_agents", self.n_agents),
            ("obs_dim", self.obs_dim),
            ("state_dim", self.state_dim),
            ("action_dim", self.action_dim),
            ("hidden_dim", self.hidden_dim),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be positive"));
            }
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::invalid(
                "gamma",
                format!("{} is outside [0, 1]", self.gamma),
            ));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(ConfigError::invalid(
                "tau",
                format!("{} is outside (0, 1]", self.tau),
            ));
        }
        for (field, value) in [
            ("actor_lr", self.actor_lr),
            ("critic_lr", self.critic_lr),
            ("grad_clip", self.grad_clip),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::invalid(field, format!("{} must be positive", value)));
            }
        }
        if self.action_regularization < 0.0 {
            return Err(ConfigError::invalid(
                "action_regularization",
                "must not be negative",
            ));
        }
        if self.exploration_noise < 0.0 {
            return Err(ConfigError::invalid("exploration_noise", "must not be negative"));
        }
        if self.target_update_interval == 0 {
            return Err(ConfigError::invalid("target_update_interval", "must be positive"));
        }
        if self.log_interval == 0 {
            return Err(ConfigError::invalid("log_interval", "must be positive"));
        }
        Ok(())
    }
}

impl Default for MaddpgConfig {
    fn default() -> Self {
        Self {
            n_agents: 3,
            obs_dim: 2,
            state_dim: 3,
            action_dim: 1,
            hidden_dim: 64,
            rnn_hidden_dim: 0,
            gamma: 0.95,
            tau: 0.01,
            actor_lr: 1e-3,
            critic_lr: 1e-3,
            grad_clip: 10.0,
            target_update_interval: 1,
            action_regularization: 0.0,
            exploration_noise: 0.1,
            log_interval: 100,
        }
    }
}

/// Episode replay buffer sizing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BufferConfig {
    /// Maximum number of stored episodes.
    pub capacity: usize,
    /// Number of steps every stored episode is padded to.
    pub episode_limit: usize,
}

impl BufferConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid("capacity", "must be positive"));
        }
        if self.episode_limit == 0 {
            return Err(ConfigError::invalid("episode_limit", "must be positive"));
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            episode_limit: 25,
        }
    }
}

/// Outer training loop settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunnerConfig {
    /// Number of episodes to collect.
    pub episodes: u32,
    /// Episodes stored before the first update.
    pub warmup_episodes: usize,
    /// Gradient updates after every collected episode (once warm).
    pub updates_per_episode: u32,
    /// Episodes per sampled batch.
    pub batch_size: usize,
    /// Seed for environment resets and buffer sampling.
    pub seed: u64,
    /// Emit an episode log event every this many episodes.
    pub log_interval: u32,
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "must be positive"));
        }
        if self.warmup_episodes == 0 {
            return Err(ConfigError::invalid("warmup_episodes", "must be positive"));
        }
        if self.log_interval == 0 {
            return Err(ConfigError::invalid("log_interval", "must be positive"));
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            warmup_episodes: 32,
            updates_per_episode: 1,
            batch_size: 32,
            seed: 42,
            log_interval: 10,
        }
    }
}

/// Everything needed to run one experiment.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExperimentConfig {
    pub maddpg: MaddpgConfig,
    pub buffer: BufferConfig,
    pub runner: RunnerConfig,
}

impl ExperimentConfig {
    /// Validates every section, plus cross-section constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.maddpg.validate()?;
        self.buffer.validate()?;
        self.runner.validate()?;
        if self.runner.warmup_episodes > self.buffer.capacity {
            return Err(ConfigError::invalid(
                "warmup_episodes",
                format!(
                    "{} exceeds buffer capacity {}",
                    self.runner.warmup_episodes, self.buffer.capacity
                ),
            ));
        }
        if self.runner.batch_size > self.buffer.capacity {
            return Err(ConfigError::invalid(
                "batch_size",
                format!(
                    "{} exceeds buffer capacity {}",
                    self.runner.batch_size, self.buffer.capacity
                ),
            ));
        }
        Ok(())
    }

    /// Loads and validates a JSON configuration file. Missing fields keep
    /// their defaults.
    #[cfg(feature = "serde")]
    pub fn load_configuration(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ExperimentConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ExperimentConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn input_dims_match() {
        let cfg = MaddpgConfig {
            n_agents: 3,
            obs_dim: 4,
            state_dim: 10,
            action_dim: 2,
            ..MaddpgConfig::default()
        };
        assert_eq!(cfg.actor_input_dim(), 7);
        assert_eq!(cfg.critic_input_dim(), 10 + 6 + 3);
    }

    #[test]
    fn rejects_zero_agents() {
        let cfg = MaddpgConfig {
            n_agents: 0,
            ..MaddpgConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for `n_agents`: must be positive");
    }

    #[test]
    fn rejects_out_of_range_tau() {
        let cfg = MaddpgConfig {
            tau: 0.0,
            ..MaddpgConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { field: "tau", .. })
        ));
    }

    #[test]
    fn rejects_nan_learning_rate() {
        let cfg = MaddpgConfig {
            critic_lr: f64::NAN,
            ..MaddpgConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { field: "critic_lr", .. })
        ));
    }

    #[test]
    fn warmup_cannot_exceed_capacity() {
        let cfg = ExperimentConfig {
            buffer: BufferConfig {
                capacity: 4,
                ..BufferConfig::default()
            },
            runner: RunnerConfig {
                warmup_episodes: 8,
                ..RunnerConfig::default()
            },
            ..ExperimentConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn batch_cannot_exceed_capacity() {
        let cfg = ExperimentConfig {
            buffer: BufferConfig {
                capacity: 4,
                ..BufferConfig::default()
            },
            runner: RunnerConfig {
                warmup_episodes: 2,
                batch_size: 8,
                ..RunnerConfig::default()
            },
            ..ExperimentConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { field: "batch_size", .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn malformed_json_keeps_parser_error() {
        let path = std::env::temp_dir().join(format!("marl_ctde_bad_{}.json", std::process::id()));
        std::fs::write(&path, "{ \"maddpg\": ").unwrap();
        let result = ExperimentConfig::load_configuration(&path);
        let _ = std::fs::remove_file(&path);
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "maddpg": { "n_agents": 5, "gamma": 0.9 }, "runner": { "seed": 7 } }"#;
        let cfg: ExperimentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.maddpg.n_agents, 5);
        assert_eq!(cfg.maddpg.gamma, 0.9);
        assert_eq!(cfg.maddpg.tau, MaddpgConfig::default().tau);
        assert_eq!(cfg.runner.seed, 7);
        assert_eq!(cfg.buffer, BufferConfig::default());
    }
}
