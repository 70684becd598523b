//! marl_ctde - multi-agent reinforcement learning with centralized training
//! and decentralized execution.
//!
//! The crate provides a QMIX-style episode replay buffer, a small
//! environment interface with a built-in rendezvous task, evaluation
//! metrics and, behind the `nn` feature, a MADDPG trainer whose shared actor
//! acts on local observations while a centralized critic scores the global
//! state and the joint action.

pub mod buffer;
pub mod config;
pub mod environment;
pub mod metrics;
pub mod policy;
pub mod telemetry;
pub mod types;

#[cfg(feature = "nn")]
pub mod network;
#[cfg(feature = "nn")]
pub mod training;

pub use buffer::{pad_episode, BufferError, EpisodeBatch, EpisodeBuffer, SampledBatch};
pub use config::{BufferConfig, ConfigError, ExperimentConfig, MaddpgConfig, RunnerConfig};
pub use environment::{EnvConstructor, Environment, Observation, RendezvousEnv, StepResult};
pub use metrics::EvaluationMetrics;
pub use policy::{Policy, RandomPolicy};
pub use types::{Trajectory, Transition, TransitionShape};

#[cfg(feature = "nn")]
pub use network::{Actor, ActorNetwork, Critic, CriticNetwork, DefaultNetworks, NetworkFactory};
#[cfg(feature = "nn")]
pub use training::{MaddpgTrainer, Runner, TensorBatch, TrainingError, UpdateStats};
