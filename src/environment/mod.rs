//! Environment interface used for data collection.
//!
//! Any cooperative multi-agent task can be trained once it implements
//! [`Environment`]. [`RendezvousEnv`] is a small built-in task used by the
//! demos and tests.

pub mod rendezvous;

pub use rendezvous::RendezvousEnv;

/// What the agents and the critic see at one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Per-agent local observations.
    pub observations: Vec<Vec<f32>>,
    /// Global state for the centralized critic.
    pub state: Vec<f32>,
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Observation after the step.
    pub observation: Observation,
    /// Per-agent rewards.
    pub rewards: Vec<f32>,
    /// Whether the episode is over (goal reached or horizon hit).
    pub done: bool,
}

/// A cooperative multi-agent environment with a fixed number of agents.
///
/// # Lifecycle
///
/// 1. Call [`Environment::reset`] to start an episode.
/// 2. Call [`Environment::step`] with one action vector per agent until `done`.
pub trait Environment {
    fn n_agents(&self) -> usize;

    fn obs_dim(&self) -> usize;

    fn state_dim(&self) -> usize;

    /// Length of each agent's action vector.
    fn action_dim(&self) -> usize;

    /// Whether actions are one-hot encodings of discrete choices.
    fn is_discrete(&self) -> bool;

    /// Maximum number of steps per episode.
    fn episode_limit(&self) -> usize;

    fn reset(&mut self) -> Observation;

    fn step(&mut self, actions: &[Vec<f32>]) -> StepResult;
}

/// Builds environments of one kind and exposes their dimensions.
///
/// A throwaway instance is created up front so the dimensions are known
/// before any training component is sized.
#[derive(Debug, Clone)]
pub struct EnvConstructor<F> {
    factory: F,
    n_agents: usize,
    is_discrete: bool,
    obs_dim: usize,
    state_dim: usize,
    action_dim: usize,
    episode_limit: usize,
}

impl<E, F> EnvConstructor<F>
where
    E: Environment,
    F: Fn(usize, u64) -> E,
{
    /// # Arguments
    ///
    /// * `factory` - Builds an environment from `(n_agents, seed)`
    /// * `n_agents` - Number of agents in every built environment
    pub fn new(factory: F, n_agents: usize) -> Self {
        let dummy = factory(n_agents, 0);
        Self {
            n_agents: dummy.n_agents(),
            is_discrete: dummy.is_discrete(),
            obs_dim: dummy.obs_dim(),
            state_dim: dummy.state_dim(),
            action_dim: dummy.action_dim(),
            episode_limit: dummy.episode_limit(),
            factory,
        }
    }

    /// Builds a fresh environment seeded with `seed`.
    pub fn make_env(&self, seed: u64) -> E {
        (self.factory)(self.n_agents, seed)
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    pub fn is_discrete(&self) -> bool {
        self.is_discrete
    }

    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn episode_limit(&self) -> usize {
        self.episode_limit
    }

    /// Dimensions of the transitions produced by built environments.
    pub fn transition_shape(&self) -> crate::types::TransitionShape {
        crate::types::TransitionShape::new(
            self.n_agents,
            self.obs_dim,
            self.state_dim,
            self.action_dim,
        )
    }
}
