//! One-dimensional rendezvous task.
//!
//! Agents start at random points of the unit interval and must gather at a
//! common point. Each agent sees its own position and the offset to the
//! group centroid; the critic sees every position.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Environment, Observation, StepResult};

/// Cooperative rendezvous on `[0, 1]`.
///
/// Actions are one value in `[0, 1]` per agent, mapped to a velocity in
/// `[-max_step, max_step]` (0.5 means stand still). The per-agent reward is
/// the negative distance to the centroid after moving. The episode ends early
/// once all agents lie within `meet_radius` of the centroid.
#[derive(Debug, Clone)]
pub struct RendezvousEnv {
    positions: Vec<f32>,
    episode_limit: usize,
    max_step: f32,
    meet_radius: f32,
    t: usize,
    rng: StdRng,
    /// Sum of all agents' rewards this episode.
    pub cumulative_reward: f32,
}

impl RendezvousEnv {
    /// Observation features per agent: position, offset to centroid.
    pub const OBS_DIM: usize = 2;

    /// Creates a new environment with the given number of agents, horizon and seed.
    pub fn new(n_agents: usize, episode_limit: usize, seed: u64) -> Self {
        Self {
            positions: vec![0.5; n_agents],
            episode_limit,
            max_step: 0.1,
            meet_radius: 0.02,
            t: 0,
            rng: StdRng::seed_from_u64(seed),
            cumulative_reward: 0.0,
        }
    }

    /// Overrides the maximum displacement per step.
    pub fn with_max_step(mut self, max_step: f32) -> Self {
        self.max_step = max_step;
        self
    }

    /// Overrides the distance under which agents count as met.
    pub fn with_meet_radius(mut self, meet_radius: f32) -> Self {
        self.meet_radius = meet_radius;
        self
    }

    /// Current agent positions.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Current time step.
    pub fn time_step(&self) -> usize {
        self.t
    }

    fn centroid(&self) -> f32 {
        if self.positions.is_empty() {
            return 0.0;
        }
        self.positions.iter().sum::<f32>() / self.positions.len() as f32
    }

    fn observe(&self) -> Observation {
        let centroid = self.centroid();
        Observation {
            observations: self
                .positions
                .iter()
                .map(|&x| vec![x, centroid - x])
                .collect(),
            state: self.positions.clone(),
        }
    }
}

impl Environment for RendezvousEnv {
    fn n_agents(&self) -> usize {
        self.positions.len()
    }

    fn obs_dim(&self) -> usize {
        Self::OBS_DIM
    }

    fn state_dim(&self) -> usize {
        self.positions.len()
    }

    fn action_dim(&self) -> usize {
        1
    }

    fn is_discrete(&self) -> bool {
        false
    }

    fn episode_limit(&self) -> usize {
        self.episode_limit
    }

    fn reset(&mut self) -> Observation {
        for x in &mut self.positions {
            *x = self.rng.gen::<f32>();
        }
        self.t = 0;
        self.cumulative_reward = 0.0;
        self.observe()
    }

    fn step(&mut self, actions: &[Vec<f32>]) -> StepResult {
        debug_assert_eq!(actions.len(), self.positions.len());

        for (x, action) in self.positions.iter_mut().zip(actions) {
            let a = action.first().copied().unwrap_or(0.5).clamp(0.0, 1.0);
            *x = (*x + (2.0 * a - 1.0) * self.max_step).clamp(0.0, 1.0);
        }
        self.t += 1;

        let centroid = self.centroid();
        let rewards: Vec<f32> = self
            .positions
            .iter()
            .map(|&x| -(x - centroid).abs())
            .collect();
        self.cumulative_reward += rewards.iter().sum::<f32>();

        let met = self
            .positions
            .iter()
            .all(|&x| (x - centroid).abs() <= self.meet_radius);
        let done = met || self.t >= self.episode_limit;

        StepResult {
            observation: self.observe(),
            rewards,
            done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_observation_shapes() {
        let mut env = RendezvousEnv::new(3, 10, 1);
        let obs = env.reset();
        assert_eq!(obs.observations.len(), 3);
        assert!(obs.observations.iter().all(|o| o.len() == RendezvousEnv::OBS_DIM));
        assert_eq!(obs.state.len(), 3);
        assert!(obs.state.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn observation_offsets_point_to_centroid() {
        let mut env = RendezvousEnv::new(2, 10, 3);
        let obs = env.reset();
        let centroid = (obs.state[0] + obs.state[1]) / 2.0;
        for (o, x) in obs.observations.iter().zip(&obs.state) {
            assert!((o[0] + o[1] - centroid).abs() < 1e-6);
            assert_eq!(o[0], *x);
        }
    }

    #[test]
    fn standing_still_keeps_positions() {
        let mut env = RendezvousEnv::new(2, 10, 7);
        let before = env.reset().state;
        let result = env.step(&[vec![0.5], vec![0.5]]);
        assert_eq!(result.observation.state, before);
    }

    #[test]
    fn actions_move_by_max_step() {
        let mut env = RendezvousEnv::new(1, 10, 0).with_max_step(0.25);
        env.positions = vec![0.5];
        let result = env.step(&[vec![1.0]]);
        assert!((result.observation.state[0] - 0.75).abs() < 1e-6);
        let result = env.step(&[vec![0.0]]);
        assert!((result.observation.state[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn positions_stay_in_unit_interval() {
        let mut env = RendezvousEnv::new(1, 10, 0);
        env.positions = vec![0.95];
        let result = env.step(&[vec![1.0]]);
        assert_eq!(result.observation.state[0], 1.0);
    }

    #[test]
    fn meeting_ends_episode_early() {
        let mut env = RendezvousEnv::new(2, 50, 0).with_meet_radius(0.06);
        env.positions = vec![0.45, 0.55];
        let result = env.step(&[vec![0.5], vec![0.5]]);
        assert!(result.done);
        assert!(result.rewards.iter().all(|&r| (r + 0.05).abs() < 1e-6));
    }

    #[test]
    fn horizon_ends_episode() {
        let mut env = RendezvousEnv::new(2, 3, 0).with_meet_radius(0.0);
        env.reset();
        env.positions = vec![0.0, 1.0];
        let mut done = false;
        for _ in 0..3 {
            done = env.step(&[vec![0.5], vec![0.5]]).done;
        }
        assert!(done);
        assert_eq!(env.time_step(), 3);
    }

    #[test]
    fn cumulative_reward_sums_agent_rewards() {
        let mut env = RendezvousEnv::new(2, 10, 0).with_meet_radius(0.0);
        env.reset();
        env.positions = vec![0.2, 0.8];
        let result = env.step(&[vec![0.5], vec![0.5]]);
        let total: f32 = result.rewards.iter().sum();
        assert!((env.cumulative_reward - total).abs() < 1e-6);
        assert!((total + 0.6).abs() < 1e-6);
    }
}
