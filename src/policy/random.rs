//! Uniform random baseline policy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::Policy;

/// Samples every action entry uniformly from `[0, 1)`.
#[derive(Debug)]
pub struct RandomPolicy {
    action_dim: usize,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(action_dim: usize, seed: u64) -> Self {
        Self {
            action_dim,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<Vec<f32>> {
        observations
            .iter()
            .map(|_| (0..self.action_dim).map(|_| self.rng.gen::<f32>()).collect())
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}
