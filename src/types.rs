//! Core data types shared by the buffer, environments and trainer.

/// A single environment step for all agents.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Per-agent observations before the step.
    pub observations: Vec<Vec<f32>>,
    /// Per-agent observations after the step.
    pub next_observations: Vec<Vec<f32>>,
    /// Global state before the step (for the centralized critic).
    pub state: Vec<f32>,
    /// Global state after the step.
    pub next_state: Vec<f32>,
    /// Per-agent actions (one-hot for discrete environments).
    pub actions: Vec<Vec<f32>>,
    /// Per-agent rewards.
    pub rewards: Vec<f32>,
    /// Whether this step ended the episode.
    pub done: bool,
}

/// One episode, ordered by time step.
pub type Trajectory = Vec<Transition>;

/// Per-step dimensions every stored transition must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionShape {
    pub n_agents: usize,
    pub obs_dim: usize,
    pub state_dim: usize,
    pub action_dim: usize,
}

impl TransitionShape {
    pub fn new(n_agents: usize, obs_dim: usize, state_dim: usize, action_dim: usize) -> Self {
        Self {
            n_agents,
            obs_dim,
            state_dim,
            action_dim,
        }
    }

    /// Returns the name, expected length and actual length of the first field
    /// of `transition` that does not fit this shape.
    pub fn mismatch(&self, transition: &Transition) -> Option<(&'static str, usize, usize)> {
        let per_agent = [
            ("observations", &transition.observations, self.obs_dim),
            ("next_observations", &transition.next_observations, self.obs_dim),
            ("actions", &transition.actions, self.action_dim),
        ];
        for (field, rows, width) in per_agent {
            if rows.len() != self.n_agents {
                return Some((field, self.n_agents, rows.len()));
            }
            if let Some(row) = rows.iter().find(|row| row.len() != width) {
                return Some((field, width, row.len()));
            }
        }
        if transition.state.len() != self.state_dim {
            return Some(("state", self.state_dim, transition.state.len()));
        }
        if transition.next_state.len() != self.state_dim {
            return Some(("next_state", self.state_dim, transition.next_state.len()));
        }
        if transition.rewards.len() != self.n_agents {
            return Some(("rewards", self.n_agents, transition.rewards.len()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(shape: TransitionShape) -> Transition {
        Transition {
            observations: vec![vec![0.0; shape.obs_dim]; shape.n_agents],
            next_observations: vec![vec![0.0; shape.obs_dim]; shape.n_agents],
            state: vec![0.0; shape.state_dim],
            next_state: vec![0.0; shape.state_dim],
            actions: vec![vec![0.0; shape.action_dim]; shape.n_agents],
            rewards: vec![0.0; shape.n_agents],
            done: false,
        }
    }

    #[test]
    fn matching_transition_has_no_mismatch() {
        let shape = TransitionShape::new(2, 3, 4, 1);
        assert_eq!(shape.mismatch(&transition(shape)), None);
    }

    #[test]
    fn reports_short_action_row() {
        let shape = TransitionShape::new(2, 3, 4, 2);
        let mut t = transition(shape);
        t.actions[1].pop();
        assert_eq!(shape.mismatch(&t), Some(("actions", 2, 1)));
    }

    #[test]
    fn reports_missing_agent_reward() {
        let shape = TransitionShape::new(3, 1, 1, 1);
        let mut t = transition(shape);
        t.rewards.truncate(2);
        assert_eq!(shape.mismatch(&t), Some(("rewards", 3, 2)));
    }
}
