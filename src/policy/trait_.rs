//! Policy trait for decentralized execution.

/// A policy that picks an action vector for every agent from that agent's
/// own observation.
pub trait Policy {
    /// Clears any per-episode state, such as recurrent hidden states.
    fn reset(&mut self) {}

    /// Selects one action vector per agent.
    ///
    /// # Arguments
    ///
    /// * `observations` - Per-agent observation vectors
    ///
    /// # Returns
    ///
    /// A vector of actions, one per agent, each with entries in `[0, 1]`.
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<Vec<f32>>;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
