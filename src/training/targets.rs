//! Shared-reward standardisation and one-step bootstrap targets.

use tch::{Kind, Tensor};

/// Added to the standard deviation before dividing.
pub const REWARD_STD_EPS: f64 = 1e-5;

/// Turns per-agent rewards into a standardised team reward.
///
/// Rewards `(B, T, N, 1)` are summed over agents, broadcast back to every
/// agent and standardised over the whole batch with the population standard
/// deviation: `(r - mean) / (std + 1e-5)`.
pub fn standardize_shared_reward(rewards: &Tensor) -> Tensor {
    let size = rewards.size();
    let team = rewards
        .sum_dim_intlist([2i64].as_slice(), true, Kind::Float)
        .expand(size.as_slice(), false);
    (&team - team.mean(Kind::Float)) / (team.std(false) + REWARD_STD_EPS)
}

/// One-step TD targets, flattened to `(B·T·N, 1)`:
/// `r + γ · V'(s', a') · (1 − done)`.
pub fn bootstrap_targets(rewards: &Tensor, next_values: &Tensor, dones: &Tensor, gamma: f64) -> Tensor {
    let not_done = dones.reshape([-1, 1]).ones_like() - dones.reshape([-1, 1]);
    rewards.reshape([-1, 1]) + next_values.reshape([-1, 1]) * gamma * not_done
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    fn tensor(values: &[f32], shape: &[i64]) -> Tensor {
        Tensor::from_slice(values).reshape(shape)
    }

    #[test]
    fn shared_reward_is_identical_across_agents() {
        let rewards = Tensor::rand([3, 4, 2, 1], (Kind::Float, Device::Cpu));
        let shared = standardize_shared_reward(&rewards);
        assert_eq!(shared.size(), &[3, 4, 2, 1]);
        let spread = (shared.select(2, 0) - shared.select(2, 1)).abs().max();
        assert!(spread.double_value(&[]) < 1e-6);
    }

    #[test]
    fn shared_reward_is_standardised() {
        let rewards = Tensor::rand([4, 5, 3, 1], (Kind::Float, Device::Cpu)) * 7.0 - 2.0;
        let shared = standardize_shared_reward(&rewards);
        assert!(shared.mean(Kind::Float).double_value(&[]).abs() < 1e-5);
        assert!((shared.std(false).double_value(&[]) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn shared_reward_sums_agents() {
        // one episode, two steps, two agents: team rewards 3 and 7
        let rewards = tensor(&[1.0, 2.0, 3.0, 4.0], &[1, 2, 2, 1]);
        let shared = standardize_shared_reward(&rewards);
        // mean 5, population std 2
        let expected = -2.0 / (2.0 + REWARD_STD_EPS);
        assert!((shared.double_value(&[0, 0, 1, 0]) - expected).abs() < 1e-6);
        assert!((shared.double_value(&[0, 1, 0, 0]) + expected).abs() < 1e-6);
    }

    #[test]
    fn constant_reward_standardises_to_zero() {
        let rewards = Tensor::ones([2, 3, 2, 1], (Kind::Float, Device::Cpu));
        let shared = standardize_shared_reward(&rewards);
        assert_eq!(shared.abs().max().double_value(&[]), 0.0);
    }

    #[test]
    fn targets_bootstrap_until_done() {
        let rewards = tensor(&[1.0, 2.0, 3.0], &[1, 3, 1, 1]);
        let next_values = tensor(&[10.0, 20.0, 30.0], &[1, 3, 1, 1]);
        let dones = tensor(&[0.0, 0.0, 1.0], &[1, 3, 1, 1]);
        let targets = bootstrap_targets(&rewards, &next_values, &dones, 0.5);

        assert_eq!(targets.size(), &[3, 1]);
        assert_eq!(targets.double_value(&[0, 0]), 6.0);
        assert_eq!(targets.double_value(&[1, 0]), 12.0);
        assert_eq!(targets.double_value(&[2, 0]), 3.0);
    }

    #[test]
    fn targets_flatten_in_batch_time_agent_order() {
        let rewards = Tensor::zeros([2, 2, 2, 1], (Kind::Float, Device::Cpu));
        let next_values = Tensor::arange(8i64, (Kind::Float, Device::Cpu)).reshape([2, 2, 2, 1]);
        let dones = Tensor::zeros([2, 2, 2, 1], (Kind::Float, Device::Cpu));
        let targets = bootstrap_targets(&rewards, &next_values, &dones, 1.0);
        // row index = ((b * T) + t) * N + agent
        assert_eq!(targets.double_value(&[5, 0]), next_values.double_value(&[1, 0, 1, 0]));
    }
}
