//! Evaluation metrics for multi-agent policies.
//!
//! Runs a policy for a number of episodes and aggregates team returns and
//! episode lengths.

use std::fmt;

use crate::environment::Environment;
use crate::policy::Policy;

/// Aggregated evaluation metrics over multiple episodes.
#[derive(Debug, Clone)]
pub struct EvaluationMetrics {
    /// Mean team return (sum of all agents' rewards) per episode.
    pub mean_return: f64,
    /// Population standard deviation of the team return.
    pub std_return: f64,
    /// Best team return seen.
    pub max_return: f64,
    /// Mean number of steps per episode.
    pub mean_length: f64,
    /// Fraction of episodes that ended before the horizon.
    pub early_termination_rate: f64,
    /// Number of episodes evaluated.
    pub n_episodes: usize,
}

/// Tracks per-episode statistics during evaluation.
#[derive(Debug, Default)]
struct EpisodeStats {
    team_return: f64,
    length: usize,
}

impl EvaluationMetrics {
    /// Evaluates a policy over multiple episodes and returns aggregated metrics.
    ///
    /// # Arguments
    ///
    /// * `env` - The environment to evaluate in
    /// * `policy` - The policy to evaluate
    /// * `n_episodes` - Number of episodes to run
    pub fn evaluate<E: Environment + ?Sized>(
        env: &mut E,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Self {
        let limit = env.episode_limit();
        let mut all_stats = Vec::with_capacity(n_episodes);

        for _ in 0..n_episodes {
            policy.reset();
            let mut obs = env.reset();
            let mut stats = EpisodeStats::default();

            while stats.length < limit {
                let actions = policy.select_actions(&obs.observations);
                let result = env.step(&actions);

                stats.team_return += result.rewards.iter().map(|&r| r as f64).sum::<f64>();
                stats.length += 1;
                obs = result.observation;

                if result.done {
                    break;
                }
            }

            all_stats.push(stats);
        }

        Self::from_episodes(&all_stats, limit)
    }

    fn from_episodes(all_stats: &[EpisodeStats], limit: usize) -> Self {
        let n_episodes = all_stats.len();
        if n_episodes == 0 {
            return Self {
                mean_return: 0.0,
                std_return: 0.0,
                max_return: 0.0,
                mean_length: 0.0,
                early_termination_rate: 0.0,
                n_episodes,
            };
        }

        let n = n_episodes as f64;
        let mean_return = all_stats.iter().map(|s| s.team_return).sum::<f64>() / n;
        let std_return = (all_stats
            .iter()
            .map(|s| (s.team_return - mean_return).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();
        let max_return = all_stats
            .iter()
            .map(|s| s.team_return)
            .fold(f64::NEG_INFINITY, f64::max);
        let mean_length = all_stats.iter().map(|s| s.length as f64).sum::<f64>() / n;
        let early = all_stats.iter().filter(|s| s.length < limit).count();

        Self {
            mean_return,
            std_return,
            max_return,
            mean_length,
            early_termination_rate: early as f64 / n,
            n_episodes,
        }
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes
        )?;
        writeln!(
            f,
            "  Mean team return:        {:.3} ± {:.3}",
            self.mean_return, self.std_return
        )?;
        writeln!(f, "  Best team return:        {:.3}", self.max_return)?;
        writeln!(f, "  Mean episode length:     {:.1}", self.mean_length)?;
        writeln!(
            f,
            "  Early termination:       {:.1}%",
            self.early_termination_rate * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RendezvousEnv;
    use crate::policy::RandomPolicy;

    /// Always stands still.
    struct Idle;

    impl Policy for Idle {
        fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<Vec<f32>> {
            vec![vec![0.5]; observations.len()]
        }

        fn name(&self) -> &str {
            "idle"
        }
    }

    #[test]
    fn evaluate_completes() {
        let mut env = RendezvousEnv::new(3, 10, 42);
        let mut policy = RandomPolicy::new(1, 0);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 3);
        assert_eq!(metrics.n_episodes, 3);
        assert!(metrics.mean_length <= 10.0);
        assert!(metrics.mean_return <= 0.0);
        assert!(metrics.max_return >= metrics.mean_return);
    }

    #[test]
    fn idle_policy_runs_full_horizon() {
        let mut env = RendezvousEnv::new(2, 8, 1).with_meet_radius(0.0);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut Idle, 4);
        assert_eq!(metrics.mean_length, 8.0);
        assert_eq!(metrics.early_termination_rate, 0.0);
    }

    #[test]
    fn zero_episodes_yields_zeroes() {
        let mut env = RendezvousEnv::new(2, 8, 1);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut Idle, 0);
        assert_eq!(metrics.n_episodes, 0);
        assert_eq!(metrics.mean_return, 0.0);
    }

    #[test]
    fn display_mentions_episode_count() {
        let mut env = RendezvousEnv::new(2, 4, 1);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut Idle, 2);
        assert!(metrics.to_string().contains("(2 episodes)"));
    }
}
