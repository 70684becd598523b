// Evaluate a uniformly random policy on the rendezvous task.
//
//   cargo run --example random_rendezvous -- --agents 3 --episodes 50

use std::env;

use marl_ctde::{EvaluationMetrics, Policy, RandomPolicy, RendezvousEnv};

fn main() {
    let args: Vec<String> = env::args().collect();
    let agents: usize = arg_value(&args, "--agents")
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(25);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let mut env = RendezvousEnv::new(agents, 25, seed);
    let mut policy = RandomPolicy::new(1, seed);

    let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, episodes);
    println!("Policy: {}", policy.name());
    println!("{}", metrics);
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
