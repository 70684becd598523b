// Train MADDPG on the rendezvous task and compare it with a random policy.
//
//   RUST_LOG=info cargo run --features nn --example maddpg_rendezvous -- --episodes 300
//   cargo run --features nn,serde --example maddpg_rendezvous -- --config experiment.json

#[cfg(feature = "nn")]
fn main() {
    use std::env;

    use marl_ctde::telemetry::init_tracing;
    use marl_ctde::{
        EvaluationMetrics, ExperimentConfig, MaddpgConfig, MaddpgTrainer, Policy, RandomPolicy,
        RendezvousEnv, Runner,
    };
    use tch::Device;

    if let Err(err) = init_tracing() {
        eprintln!("{err}");
    }

    let args: Vec<String> = env::args().collect();
    let mut config = load_config(&args);
    if let Some(episodes) = arg_value(&args, "--episodes").and_then(|s| s.parse().ok()) {
        config.runner.episodes = episodes;
    }
    let agents = config.maddpg.n_agents;
    config.maddpg = MaddpgConfig {
        obs_dim: RendezvousEnv::OBS_DIM,
        state_dim: agents,
        action_dim: 1,
        ..config.maddpg
    };
    if let Err(err) = config.validate() {
        eprintln!("Invalid configuration: {err}");
        std::process::exit(2);
    }

    let seed = config.runner.seed;
    let limit = config.buffer.episode_limit;
    let trainer = match MaddpgTrainer::new(config.maddpg.clone(), Device::cuda_if_available()) {
        Ok(trainer) => trainer,
        Err(err) => {
            eprintln!("Failed to build trainer: {err}");
            std::process::exit(1);
        }
    };
    let env = RendezvousEnv::new(agents, limit, seed);
    let mut runner = match Runner::new(env, trainer, &config.buffer, config.runner.clone()) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("Failed to build runner: {err}");
            std::process::exit(1);
        }
    };
    let curve = match runner.run() {
        Ok(curve) => curve,
        Err(err) => {
            eprintln!("Training failed: {err}");
            std::process::exit(1);
        }
    };

    let tail = curve.len().min(20).max(1);
    let recent = curve.iter().rev().take(tail).map(|(_, r)| r).sum::<f64>() / tail as f64;
    println!("Mean team return over last {tail} training episodes: {recent:.3}");

    let mut eval_env = RendezvousEnv::new(agents, limit, seed + 1);
    runner.trainer.set_exploration(false);
    let trained = EvaluationMetrics::evaluate(&mut eval_env, &mut runner.trainer, 50);
    let mut random = RandomPolicy::new(1, seed + 1);
    let baseline = EvaluationMetrics::evaluate(&mut eval_env, &mut random, 50);

    println!("Policy: {}", runner.trainer.name());
    println!("{}", trained);
    println!("Policy: {}", random.name());
    println!("{}", baseline);

    fn load_config(args: &[String]) -> ExperimentConfig {
        #[cfg(feature = "serde")]
        if let Some(path) = arg_value(args, "--config") {
            match ExperimentConfig::load_configuration(std::path::Path::new(path)) {
                Ok(config) => return config,
                Err(err) => {
                    eprintln!("Failed to load {path}: {err}");
                    std::process::exit(2);
                }
            }
        }
        let _ = args;
        ExperimentConfig::default()
    }
}

#[cfg(not(feature = "nn"))]
fn main() {
    eprintln!(
        "This example requires the 'nn' feature.\n\
Run:\n\
  cargo run --features nn --example maddpg_rendezvous -- --episodes 300"
    );
}

#[cfg(feature = "nn")]
fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
