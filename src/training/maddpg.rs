//! MADDPG trainer with centralized critics and decentralized actors.
//!
//! - One actor is shared by all agents and sees only the agent's own
//!   observation plus its one-hot id.
//! - The critic scores `(global state, joint action, agent id)` for every
//!   agent and is trained on a standardised shared team reward.
//! - Both networks have slowly tracking target copies used for bootstrapping.

use tch::{nn, nn::OptimizerConfig, Device, Kind, Tensor};
use tracing::{debug, info};

use super::error::TrainingError;
use super::shapes::{actor_inputs, critic_inputs, joint_actions, substitute_agent_actions};
use super::sync::{grad_norm, hard_update, soft_update};
use super::targets::{bootstrap_targets, standardize_shared_reward};
use super::tensors::TensorBatch;
use crate::config::MaddpgConfig;
use crate::network::{Actor, ActorNetwork, Critic, CriticNetwork, DefaultNetworks, NetworkFactory};
use crate::policy::Policy;

/// Losses and gradient norms of one [`MaddpgTrainer::update_parameters`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateStats {
    pub actor_loss: f64,
    pub critic_loss: f64,
    /// Actor gradient norm before clipping.
    pub actor_grad_norm: f64,
    /// Critic gradient norm before clipping.
    pub critic_grad_norm: f64,
}

/// MADDPG trainer.
///
/// Holds online and target copies of one shared actor and one centralized
/// critic, each online network with its own AMSGrad Adam optimizer.
pub struct MaddpgTrainer<A = ActorNetwork, C = CriticNetwork> {
    /// Online actor.
    pub actor: A,
    /// Online critic.
    pub critic: C,
    /// Target actor used for bootstrapped targets.
    pub actor_target: A,
    /// Target critic used for bootstrapped targets.
    pub critic_target: C,
    /// Hyperparameters and dimensions.
    pub config: MaddpgConfig,
    actor_opt: nn::Optimizer,
    critic_opt: nn::Optimizer,
    num_updates: u64,
    device: Device,
    /// Recurrent state carried between steps while acting.
    acting_hidden: Option<Tensor>,
    explore: bool,
}

impl MaddpgTrainer<ActorNetwork, CriticNetwork> {
    /// Creates a trainer with the default MLP/GRU networks.
    pub fn new(config: MaddpgConfig, device: Device) -> Result<Self, TrainingError> {
        let factory = DefaultNetworks {
            hidden_dim: config.hidden_dim as i64,
            rnn_hidden_dim: config.rnn_hidden_dim as i64,
        };
        Self::from_factory(config, &factory, device)
    }
}

impl<A: Actor, C: Critic> MaddpgTrainer<A, C> {
    /// Creates a trainer whose four networks come from `factory`.
    pub fn from_factory<F>(
        config: MaddpgConfig,
        factory: &F,
        device: Device,
    ) -> Result<Self, TrainingError>
    where
        F: NetworkFactory<Actor = A, Critic = C>,
    {
        config.validate()?;
        let actor_in = config.actor_input_dim() as i64;
        let critic_in = config.critic_input_dim() as i64;
        let action_dim = config.action_dim as i64;

        Self::with_networks(
            config,
            factory.actor(actor_in, action_dim, device),
            factory.critic(critic_in, device),
            factory.actor(actor_in, action_dim, device),
            factory.critic(critic_in, device),
            device,
        )
    }

    /// Creates a trainer from explicit networks. Target weights are
    /// overwritten with the online weights.
    pub fn with_networks(
        config: MaddpgConfig,
        actor: A,
        critic: C,
        mut actor_target: A,
        mut critic_target: C,
        device: Device,
    ) -> Result<Self, TrainingError> {
        config.validate()?;

        let actor_opt = nn::Adam {
            amsgrad: true,
            ..Default::default()
        }
        .build(actor.var_store(), config.actor_lr)?;
        let critic_opt = nn::Adam {
            amsgrad: true,
            ..Default::default()
        }
        .build(critic.var_store(), config.critic_lr)?;

        hard_update(actor_target.var_store_mut(), actor.var_store())?;
        hard_update(critic_target.var_store_mut(), critic.var_store())?;

        Ok(Self {
            actor,
            critic,
            actor_target,
            critic_target,
            config,
            actor_opt,
            critic_opt,
            num_updates: 0,
            device,
            acting_hidden: None,
            explore: true,
        })
    }

    /// Number of completed [`update_parameters`](Self::update_parameters) calls.
    pub fn num_updates(&self) -> u64 {
        self.num_updates
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Enables or disables exploration noise while acting.
    pub fn set_exploration(&mut self, explore: bool) {
        self.explore = explore;
    }

    /// Runs one actor step followed by one critic step.
    pub fn update_parameters(&mut self, batch: &TensorBatch) -> Result<UpdateStats, TrainingError> {
        batch.validate(&self.config)?;

        let (actor_loss, actor_grad_norm) = self.train_actor(batch)?;
        let (critic_loss, critic_grad_norm) = self.train_critic(batch)?;
        self.num_updates += 1;

        Ok(UpdateStats {
            actor_loss,
            critic_loss,
            actor_grad_norm,
            critic_grad_norm,
        })
    }

    fn train_actor(&mut self, batch: &TensorBatch) -> Result<(f64, f64), TrainingError> {
        let loss = self.actor_loss(batch);

        self.actor_opt.zero_grad();
        loss.backward();
        let norm = grad_norm(self.actor.var_store());
        self.actor_opt.clip_grad_norm(self.config.grad_clip);
        self.actor_opt.step();

        if self.num_updates % self.config.target_update_interval == 0 {
            soft_update(
                self.actor_target.var_store(),
                self.actor.var_store(),
                self.config.tau,
            )?;
        }

        let loss = loss.double_value(&[]);
        if self.num_updates % self.config.log_interval == 0 {
            info!(
                target: "marl_ctde::training",
                update = self.num_updates,
                actor_loss = loss,
                grad_norm = norm,
                "actor step"
            );
        }
        Ok((loss, norm))
    }

    fn train_critic(&mut self, batch: &TensorBatch) -> Result<(f64, f64), TrainingError> {
        let loss = self.critic_loss(batch);

        self.critic_opt.zero_grad();
        loss.backward();
        let norm = grad_norm(self.critic.var_store());
        self.critic_opt.clip_grad_norm(self.config.grad_clip);
        self.critic_opt.step();

        if self.num_updates % self.config.target_update_interval == 0 {
            soft_update(
                self.critic_target.var_store(),
                self.critic.var_store(),
                self.config.tau,
            )?;
        }

        let loss = loss.double_value(&[]);
        if self.num_updates % self.config.log_interval == 0 {
            info!(
                target: "marl_ctde::training",
                update = self.num_updates,
                critic_loss = loss,
                grad_norm = norm,
                "critic step"
            );
        }
        Ok((loss, norm))
    }

    /// Deterministic policy gradient loss through the centralized critic.
    ///
    /// Each agent's critic row only differentiates through that agent's own
    /// action; see [`substitute_agent_actions`].
    pub fn actor_loss(&self, batch: &TensorBatch) -> Tensor {
        let n = self.config.n_agents as i64;
        let actions = self.unroll_actions(&batch.observations, false);
        let joint = substitute_agent_actions(&actions, n);
        let values = self
            .critic
            .forward(&critic_inputs(&batch.states, &joint, n))
            .reshape([-1, 1]);

        let loss = -values.mean(Kind::Float);
        if self.config.action_regularization > 0.0 {
            loss + actions.square().mean(Kind::Float) * self.config.action_regularization
        } else {
            loss
        }
    }

    /// Mean squared error against standardised shared-reward TD targets.
    pub fn critic_loss(&self, batch: &TensorBatch) -> Tensor {
        let n = self.config.n_agents as i64;

        let targets = tch::no_grad(|| {
            let next_actions = self.unroll_actions(&batch.next_observations, true);
            let next_inputs = critic_inputs(&batch.next_states, &joint_actions(&next_actions, n), n);
            let next_values = self.critic_target.forward(&next_inputs);
            let rewards = standardize_shared_reward(&batch.rewards);
            bootstrap_targets(&rewards, &next_values, &batch.dones, self.config.gamma)
        });

        let joint = joint_actions(&batch.actions, n).detach();
        let values = self
            .critic
            .forward(&critic_inputs(&batch.states, &joint, n))
            .reshape([-1, 1]);
        (values - targets.detach()).square().mean(Kind::Float)
    }

    /// Runs the online or target actor over every time step.
    ///
    /// `observations` is `(B, T, N, O)`; returns actions `(B, T, N, A)`
    /// clipped to `[0, 1]`. The recurrent state starts at zero for every
    /// unroll. Target actions are detached.
    pub fn unroll_actions(&self, observations: &Tensor, use_target: bool) -> Tensor {
        if use_target {
            unroll(&self.actor_target, observations, self.config.n_agents as i64).detach()
        } else {
            unroll(&self.actor, observations, self.config.n_agents as i64)
        }
    }
}

/// Feeds `(B·N, O + N)` inputs to `actor` one time step at a time.
fn unroll<A: Actor>(actor: &A, observations: &Tensor, n_agents: i64) -> Tensor {
    let size = observations.size();
    let (b, t) = (size[0], size[1]);
    let inputs = actor_inputs(observations, n_agents);
    let width = inputs.size()[3];

    let recurrent = actor.rnn_hidden_dim() > 0;
    let mut hidden: Option<Tensor> = None;
    let mut steps = Vec::with_capacity(t as usize);
    for step in 0..t {
        let step_inputs = inputs.select(1, step).reshape([b * n_agents, width]);
        let (actions, next_hidden) = actor.forward(&step_inputs, hidden.as_ref());
        hidden = next_hidden;
        steps.push(actions.reshape([b, n_agents, -1]).clamp(0.0, 1.0));
    }
    debug!(
        target: "marl_ctde::training",
        batch = b,
        steps = t,
        recurrent,
        "unrolled actor"
    );
    Tensor::stack(&steps, 1)
}

impl<A: Actor, C: Critic> Policy for MaddpgTrainer<A, C> {
    fn reset(&mut self) {
        self.acting_hidden = None;
    }

    /// Acts for every agent from its own observation; adds clipped Gaussian
    /// noise when exploration is on.
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<Vec<f32>> {
        debug_assert_eq!(observations.len(), self.config.n_agents);
        let n = observations.len() as i64;
        if n == 0 {
            return Vec::new();
        }
        debug_assert!(observations.iter().all(|o| o.len() == self.config.obs_dim));
        let obs_dim = observations[0].len() as i64;
        let flat: Vec<f32> = observations.iter().flatten().copied().collect();
        let obs = Tensor::from_slice(&flat)
            .reshape([1, 1, n, obs_dim])
            .to_device(self.device);
        let inputs = actor_inputs(&obs, n).reshape([n, -1]);

        let actions = tch::no_grad(|| {
            let (actions, hidden) = self.actor.forward(&inputs, self.acting_hidden.as_ref());
            self.acting_hidden = hidden;
            let actions = actions.clamp(0.0, 1.0);
            if self.explore && self.config.exploration_noise > 0.0 {
                (&actions + actions.randn_like() * self.config.exploration_noise).clamp(0.0, 1.0)
            } else {
                actions
            }
        })
        .to_device(Device::Cpu);

        let action_dim = actions.size()[1];
        (0..n)
            .map(|i| {
                (0..action_dim)
                    .map(|k| actions.double_value(&[i, k]) as f32)
                    .collect()
            })
            .collect()
    }

    fn name(&self) -> &str {
        "maddpg"
    }
}
