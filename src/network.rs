//! Actor and critic networks using tch-rs (PyTorch bindings).
//!
//! The trainer only depends on the [`Actor`] and [`Critic`] traits; the MLP
//! and GRU networks here are the defaults. This module is only available with
//! the `nn` feature.

use tch::nn::{self, Module, RNN};
use tch::{Device, Kind, Tensor};

/// A decentralized actor shared by all agents.
///
/// Inputs are flattened over batch and agents: `(M, obs_dim + n_agents)`.
pub trait Actor {
    /// Returns actions `(M, action_dim)` and, for recurrent actors, the next
    /// hidden state `(M, rnn_hidden_dim)`.
    ///
    /// A `None` hidden state is treated as zeros.
    fn forward(&self, inputs: &Tensor, hidden: Option<&Tensor>) -> (Tensor, Option<Tensor>);

    /// Width of the recurrent state, 0 for feed-forward actors.
    fn rnn_hidden_dim(&self) -> i64;

    fn var_store(&self) -> &nn::VarStore;

    fn var_store_mut(&mut self) -> &mut nn::VarStore;
}

/// A centralized critic scoring `(state, joint action, agent id)` inputs.
pub trait Critic {
    /// Maps `(..., critic_input_dim)` to `(..., 1)`.
    fn forward(&self, inputs: &Tensor) -> Tensor;

    fn var_store(&self) -> &nn::VarStore;

    fn var_store_mut(&mut self) -> &mut nn::VarStore;
}

/// Builds the networks of a trainer. Called four times: online and target
/// copies of each network.
pub trait NetworkFactory {
    type Actor: Actor;
    type Critic: Critic;

    fn actor(&self, input_dim: i64, action_dim: i64, device: Device) -> Self::Actor;

    fn critic(&self, input_dim: i64, device: Device) -> Self::Critic;
}

/// Builds [`ActorNetwork`] and [`CriticNetwork`].
#[derive(Debug, Clone, Copy)]
pub struct DefaultNetworks {
    pub hidden_dim: i64,
    pub rnn_hidden_dim: i64,
}

impl NetworkFactory for DefaultNetworks {
    type Actor = ActorNetwork;
    type Critic = CriticNetwork;

    fn actor(&self, input_dim: i64, action_dim: i64, device: Device) -> ActorNetwork {
        ActorNetwork::new(
            input_dim,
            action_dim,
            self.hidden_dim,
            self.rnn_hidden_dim,
            device,
        )
    }

    fn critic(&self, input_dim: i64, device: Device) -> CriticNetwork {
        CriticNetwork::new(input_dim, self.hidden_dim, device)
    }
}

/// Actor network with sigmoid outputs in `[0, 1]`.
///
/// Architecture: `in → hidden → hidden → action_dim` with ReLU activations,
/// or `in → hidden → GRU(rnn_hidden) → action_dim` when `rnn_hidden_dim > 0`.
pub struct ActorNetwork {
    vs: nn::VarStore,
    encoder: nn::Sequential,
    gru: Option<nn::GRU>,
    head: nn::Linear,
    rnn_hidden_dim: i64,
}

impl ActorNetwork {
    /// Creates a new actor network.
    pub fn new(
        input_dim: i64,
        action_dim: i64,
        hidden_dim: i64,
        rnn_hidden_dim: i64,
        device: Device,
    ) -> Self {
        let vs = nn::VarStore::new(device);
        let p = &vs.root();
        let mut encoder = nn::seq()
            .add(nn::linear(p / "l1", input_dim, hidden_dim, Default::default()))
            .add_fn(|x| x.relu());

        let (gru, head) = if rnn_hidden_dim > 0 {
            let gru = nn::gru(p / "gru", hidden_dim, rnn_hidden_dim, Default::default());
            let head = nn::linear(p / "out", rnn_hidden_dim, action_dim, Default::default());
            (Some(gru), head)
        } else {
            encoder = encoder
                .add(nn::linear(p / "l2", hidden_dim, hidden_dim, Default::default()))
                .add_fn(|x| x.relu());
            let head = nn::linear(p / "out", hidden_dim, action_dim, Default::default());
            (None, head)
        };

        Self {
            vs,
            encoder,
            gru,
            head,
            rnn_hidden_dim: rnn_hidden_dim.max(0),
        }
    }
}

impl Actor for ActorNetwork {
    fn forward(&self, inputs: &Tensor, hidden: Option<&Tensor>) -> (Tensor, Option<Tensor>) {
        let x = self.encoder.forward(inputs);
        match &self.gru {
            Some(gru) => {
                let h = match hidden {
                    Some(h) => h.unsqueeze(0),
                    None => Tensor::zeros(
                        [1, x.size()[0], self.rnn_hidden_dim],
                        (Kind::Float, x.device()),
                    ),
                };
                let next = gru.step(&x, &nn::GRUState(h)).0.squeeze_dim(0);
                (self.head.forward(&next).sigmoid(), Some(next))
            }
            None => (self.head.forward(&x).sigmoid(), None),
        }
    }

    fn rnn_hidden_dim(&self) -> i64 {
        self.rnn_hidden_dim
    }

    fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }
}

/// MLP critic network.
///
/// Architecture: `in → hidden → hidden → 1` with ReLU activations.
pub struct CriticNetwork {
    vs: nn::VarStore,
    net: nn::Sequential,
}

impl CriticNetwork {
    /// Creates a new critic network.
    pub fn new(input_dim: i64, hidden_dim: i64, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let p = &vs.root();
        let net = nn::seq()
            .add(nn::linear(p / "l1", input_dim, hidden_dim, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(p / "l2", hidden_dim, hidden_dim, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(p / "l3", hidden_dim, 1, Default::default()));

        Self { vs, net }
    }
}

impl Critic for CriticNetwork {
    fn forward(&self, inputs: &Tensor) -> Tensor {
        self.net.forward(inputs)
    }

    fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_forward_shape() {
        let actor = ActorNetwork::new(7, 2, 16, 0, Device::Cpu);
        let inputs = Tensor::randn([12, 7], (Kind::Float, Device::Cpu));
        let (actions, hidden) = actor.forward(&inputs, None);
        assert_eq!(actions.size(), &[12, 2]);
        assert!(hidden.is_none());
        assert_eq!(actor.rnn_hidden_dim(), 0);
    }

    #[test]
    fn actor_outputs_are_in_unit_interval() {
        let actor = ActorNetwork::new(3, 4, 8, 0, Device::Cpu);
        let inputs = Tensor::randn([5, 3], (Kind::Float, Device::Cpu)) * 10.0;
        let (actions, _) = actor.forward(&inputs, None);
        assert!(actions.min().double_value(&[]) >= 0.0);
        assert!(actions.max().double_value(&[]) <= 1.0);
    }

    #[test]
    fn recurrent_actor_carries_hidden_state() {
        let actor = ActorNetwork::new(5, 3, 16, 8, Device::Cpu);
        let inputs = Tensor::randn([4, 5], (Kind::Float, Device::Cpu));
        let (a1, h1) = actor.forward(&inputs, None);
        let h1 = h1.expect("recurrent actor returns a hidden state");
        assert_eq!(a1.size(), &[4, 3]);
        assert_eq!(h1.size(), &[4, 8]);

        let (a2, h2) = actor.forward(&inputs, Some(&h1));
        assert_eq!(h2.map(|h| h.size()), Some(vec![4, 8]));
        // same input, different memory
        assert!(f64::try_from((a1 - a2).abs().sum(Kind::Float)).unwrap() > 0.0);
    }

    #[test]
    fn critic_forward_shape() {
        let critic = CriticNetwork::new(10, 16, Device::Cpu);
        let inputs = Tensor::randn([2, 3, 4, 10], (Kind::Float, Device::Cpu));
        assert_eq!(critic.forward(&inputs).size(), &[2, 3, 4, 1]);
    }

    #[test]
    fn factory_builds_matching_variable_sets() {
        let factory = DefaultNetworks {
            hidden_dim: 8,
            rnn_hidden_dim: 4,
        };
        let a = factory.actor(3, 2, Device::Cpu);
        let b = factory.actor(3, 2, Device::Cpu);
        let mut names_a: Vec<_> = a.var_store().variables().into_keys().collect();
        let mut names_b: Vec<_> = b.var_store().variables().into_keys().collect();
        names_a.sort();
        names_b.sort();
        assert_eq!(names_a, names_b);
    }
}
