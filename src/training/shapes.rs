//! Input assembly for the decentralized actors and the centralized critic.
//!
//! Every helper works on `[batch, time, agent, feature]` tensors. With `N`
//! agents of action width `A`, the critic row of agent `i` is
//! `[state | a_0 .. a_{N-1} | one_hot(i)]`.

use tch::{Kind, Tensor};

/// One-hot agent ids expanded to `(B, T, N, N)`.
pub fn agent_ids(batch: i64, steps: i64, n_agents: i64, like: &Tensor) -> Tensor {
    Tensor::eye(n_agents, (Kind::Float, like.device())).expand([batch, steps, n_agents, n_agents], false)
}

/// Appends the agent id to each observation: `(B, T, N, O)` → `(B, T, N, O + N)`.
pub fn actor_inputs(observations: &Tensor, n_agents: i64) -> Tensor {
    let size = observations.size();
    let ids = agent_ids(size[0], size[1], n_agents, observations);
    Tensor::cat(&[observations.shallow_clone(), ids], 3)
}

/// Gives every agent the joint action: `(B, T, N, A)` → `(B, T, N, N·A)`.
pub fn joint_actions(actions: &Tensor, n_agents: i64) -> Tensor {
    let size = actions.size();
    let (b, t, a) = (size[0], size[1], size[3]);
    actions
        .reshape([b, t, 1, n_agents * a])
        .expand([b, t, n_agents, n_agents * a], false)
}

/// Joint actions where row `i` only differentiates through agent `i`'s own
/// action; the other agents' chunks are detached.
///
/// Forward values equal [`joint_actions`]. This is what lets each agent's
/// policy gradient flow through its own action alone while the critic still
/// conditions on everyone's current policy outputs.
pub fn substitute_agent_actions(actions: &Tensor, n_agents: i64) -> Tensor {
    let action_dim = actions.size()[3];
    let live = joint_actions(actions, n_agents);
    let frozen = live.detach();
    // (N, N·A): row i is 1 on agent i's action chunk
    let own = Tensor::eye(n_agents, (Kind::Float, actions.device()))
        .unsqueeze(-1)
        .expand([n_agents, n_agents, action_dim], false)
        .reshape([n_agents, n_agents * action_dim]);
    let others = own.ones_like() - &own;
    &live * &own + &frozen * &others
}

/// Builds critic inputs `(B, T, N, S + N·A + N)` from a `(B, T, 1, S)` state
/// and `(B, T, N, N·A)` joint actions.
pub fn critic_inputs(states: &Tensor, joint_actions: &Tensor, n_agents: i64) -> Tensor {
    let size = states.size();
    let (b, t, s) = (size[0], size[1], size[3]);
    let states = states.expand([b, t, n_agents, s], false);
    let ids = agent_ids(b, t, n_agents, joint_actions);
    Tensor::cat(&[states, joint_actions.shallow_clone(), ids], 3)
}
