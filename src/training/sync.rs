//! Target-network synchronisation and gradient diagnostics.

use tch::nn::VarStore;

use super::error::TrainingError;

/// Copies every variable of `source` into `target`.
pub fn hard_update(target: &mut VarStore, source: &VarStore) -> Result<(), TrainingError> {
    target.copy(source)?;
    Ok(())
}

/// Polyak averaging: `target ← τ · source + (1 − τ) · target`.
pub fn soft_update(target: &VarStore, source: &VarStore, tau: f64) -> Result<(), TrainingError> {
    let source_vars = source.variables();
    tch::no_grad(|| {
        for (name, mut dst) in target.variables() {
            let src = source_vars
                .get(&name)
                .ok_or_else(|| TrainingError::MissingVariable(name.clone()))?;
            let mixed = src * tau + &dst * (1.0 - tau);
            dst.copy_(&mixed);
        }
        Ok(())
    })
}

/// Global L2 norm of the current gradients of all trainable variables.
pub fn grad_norm(vs: &VarStore) -> f64 {
    tch::no_grad(|| {
        vs.trainable_variables()
            .iter()
            .map(|v| v.grad())
            .filter(|g| g.defined())
            .map(|g| g.norm().double_value(&[]).powi(2))
            .sum::<f64>()
            .sqrt()
    })
}
