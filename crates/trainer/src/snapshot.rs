use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use tch::{nn, Tensor};

/// A deep copy of a var-store's named weights, decoupled from the live model
/// so later optimizer steps cannot mutate it.
#[derive(Debug)]
pub struct WeightSnapshot {
    tensors: BTreeMap<String, Tensor>,
}

impl WeightSnapshot {
    pub fn capture(vs: &nn::VarStore) -> Self {
        let tensors = vs
            .variables()
            .into_iter()
            .map(|(name, tensor)| (name, tensor.detach().copy()))
            .collect();
        Self { tensors }
    }

    /// Copies the stored weights back into the var-store's variables.
    pub fn apply(&self, vs: &nn::VarStore) -> Result<()> {
        tch::no_grad(|| {
            for (name, variable) in vs.variables() {
                let saved = self
                    .tensors
                    .get(&name)
                    .ok_or_else(|| anyhow!("snapshot has no tensor named {name}"))?;
                let mut variable = variable;
                variable.copy_(saved);
            }
            Ok(())
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let named: Vec<(&str, &Tensor)> = self
            .tensors
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor))
            .collect();
        Tensor::save_multi(&named, path)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}
