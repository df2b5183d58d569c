use anyhow::Result;
use log::info;
use tch::nn::{self, OptimizerConfig};
use vision_core::OptimizerType;

/// Optimizer hyperparameters with the conventional defaults.
///
/// Parameters a given optimizer does not use are ignored by it: `momentum`
/// only applies to SGD and RMSProp, `alpha` to RMSProp, `betas` to Adam/AdamW.
#[derive(Debug, Clone, Copy)]
pub struct Hyperparameters {
    pub lr: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub alpha: f64,
    pub betas: (f64, f64),
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            momentum: 0.9,
            weight_decay: 0.0,
            alpha: 0.99,
            betas: (0.9, 0.999),
        }
    }
}

/// Builds an optimizer over the var-store's trainable variables.
pub fn get_optimizer(
    vs: &nn::VarStore,
    kind: OptimizerType,
    hp: &Hyperparameters,
) -> Result<nn::Optimizer> {
    info!("Creating optimizer: {}", kind);
    let optimizer = match kind {
        OptimizerType::Sgd => nn::Sgd {
            momentum: hp.momentum,
            wd: hp.weight_decay,
            ..Default::default()
        }
        .build(vs, hp.lr)?,
        OptimizerType::RmsProp => nn::RmsProp {
            alpha: hp.alpha,
            momentum: hp.momentum,
            wd: hp.weight_decay,
            ..Default::default()
        }
        .build(vs, hp.lr)?,
        OptimizerType::Adam => nn::Adam {
            beta1: hp.betas.0,
            beta2: hp.betas.1,
            wd: hp.weight_decay,
            ..Default::default()
        }
        .build(vs, hp.lr)?,
        OptimizerType::AdamW => nn::AdamW {
            beta1: hp.betas.0,
            beta2: hp.betas.1,
            wd: hp.weight_decay,
            ..Default::default()
        }
        .build(vs, hp.lr)?,
    };
    Ok(optimizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn every_kind_builds() {
        let hp = Hyperparameters::default();
        for kind in [
            OptimizerType::Sgd,
            OptimizerType::RmsProp,
            OptimizerType::Adam,
            OptimizerType::AdamW,
        ] {
            let vs = nn::VarStore::new(Device::Cpu);
            let _model = nn::linear(vs.root() / "fc", 4, 2, Default::default());
            assert!(get_optimizer(&vs, kind, &hp).is_ok(), "failed for {kind}");
        }
    }
}
