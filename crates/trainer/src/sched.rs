use std::f64::consts::PI;

use log::info;
use serde::{Deserialize, Serialize};
use tch::nn;
use vision_core::SchedulerType;

/// Scheduler parameters with the conventional defaults. `step_size`/`gamma`
/// apply to the step policy, `lr_min` to cosine annealing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulerOptions {
    pub step_size: usize,
    pub gamma: f64,
    pub lr_min: f64,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            step_size: 30,
            gamma: 0.1,
            lr_min: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Policy {
    /// lr = base * gamma^(epoch / step_size), integer division.
    Step { step_size: usize, gamma: f64 },
    /// Cosine decay from base lr to eta_min over t_max epochs.
    Cosine { t_max: usize, eta_min: f64 },
}

/// Epoch-level learning-rate scheduler applied through `Optimizer::set_lr`.
///
/// tch exposes no scheduler of its own; the closed forms here match
/// `StepLR` and `CosineAnnealingLR` stepped once per epoch.
#[derive(Debug)]
pub struct LrScheduler {
    policy: Policy,
    base_lr: f64,
    last_lr: f64,
    epoch: usize,
}

pub fn get_scheduler(
    kind: SchedulerType,
    base_lr: f64,
    num_epochs: usize,
    options: &SchedulerOptions,
) -> LrScheduler {
    info!(
        "Creating scheduler: {} (epochs: {}, step_size: {}, gamma: {:.4}, lr_min: {:.4})",
        kind, num_epochs, options.step_size, options.gamma, options.lr_min
    );
    let policy = match kind {
        SchedulerType::Step => Policy::Step {
            step_size: options.step_size.max(1),
            gamma: options.gamma,
        },
        SchedulerType::Cosine => Policy::Cosine {
            t_max: num_epochs.max(1),
            eta_min: options.lr_min,
        },
    };
    LrScheduler {
        policy,
        base_lr,
        last_lr: base_lr,
        epoch: 0,
    }
}

impl LrScheduler {
    /// Advances one epoch and returns the new learning rate.
    pub fn advance(&mut self) -> f64 {
        self.epoch += 1;
        self.last_lr = match self.policy {
            Policy::Step { step_size, gamma } => {
                self.base_lr * gamma.powi((self.epoch / step_size) as i32)
            }
            Policy::Cosine { t_max, eta_min } => {
                let progress = (self.epoch as f64 / t_max as f64).min(1.0);
                eta_min + (self.base_lr - eta_min) * (1.0 + (progress * PI).cos()) / 2.0
            }
        };
        self.last_lr
    }

    /// Advances one epoch and applies the new rate to the optimizer.
    pub fn step(&mut self, optimizer: &mut nn::Optimizer) {
        let lr = self.advance();
        optimizer.set_lr(lr);
    }

    pub fn last_lr(&self) -> f64 {
        self.last_lr
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_policy_decays_every_step_size_epochs() {
        let options = SchedulerOptions {
            step_size: 2,
            gamma: 0.5,
            lr_min: 0.0,
        };
        let mut sched = get_scheduler(SchedulerType::Step, 0.1, 10, &options);
        assert_eq!(sched.last_lr(), 0.1);

        assert!((sched.advance() - 0.1).abs() < 1e-12); // epoch 1
        assert!((sched.advance() - 0.05).abs() < 1e-12); // epoch 2
        assert!((sched.advance() - 0.05).abs() < 1e-12); // epoch 3
        assert!((sched.advance() - 0.025).abs() < 1e-12); // epoch 4
        assert_eq!(sched.epoch(), 4);
    }

    #[test]
    fn cosine_policy_anneals_to_lr_min() {
        let options = SchedulerOptions {
            lr_min: 0.001,
            ..Default::default()
        };
        let mut sched = get_scheduler(SchedulerType::Cosine, 0.1, 10, &options);

        for _ in 0..5 {
            sched.advance();
        }
        // Halfway point sits at the midpoint of base and minimum.
        let expected_mid = 0.001 + (0.1 - 0.001) / 2.0;
        assert!((sched.last_lr() - expected_mid).abs() < 1e-12);

        for _ in 0..5 {
            sched.advance();
        }
        assert!((sched.last_lr() - 0.001).abs() < 1e-12);

        // Progress clamps past t_max instead of rebounding.
        sched.advance();
        assert!((sched.last_lr() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn cosine_decreases_monotonically() {
        let options = SchedulerOptions::default();
        let mut sched = get_scheduler(SchedulerType::Cosine, 0.1, 20, &options);
        let mut previous = sched.last_lr();
        for _ in 0..20 {
            let lr = sched.advance();
            assert!(lr < previous);
            previous = lr;
        }
    }
}
