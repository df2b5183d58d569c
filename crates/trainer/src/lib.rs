pub mod dataset;
pub mod optim;
pub mod sched;
pub mod snapshot;
pub mod train;

pub use dataset::{get_class_mapping, DataLoader, ImageFolder, PhaseLoaders};
pub use optim::{get_optimizer, Hyperparameters};
pub use sched::{get_scheduler, LrScheduler, SchedulerOptions};
pub use snapshot::WeightSnapshot;
pub use train::{evaluate, train_model, MetricHistory, TrainingRun};

use serde::{Deserialize, Serialize};
use vision_core::{BestCriteria, ModelArch, OptimizerType, SchedulerType};

/// Run configuration, normally loaded from `configs/training.yaml`.
///
/// `data_dir` is expected to contain `train/<class_name>/*` and
/// `val/<class_name>/*` image folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub data_dir: String,
    pub output_dir: String,
    pub model: ModelArch,
    pub image_size: i64,
    pub epochs: usize,
    pub batch_size: i64,
    pub optimizer: OptimizerType,
    pub scheduler: Option<SchedulerType>,
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub alpha: f64,
    pub betas: (f64, f64),
    pub step_size: usize,
    pub gamma: f64,
    pub lr_min: f64,
    pub best_criteria: BestCriteria,
    pub max_samples: Option<usize>,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            output_dir: "./checkpoints".to_string(),
            model: ModelArch::Resnet18,
            image_size: 224,
            epochs: 10,
            batch_size: 32,
            optimizer: OptimizerType::Adam,
            scheduler: None,
            learning_rate: 1e-3,
            momentum: 0.9,
            weight_decay: 0.0,
            alpha: 0.99,
            betas: (0.9, 0.999),
            step_size: 30,
            gamma: 0.1,
            lr_min: 0.0,
            best_criteria: BestCriteria::Loss,
            max_samples: None,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            lr: self.learning_rate,
            momentum: self.momentum,
            weight_decay: self.weight_decay,
            alpha: self.alpha,
            betas: self.betas,
        }
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            step_size: self.step_size,
            gamma: self.gamma,
            lr_min: self.lr_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_partial_yaml() {
        let yaml = "epochs: 3\noptimizer: sgd\nscheduler: cosine\nbest_criteria: accuracy\n";
        let config: TrainerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.optimizer, OptimizerType::Sgd);
        assert_eq!(config.scheduler, Some(SchedulerType::Cosine));
        assert_eq!(config.best_criteria, BestCriteria::Accuracy);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.learning_rate, 1e-3);
    }
}
