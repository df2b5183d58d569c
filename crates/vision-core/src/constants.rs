use serde::{Deserialize, Serialize};

/// The two phases executed within every epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[serde(rename = "train")]
    Training,
    #[serde(rename = "val")]
    Validation,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Training => "train",
            Phase::Validation => "val",
        }
    }

    /// Gradients are only tracked while training.
    pub fn grad_enabled(&self) -> bool {
        matches!(self, Phase::Training)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which validation metric decides the best weight snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestCriteria {
    Loss,
    Accuracy,
}

impl BestCriteria {
    /// Sentinel so the first validation epoch always becomes the record.
    pub fn initial_record(&self) -> f64 {
        match self {
            BestCriteria::Loss => f64::INFINITY,
            BestCriteria::Accuracy => f64::NEG_INFINITY,
        }
    }

    /// Strict comparison: on a tie the earlier snapshot is kept.
    pub fn improved(&self, candidate: f64, best: f64) -> bool {
        match self {
            BestCriteria::Loss => candidate < best,
            BestCriteria::Accuracy => candidate > best,
        }
    }

    /// Picks the scalar this criterion compares.
    pub fn metric(&self, loss: f64, accuracy: f64) -> f64 {
        match self {
            BestCriteria::Loss => loss,
            BestCriteria::Accuracy => accuracy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BestCriteria::Loss => "loss",
            BestCriteria::Accuracy => "accuracy",
        }
    }
}

impl std::fmt::Display for BestCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerType {
    Sgd,
    RmsProp,
    Adam,
    AdamW,
}

impl std::fmt::Display for OptimizerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OptimizerType::Sgd => "sgd",
            OptimizerType::RmsProp => "rmsprop",
            OptimizerType::Adam => "adam",
            OptimizerType::AdamW => "adamw",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerType {
    Step,
    Cosine,
}

impl std::fmt::Display for SchedulerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchedulerType::Step => "step",
            SchedulerType::Cosine => "cosine",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_names_match_dataloader_keys() {
        assert_eq!(Phase::Training.as_str(), "train");
        assert_eq!(Phase::Validation.as_str(), "val");
        assert!(Phase::Training.grad_enabled());
        assert!(!Phase::Validation.grad_enabled());
    }

    #[test]
    fn loss_criteria_starts_at_infinity_and_compares_strictly() {
        let c = BestCriteria::Loss;
        assert_eq!(c.initial_record(), f64::INFINITY);
        assert!(c.improved(0.5, f64::INFINITY));
        assert!(c.improved(0.4, 0.5));
        // Tie keeps the earlier record.
        assert!(!c.improved(0.5, 0.5));
        assert!(!c.improved(0.6, 0.5));
    }

    #[test]
    fn accuracy_criteria_starts_at_neg_infinity_and_compares_strictly() {
        let c = BestCriteria::Accuracy;
        assert_eq!(c.initial_record(), f64::NEG_INFINITY);
        assert!(c.improved(0.1, f64::NEG_INFINITY));
        assert!(c.improved(0.9, 0.8));
        assert!(!c.improved(0.8, 0.8));
        assert!(!c.improved(0.7, 0.8));
    }

    #[test]
    fn criteria_picks_its_metric() {
        assert_eq!(BestCriteria::Loss.metric(0.3, 0.9), 0.3);
        assert_eq!(BestCriteria::Accuracy.metric(0.3, 0.9), 0.9);
    }

    #[test]
    fn enums_deserialize_from_snake_case() {
        let opt: OptimizerType = serde_yaml::from_str("adamw").unwrap();
        assert_eq!(opt, OptimizerType::AdamW);
        let sched: SchedulerType = serde_yaml::from_str("cosine").unwrap();
        assert_eq!(sched, SchedulerType::Cosine);
        let phase: Phase = serde_yaml::from_str("val").unwrap();
        assert_eq!(phase, Phase::Validation);
    }
}
