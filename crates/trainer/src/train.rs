use std::time::Instant;

use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tch::{nn, Kind, Tensor};
use vision_core::{BestCriteria, Phase};

use crate::dataset::{DataLoader, PhaseLoaders};
use crate::sched::LrScheduler;
use crate::snapshot::WeightSnapshot;

/// Per-epoch scalar history, one entry per phase per epoch in epoch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricHistory {
    pub train: Vec<f64>,
    pub val: Vec<f64>,
}

impl MetricHistory {
    pub fn phase(&self, phase: Phase) -> &[f64] {
        match phase {
            Phase::Training => &self.train,
            Phase::Validation => &self.val,
        }
    }

    fn push(&mut self, phase: Phase, value: f64) {
        match phase {
            Phase::Training => self.train.push(value),
            Phase::Validation => self.val.push(value),
        }
    }
}

/// Everything a finished training run produced. The var-store passed to
/// `train_model` holds the final-epoch weights; `best_weights` and
/// `last_weights` are deep copies.
pub struct TrainingRun {
    pub best_weights: WeightSnapshot,
    pub last_weights: WeightSnapshot,
    pub loss: MetricHistory,
    pub accuracy: MetricHistory,
    pub best_record: f64,
}

/// Serializable summary of a run, written next to the weight artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub best_criteria: BestCriteria,
    pub best_record: f64,
    pub loss: MetricHistory,
    pub accuracy: MetricHistory,
}

impl TrainingRun {
    pub fn report(&self, best_criteria: BestCriteria) -> TrainingReport {
        TrainingReport {
            best_criteria,
            best_record: self.best_record,
            loss: self.loss.clone(),
            accuracy: self.accuracy.clone(),
        }
    }
}

/// Runs `num_epochs` of alternating training and validation phases.
///
/// Training batches step the optimizer; validation runs grad-free. The
/// scheduler, when present, advances once per epoch after the training phase.
/// After each validation phase the criterion metric is compared against the
/// running record with a strict operator, so ties keep the earliest snapshot.
#[allow(clippy::too_many_arguments)]
pub fn train_model<M, F>(
    model: &M,
    vs: &nn::VarStore,
    loaders: &PhaseLoaders,
    criterion: F,
    optimizer: &mut nn::Optimizer,
    mut scheduler: Option<&mut LrScheduler>,
    num_epochs: usize,
    best_criteria: BestCriteria,
) -> Result<TrainingRun>
where
    M: nn::ModuleT,
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    let training_start = Instant::now();
    info!(
        "Training on {:?} for {} epochs (best criteria: {})",
        vs.device(),
        num_epochs,
        best_criteria
    );

    let mut best_weights = WeightSnapshot::capture(vs);
    let mut best_record = best_criteria.initial_record();
    let mut loss_history = MetricHistory::default();
    let mut accuracy_history = MetricHistory::default();

    for epoch in 1..=num_epochs {
        info!("Epoch {}/{}", epoch, num_epochs);

        for phase in [Phase::Training, Phase::Validation] {
            debug!("Epoch {} {} phase started", epoch, phase);

            let loader = loaders.get(phase);
            let (epoch_loss, epoch_acc) = if phase.grad_enabled() {
                run_training_phase(model, loader, &criterion, optimizer)?
            } else {
                tch::no_grad(|| run_validation_phase(model, loader, &criterion))
            };

            if phase == Phase::Training {
                if let Some(sched) = scheduler.as_deref_mut() {
                    sched.step(optimizer);
                    info!("Last learning rate in this epoch: {:.6}", sched.last_lr());
                }
            }

            info!("{} loss: {:.4} acc: {:.4}", phase, epoch_loss, epoch_acc);

            if phase == Phase::Validation {
                let candidate = best_criteria.metric(epoch_loss, epoch_acc);
                if best_criteria.improved(candidate, best_record) {
                    info!("New record {}: {:.4} (was {:.4})", best_criteria, candidate, best_record);
                    best_record = candidate;
                    best_weights = WeightSnapshot::capture(vs);
                }
            }

            loss_history.push(phase, epoch_loss);
            accuracy_history.push(phase, epoch_acc);
        }
    }

    let last_weights = WeightSnapshot::capture(vs);
    info!(
        "Training complete in {:.1}s; best val {}: {:.4}",
        training_start.elapsed().as_secs_f64(),
        best_criteria,
        best_record
    );

    Ok(TrainingRun {
        best_weights,
        last_weights,
        loss: loss_history,
        accuracy: accuracy_history,
        best_record,
    })
}

/// Grad-free pass over a loader; returns `(mean_loss, accuracy)`.
pub fn evaluate<M, F>(model: &M, loader: &DataLoader, criterion: F) -> (f64, f64)
where
    M: nn::ModuleT,
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    tch::no_grad(|| run_validation_phase(model, loader, &criterion))
}

fn run_training_phase<M, F>(
    model: &M,
    loader: &DataLoader,
    criterion: &F,
    optimizer: &mut nn::Optimizer,
) -> Result<(f64, f64)>
where
    M: nn::ModuleT,
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    let mut loss_sum = 0.0;
    let mut corrects = 0i64;
    for (images, labels) in loader.batches() {
        let logits = model.forward_t(&images, true);
        let loss = criterion(&logits, &labels);
        optimizer.backward_step(&loss);

        loss_sum += loss.double_value(&[]) * images.size()[0] as f64;
        corrects += count_correct(&logits, &labels);
    }
    let n = loader.len() as f64;
    Ok((loss_sum / n, corrects as f64 / n))
}

fn run_validation_phase<M, F>(model: &M, loader: &DataLoader, criterion: &F) -> (f64, f64)
where
    M: nn::ModuleT,
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    let mut loss_sum = 0.0;
    let mut corrects = 0i64;
    for (images, labels) in loader.batches() {
        let logits = model.forward_t(&images, false);
        let loss = criterion(&logits, &labels);
        loss_sum += loss.double_value(&[]) * images.size()[0] as f64;
        corrects += count_correct(&logits, &labels);
    }
    let n = loader.len() as f64;
    (loss_sum / n, corrects as f64 / n)
}

fn count_correct(logits: &Tensor, labels: &Tensor) -> i64 {
    logits
        .argmax(-1, false)
        .eq_tensor(labels)
        .sum(Kind::Int64)
        .int64_value(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_appends_per_phase_in_order() {
        let mut history = MetricHistory::default();
        history.push(Phase::Training, 1.0);
        history.push(Phase::Validation, 2.0);
        history.push(Phase::Training, 0.5);
        history.push(Phase::Validation, 1.5);

        assert_eq!(history.phase(Phase::Training), &[1.0, 0.5]);
        assert_eq!(history.phase(Phase::Validation), &[2.0, 1.5]);
    }
}
