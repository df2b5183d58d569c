use std::fs;
use std::path::Path;

use anyhow::Result;
use log::info;
use tch::nn;

use trainer::{
    get_class_mapping, get_optimizer, get_scheduler, train_model, DataLoader, ImageFolder,
    PhaseLoaders, TrainerConfig,
};

fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "configs/training.yaml".to_string());
    let config: TrainerConfig = if Path::new(&config_path).exists() {
        info!("Loading config from {}", config_path);
        serde_yaml::from_str(&fs::read_to_string(&config_path)?)?
    } else {
        info!("No config at {}, using defaults", config_path);
        TrainerConfig::default()
    };

    let device = vision_core::env::device();
    info!("Using device: {:?}", device);

    let output_dir = Path::new(&config.output_dir);
    fs::create_dir_all(output_dir)?;

    let data_dir = Path::new(&config.data_dir);
    let mut train_set = ImageFolder::load(data_dir.join("train"), config.image_size)?;
    if let Some(max_samples) = config.max_samples {
        train_set = train_set.subsample(max_samples, config.seed);
    }
    let val_set = ImageFolder::load(data_dir.join("val"), config.image_size)?;

    let mapping = get_class_mapping(&train_set, Some(&output_dir.join("class_mapping.yml")))?;
    let num_classes = mapping.len() as i64;

    let vs = nn::VarStore::new(device);
    let model = config.model.build(&vs.root(), num_classes);
    info!("Model: {} with {} classes", config.model, num_classes);

    let loaders = PhaseLoaders {
        train: DataLoader::new(&train_set, config.batch_size, true, device),
        val: DataLoader::new(&val_set, config.batch_size, false, device),
    };

    let mut optimizer = get_optimizer(&vs, config.optimizer, &config.hyperparameters())?;
    let mut scheduler = config.scheduler.map(|kind| {
        get_scheduler(
            kind,
            config.learning_rate,
            config.epochs,
            &config.scheduler_options(),
        )
    });

    let run = train_model(
        &model,
        &vs,
        &loaders,
        |logits, targets| logits.cross_entropy_for_logits(targets),
        &mut optimizer,
        scheduler.as_mut(),
        config.epochs,
        config.best_criteria,
    )?;

    run.best_weights.save(output_dir.join("best.ot"))?;
    run.last_weights.save(output_dir.join("last.ot"))?;
    fs::write(
        output_dir.join("history.json"),
        serde_json::to_string_pretty(&run.report(config.best_criteria))?,
    )?;

    info!(
        "Artifacts written to {:?}; best val {}: {:.4}",
        output_dir, config.best_criteria, run.best_record
    );

    Ok(())
}
