use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tch::{data, vision, Device, Kind, Tensor};
use vision_core::yaml::save_as_yml;
use vision_core::Phase;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// A torchvision-style image folder: `root/<class_name>/*.jpg`.
///
/// Class names are assigned indices in sorted order. All images are loaded
/// eagerly, resized to `image_size` and stacked into a single float tensor
/// scaled to `[0, 1]`, which keeps epoch iteration free of disk access.
pub struct ImageFolder {
    images: Tensor,
    labels: Tensor,
    class_to_idx: BTreeMap<String, i64>,
}

impl ImageFolder {
    pub fn load<P: AsRef<Path>>(root: P, image_size: i64) -> Result<Self> {
        let root = root.as_ref();
        let mut class_names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(root)
            .with_context(|| format!("reading dataset root {:?}", root))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                class_names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        if class_names.is_empty() {
            bail!("no class directories found under {:?}", root);
        }
        class_names.sort();

        let class_to_idx: BTreeMap<String, i64> = class_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx as i64))
            .collect();

        let mut images: Vec<Tensor> = Vec::new();
        let mut labels: Vec<i64> = Vec::new();
        for name in &class_names {
            let class_dir = root.join(name);
            let mut files: Vec<_> = std::fs::read_dir(&class_dir)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                        .unwrap_or(false)
                })
                .collect();
            files.sort();

            for path in files {
                let image = vision::image::load(&path)
                    .with_context(|| format!("loading image {:?}", path))?;
                let image = vision::image::resize(&image, image_size, image_size)?;
                images.push(image.to_kind(Kind::Float) / 255.0);
                labels.push(class_to_idx[name]);
            }
        }
        if images.is_empty() {
            bail!("no images found under {:?}", root);
        }

        info!(
            "Loaded {} images across {} classes from {:?}",
            images.len(),
            class_to_idx.len(),
            root
        );

        Ok(Self {
            images: Tensor::stack(&images, 0),
            labels: Tensor::from_slice(&labels),
            class_to_idx,
        })
    }

    /// Seeded shuffle-then-truncate, used to cap the training set size while
    /// keeping class diversity.
    pub fn subsample(self, max_samples: usize, seed: u64) -> Self {
        let len = self.len();
        if max_samples as i64 >= len {
            return self;
        }
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut indices: Vec<i64> = (0..len).collect();
        indices.shuffle(&mut rng);
        indices.truncate(max_samples);
        let index = Tensor::from_slice(&indices);
        Self {
            images: self.images.index_select(0, &index),
            labels: self.labels.index_select(0, &index),
            class_to_idx: self.class_to_idx,
        }
    }

    pub fn len(&self) -> i64 {
        self.images.size()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn class_to_idx(&self) -> &BTreeMap<String, i64> {
        &self.class_to_idx
    }

    pub fn images(&self) -> &Tensor {
        &self.images
    }

    pub fn labels(&self) -> &Tensor {
        &self.labels
    }
}

/// Extracts the class-name-to-index mapping from a dataset and optionally
/// persists it as YAML for inference-time decoding.
pub fn get_class_mapping(
    dataset: &ImageFolder,
    savepath: Option<&Path>,
) -> Result<BTreeMap<String, i64>> {
    let mapping = dataset.class_to_idx().clone();
    info!("Class mapping in the dataset: {:?}", mapping);

    if let Some(path) = savepath {
        save_as_yml(path, &mapping)?;
        info!("Saved class mapping to {:?}", path);
    }

    Ok(mapping)
}

/// Mini-batch iterator over an in-memory dataset.
///
/// The trailing smaller batch is always yielded so that per-epoch statistics
/// normalized by `len()` cover every sample.
pub struct DataLoader {
    images: Tensor,
    labels: Tensor,
    batch_size: i64,
    shuffle: bool,
    device: Device,
}

impl DataLoader {
    pub fn new(dataset: &ImageFolder, batch_size: i64, shuffle: bool, device: Device) -> Self {
        Self::from_tensors(
            dataset.images().shallow_clone(),
            dataset.labels().shallow_clone(),
            batch_size,
            shuffle,
            device,
        )
    }

    pub fn from_tensors(
        images: Tensor,
        labels: Tensor,
        batch_size: i64,
        shuffle: bool,
        device: Device,
    ) -> Self {
        Self {
            images,
            labels,
            batch_size,
            shuffle,
            device,
        }
    }

    /// Number of samples, used for loss/accuracy normalization.
    pub fn len(&self) -> i64 {
        self.images.size()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn batches(&self) -> data::Iter2 {
        let mut iter = data::Iter2::new(&self.images, &self.labels, self.batch_size);
        iter.return_smaller_last_batch().to_device(self.device);
        if self.shuffle {
            iter.shuffle();
        }
        iter
    }
}

/// The per-phase dataloaders consumed by the training loop. A struct rather
/// than a name-keyed map, so a missing phase cannot occur at runtime.
pub struct PhaseLoaders {
    pub train: DataLoader,
    pub val: DataLoader,
}

impl PhaseLoaders {
    pub fn get(&self, phase: Phase) -> &DataLoader {
        match phase {
            Phase::Training => &self.train,
            Phase::Validation => &self.val,
        }
    }
}
