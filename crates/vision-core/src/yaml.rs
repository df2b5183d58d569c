//! Key-value persistence helpers shared by the trainer artifacts.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub fn save_as_yml<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_yaml::to_writer(file, value)?;
    Ok(())
}

pub fn load_yml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(file)?)
}
