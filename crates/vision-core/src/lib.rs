pub mod constants;
pub mod env;
pub mod error;
pub mod models;
pub mod yaml;

pub use constants::{BestCriteria, OptimizerType, Phase, SchedulerType};
pub use error::{Result, VisionError};
pub use models::ModelArch;
