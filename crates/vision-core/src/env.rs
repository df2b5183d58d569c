//! Runtime environment knobs, resolved from environment variables.

use tch::Device;

/// Device used for training and evaluation.
///
/// `CLASSIFY_DEVICE=cpu` forces CPU; `cuda` or `cuda:N` selects a GPU.
/// Without the override the first CUDA device is used when available.
pub fn device() -> Device {
    match std::env::var("CLASSIFY_DEVICE").ok().as_deref() {
        Some("cpu") => Device::Cpu,
        Some("cuda") => Device::Cuda(0),
        Some(s) if s.starts_with("cuda:") => {
            let index = s["cuda:".len()..].parse().unwrap_or(0);
            Device::Cuda(index)
        }
        _ => Device::cuda_if_available(),
    }
}
