use candle_core::Device;

use crate::error::{PipelineError, Result};

use super::cache::ModelOptions;

/// Which compute device a pipeline should run on.
#[derive(Clone, Default)]
pub enum DeviceRequest {
    /// CPU inference (default).
    #[default]
    Cpu,
    /// CUDA GPU by index.
    Cuda(usize),
}

impl DeviceRequest {
    pub fn resolve(self) -> Result<Device> {
        match self {
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                ))
            }),
        }
    }
}

pub fn build_cache_key<O: ModelOptions>(options: &O, device: &Device) -> String {
    format!("{}-{:?}", options.cache_key(), device.location())
}
