//! Compute device selection.

use candle_core::utils::{cuda_is_available, metal_is_available};
use candle_core::{DType, Device};

use super::config::DevicePreference;
use super::error::LlmResult;

/// Pick the device to load the model on.
///
/// `Auto` prefers CUDA, then Metal, then the CPU.
///
/// # Errors
/// Returns an error if an available accelerator fails to initialize.
pub fn select_device(preference: DevicePreference) -> LlmResult<Device> {
    if preference == DevicePreference::Cpu {
        return Ok(Device::Cpu);
    }

    if cuda_is_available() {
        return Ok(Device::new_cuda(0)?);
    }

    if metal_is_available() {
        return Ok(Device::new_metal(0)?);
    }

    Ok(Device::Cpu)
}

/// Weight dtype for `device`: half precision on accelerators, f32 on CPU.
#[must_use]
pub const fn dtype_for(device: &Device) -> DType {
    match device {
        Device::Cpu => DType::F32,
        _ => DType::F16,
    }
}

/// Short device label for logs.
#[must_use]
pub const fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_preference_forces_cpu() {
        let device = select_device(DevicePreference::Cpu);
        assert!(matches!(device, Ok(Device::Cpu)));
    }

    #[test]
    fn test_cpu_dtype_and_label() {
        assert_eq!(dtype_for(&Device::Cpu), DType::F32);
        assert_eq!(device_label(&Device::Cpu), "cpu");
    }
}
