use anyhow::{anyhow, Result};
use candle::Device;
use tracing::warn;

/// Parses `cpu`, `cuda`, `cuda:N` or `gpu:N`. Anything else falls back to CPU.
pub fn select_device(preference: &str) -> Result<Device> {
    let trimmed = preference.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower.is_empty() || lower == "cpu" {
        return Ok(Device::Cpu);
    }

    if lower.starts_with("cuda") || lower.starts_with("gpu") {
        let ordinal = trimmed
            .split(':')
            .nth(1)
            .and_then(|part| part.parse::<usize>().ok())
            .unwrap_or(0);
        return Device::new_cuda(ordinal).map_err(|err| {
            anyhow!(
                "failed to initialize CUDA device {ordinal} ({err}). Build with the `cuda` \
                 feature and ensure CUDA libraries are available."
            )
        });
    }

    warn!(
        "unrecognized SUMMARISER_DEVICE value '{}', falling back to cpu",
        trimmed
    );
    Ok(Device::Cpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_spellings() {
        for pref in ["cpu", "CPU", " cpu ", ""] {
            assert!(matches!(select_device(pref).unwrap(), Device::Cpu), "{pref:?}");
        }
    }

    #[test]
    fn unknown_preference_falls_back_to_cpu() {
        assert!(matches!(select_device("tpu").unwrap(), Device::Cpu));
    }
}
