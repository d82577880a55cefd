//! cpal-backed input and output streams, plus device enumeration.

use crate::audio::backend::{AudioBackend, AudioStream, BlockCallback};
use crate::audio::queue::SampleQueue;
use crate::audio::{AudioDevice, DeviceRole, StreamSpec};
use crate::error::{Result, VuloopError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, Device, Host, SampleFormat, Stream, StreamConfig, SupportedBufferSize,
    SupportedStreamConfigRange,
};
use std::sync::Arc;

/// Audio backend over the platform's default cpal host
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn devices(&self, role: DeviceRole) -> Result<Vec<Device>> {
        let devices: Vec<Device> = match role {
            DeviceRole::Input => self
                .host
                .input_devices()
                .map_err(|e| VuloopError::Audio(format!("Failed to enumerate devices: {}", e)))?
                .collect(),
            DeviceRole::Output => self
                .host
                .output_devices()
                .map_err(|e| VuloopError::Audio(format!("Failed to enumerate devices: {}", e)))?
                .collect(),
        };
        Ok(devices)
    }

    fn default_device(&self, role: DeviceRole) -> Option<Device> {
        match role {
            DeviceRole::Input => self.host.default_input_device(),
            DeviceRole::Output => self.host.default_output_device(),
        }
    }

    /// Resolve a device by exact name, then by partial match
    fn find_device(&self, role: DeviceRole, name: Option<&str>) -> Result<Device> {
        let Some(name) = name else {
            return self.default_device(role).ok_or_else(|| {
                VuloopError::AudioDeviceNotFound(format!("No default {} device", role))
            });
        };

        let devices = self.devices(role)?;
        let names: Vec<Option<String>> = devices.iter().map(|d| d.name().ok()).collect();

        let index = names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .or_else(|| {
                names
                    .iter()
                    .position(|n| n.as_deref().map(|n| n.contains(name)).unwrap_or(false))
            })
            .ok_or_else(|| VuloopError::AudioDeviceNotFound(name.to_string()))?;

        devices
            .into_iter()
            .nth(index)
            .ok_or_else(|| VuloopError::AudioDeviceNotFound(name.to_string()))
    }

    /// List devices for a role, marking the host default
    pub fn list_devices(&self, role: DeviceRole) -> Result<Vec<AudioDevice>> {
        let default_name = self.default_device(role).and_then(|d| d.name().ok());

        let mut result = Vec::new();
        for device in self.devices(role)? {
            let config = match role {
                DeviceRole::Input => device.default_input_config(),
                DeviceRole::Output => device.default_output_config(),
            };
            let Ok(config) = config else {
                continue;
            };

            let name = device.name().unwrap_or_else(|_| "Unknown".into());
            result.push(AudioDevice {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                role,
                sample_rate: config.sample_rate().0,
                channels: config.channels(),
            });
        }

        Ok(result)
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick a stream config matching `spec` from what the device advertises.
///
/// The block size is requested as a fixed buffer only when the device
/// reports a range containing it; otherwise the host default is used.
fn negotiate_config(
    ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
    spec: &StreamSpec,
) -> Result<StreamConfig> {
    let range = ranges
        .into_iter()
        .find(|range| {
            range.channels() == spec.channels
                && range.sample_format() == SampleFormat::I16
                && range.min_sample_rate().0 <= spec.sample_rate
                && spec.sample_rate <= range.max_sample_rate().0
        })
        .ok_or_else(|| {
            VuloopError::AudioStream(format!(
                "No i16 config with {} channel(s) at {} Hz",
                spec.channels, spec.sample_rate
            ))
        })?;

    let block = spec.block_samples as u32;
    let buffer_size = match range.buffer_size() {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&block) => {
            BufferSize::Fixed(block)
        }
        _ => BufferSize::Default,
    };

    Ok(StreamConfig {
        channels: spec.channels,
        sample_rate: cpal::SampleRate(spec.sample_rate),
        buffer_size,
    })
}

/// An open cpal stream. Dropping it closes the device.
pub struct CpalStream {
    stream: Stream,
    device_name: String,
}

impl AudioStream for CpalStream {
    fn play(&self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| VuloopError::AudioStream(format!("Failed to start stream: {}", e)))
    }

    fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioBackend for CpalBackend {
    type Input = CpalStream;
    type Output = CpalStream;

    fn open_input(
        &self,
        device: Option<&str>,
        spec: &StreamSpec,
        mut on_block: BlockCallback,
    ) -> Result<CpalStream> {
        let device = self.find_device(DeviceRole::Input, device)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".into());

        let ranges = device
            .supported_input_configs()
            .map_err(|e| VuloopError::Audio(format!("Failed to get device config: {}", e)))?;
        let config = negotiate_config(ranges, spec)?;
        tracing::debug!(
            "Opening input '{}' ({} Hz, {} ch, buffer {:?})",
            device_name,
            config.sample_rate.0,
            config.channels,
            config.buffer_size
        );

        let err_name = device_name.clone();
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| on_block(data),
                move |err| tracing::warn!("Input stream error on '{}': {}", err_name, err),
                None,
            )
            .map_err(|e| VuloopError::AudioStream(format!("Failed to build stream: {}", e)))?;

        Ok(CpalStream {
            stream,
            device_name,
        })
    }

    fn open_output(
        &self,
        device: Option<&str>,
        spec: &StreamSpec,
        queue: Arc<SampleQueue>,
    ) -> Result<CpalStream> {
        let device = self.find_device(DeviceRole::Output, device)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".into());

        let ranges = device
            .supported_output_configs()
            .map_err(|e| VuloopError::Audio(format!("Failed to get device config: {}", e)))?;
        let config = negotiate_config(ranges, spec)?;
        tracing::debug!(
            "Opening output '{}' ({} Hz, {} ch, buffer {:?})",
            device_name,
            config.sample_rate.0,
            config.channels,
            config.buffer_size
        );

        let err_name = device_name.clone();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    queue.fill(data);
                },
                move |err| tracing::warn!("Output stream error on '{}': {}", err_name, err),
                None,
            )
            .map_err(|e| VuloopError::AudioStream(format!("Failed to build stream: {}", e)))?;

        Ok(CpalStream {
            stream,
            device_name,
        })
    }
}
