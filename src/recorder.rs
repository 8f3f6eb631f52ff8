use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found")]
    NoDevice,
    #[error("microphone unavailable: {0}")]
    Device(String),
    #[error("audio encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

/// Convert f32 samples to WAV bytes (mono 16-bit PCM).
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let i16_val = (clamped * i16::MAX as f32) as i16;
        writer.write_sample(i16_val)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

#[cfg(feature = "desktop")]
pub use cpal_device::CpalDevice;

#[cfg(feature = "desktop")]
mod cpal_device {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    use super::CaptureError;
    use crate::app::capture::{CaptureDevice, DeviceEvent, DeviceHandle};

    /// The default input device of the default cpal host.
    #[derive(Debug, Default)]
    pub struct CpalDevice;

    struct CpalRecording {
        stream: cpal::Stream,
        sample_rate: u32,
        events: async_channel::Sender<DeviceEvent>,
    }

    impl DeviceHandle for CpalRecording {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn stop(self: Box<Self>) {
            let CpalRecording { stream, events, .. } = *self;
            // Dropping the stream releases the device; no callback runs after this.
            drop(stream);
            let _ = events.try_send(DeviceEvent::Stopped);
        }
    }

    impl CaptureDevice for CpalDevice {
        fn acquire(
            &self,
            events: async_channel::Sender<DeviceEvent>,
        ) -> Result<Box<dyn DeviceHandle>, CaptureError> {
            let (stream, sample_rate) = start_capture(events.clone())
                .map_err(|e| CaptureError::Device(e.to_string()))?
                .ok_or(CaptureError::NoDevice)?;
            Ok(Box::new(CpalRecording {
                stream,
                sample_rate,
                events,
            }))
        }
    }

    /// Start capturing audio from the default input device.
    /// Each callback block is downmixed to mono (~16kHz) and sent as one fragment.
    /// Returns `None` when the host has no input device.
    fn start_capture(
        events: async_channel::Sender<DeviceEvent>,
    ) -> Result<Option<(cpal::Stream, u32)>, Box<dyn std::error::Error>> {
        let host = cpal::default_host();
        let Some(device) = host.default_input_device() else {
            return Ok(None);
        };

        log::info!("Input device: {:?}", device.description());

        let supported_configs: Vec<_> = device.supported_input_configs()?.collect();

        // Try to find a config that supports 16kHz mono
        let target_rate: u32 = 16000;
        let desired = supported_configs.iter().find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= target_rate
                && c.max_sample_rate() >= target_rate
                && c.sample_format() == cpal::SampleFormat::F32
        });

        let (config, native_rate, downsample_factor) = if let Some(cfg) = desired {
            let config = cfg.with_sample_rate(target_rate).config();
            (config, target_rate, 1usize)
        } else {
            let default_config = device.default_input_config()?;
            let rate = default_config.sample_rate();
            let factor = (rate / target_rate).max(1) as usize;
            let actual_rate = rate / factor as u32;
            log::info!(
                "Using native rate {rate}Hz, downsampling by {factor}x to ~{actual_rate}Hz"
            );
            (default_config.config(), actual_rate, factor)
        };

        let channels = config.channels as usize;

        let error_events = events.clone();
        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let fragment: Vec<f32> = data
                    .chunks(channels)
                    .step_by(downsample_factor)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                    .collect();
                if !fragment.is_empty() {
                    let _ = events.try_send(DeviceEvent::Fragment(fragment));
                }
            },
            move |err| {
                log::error!("Input stream error: {err}");
                if let Some(event) = stream_error_event(&err) {
                    let _ = error_events.try_send(event);
                }
            },
            None,
        )?;

        stream.play()?;
        Ok(Some((stream, native_rate)))
    }

    /// A vanished device ends the recording; other stream errors are only logged.
    fn stream_error_event(err: &cpal::StreamError) -> Option<DeviceEvent> {
        matches!(err, cpal::StreamError::DeviceNotAvailable).then_some(DeviceEvent::Stopped)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn unplugged_device_stops_the_recording() {
            assert_eq!(
                stream_error_event(&cpal::StreamError::DeviceNotAvailable),
                Some(DeviceEvent::Stopped)
            );
        }

        #[test]
        fn backend_errors_keep_recording() {
            let err = cpal::StreamError::BackendSpecific {
                err: cpal::BackendSpecificError {
                    description: "xrun".into(),
                },
            };
            assert_eq!(stream_error_event(&err), None);
        }
    }
}
