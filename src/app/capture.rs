use std::cell::RefCell;
use std::rc::Rc;

use super::view::{View, INPUT_PLACEHOLDER, TRANSCRIBING_PLACEHOLDER};
use crate::api::{AudioPayload, Backend};
use crate::recorder::{samples_to_wav, CaptureError};

const MIC_DENIED: &str = "Microphone access needed.";
const TRANSCRIPTION_FAILED: &str = "Transcription failed";

/// Notifications emitted by an open device, delivered in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// A block of mono samples.
    Fragment(Vec<f32>),
    /// The device has released the microphone; no fragments follow.
    Stopped,
}

/// A microphone that can be opened exclusively.
pub trait CaptureDevice {
    fn acquire(
        &self,
        events: async_channel::Sender<DeviceEvent>,
    ) -> Result<Box<dyn DeviceHandle>, CaptureError>;
}

/// An open recording. Stopping consumes it, so a handle can only stop once.
pub trait DeviceHandle {
    fn sample_rate(&self) -> u32;
    /// Release the device; a [`DeviceEvent::Stopped`] follows asynchronously.
    fn stop(self: Box<Self>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Recording,
    Processing,
}

enum CaptureState {
    Idle,
    Recording {
        handle: Box<dyn DeviceHandle>,
        sample_rate: u32,
        fragments: Vec<Vec<f32>>,
    },
    /// Device stopped or stopping; fragments keep arriving until `Stopped`,
    /// after which they are drained into one payload for transcription.
    Processing {
        sample_rate: u32,
        fragments: Vec<Vec<f32>>,
    },
}

/// Record-then-transcribe state machine feeding the chat input.
pub struct CapturePipeline {
    user_id: i64,
    device: Box<dyn CaptureDevice>,
    backend: Rc<dyn Backend>,
    view: Rc<dyn View>,
    events: async_channel::Sender<DeviceEvent>,
    state: RefCell<CaptureState>,
}

impl CapturePipeline {
    pub fn new(
        user_id: i64,
        device: Box<dyn CaptureDevice>,
        backend: Rc<dyn Backend>,
        view: Rc<dyn View>,
        events: async_channel::Sender<DeviceEvent>,
    ) -> Self {
        Self {
            user_id,
            device,
            backend,
            view,
            events,
            state: RefCell::new(CaptureState::Idle),
        }
    }

    pub fn phase(&self) -> CapturePhase {
        match &*self.state.borrow() {
            CaptureState::Idle => CapturePhase::Idle,
            CaptureState::Recording { .. } => CapturePhase::Recording,
            CaptureState::Processing { .. } => CapturePhase::Processing,
        }
    }

    /// Number of buffered fragments, or `None` when no buffer exists.
    pub fn buffered_fragments(&self) -> Option<usize> {
        match &*self.state.borrow() {
            CaptureState::Idle => None,
            CaptureState::Recording { fragments, .. }
            | CaptureState::Processing { fragments, .. } => Some(fragments.len()),
        }
    }

    /// The microphone control: start when idle, stop when recording,
    /// ignored while a recording is being processed.
    pub fn toggle(&self) {
        let current = std::mem::replace(&mut *self.state.borrow_mut(), CaptureState::Idle);
        match current {
            CaptureState::Idle => self.start(),
            CaptureState::Recording {
                handle,
                sample_rate,
                fragments,
            } => {
                log::info!("Stopping recording");
                handle.stop();
                *self.state.borrow_mut() = CaptureState::Processing {
                    sample_rate,
                    fragments,
                };
                self.view.set_recording(false);
            }
            processing @ CaptureState::Processing { .. } => {
                *self.state.borrow_mut() = processing;
                log::debug!("Ignoring toggle while processing");
            }
        }
    }

    fn start(&self) {
        log::info!("Starting recording");
        match self.device.acquire(self.events.clone()) {
            Ok(handle) => {
                let sample_rate = handle.sample_rate();
                *self.state.borrow_mut() = CaptureState::Recording {
                    handle,
                    sample_rate,
                    fragments: Vec::new(),
                };
                self.view.set_recording(true);
            }
            Err(e) => {
                log::error!("Failed to start recording: {e}");
                self.view.alert(MIC_DENIED);
            }
        }
    }

    /// Feed a device notification through the state machine.
    ///
    /// Returns the transcript when a recording finished with one.
    pub async fn on_device_event(&self, event: DeviceEvent) -> Option<String> {
        match event {
            DeviceEvent::Fragment(samples) => {
                match &mut *self.state.borrow_mut() {
                    CaptureState::Recording { fragments, .. }
                    | CaptureState::Processing { fragments, .. } => fragments.push(samples),
                    CaptureState::Idle => log::debug!("Dropping fragment while idle"),
                }
                None
            }
            DeviceEvent::Stopped => {
                let (sample_rate, fragments) = self.take_for_processing()?;
                let transcript = self.process(sample_rate, fragments).await;
                *self.state.borrow_mut() = CaptureState::Idle;
                transcript
            }
        }
    }

    /// Drain the buffer, leaving the state in `Processing` until transcription ends.
    fn take_for_processing(&self) -> Option<(u32, Vec<Vec<f32>>)> {
        let mut state = self.state.borrow_mut();
        match std::mem::replace(&mut *state, CaptureState::Idle) {
            CaptureState::Idle => {
                log::debug!("Device stopped while idle");
                None
            }
            CaptureState::Recording {
                sample_rate,
                fragments,
                ..
            } => {
                log::warn!("Input device stopped unexpectedly");
                *state = CaptureState::Processing {
                    sample_rate,
                    fragments: Vec::new(),
                };
                drop(state);
                self.view.set_recording(false);
                Some((sample_rate, fragments))
            }
            CaptureState::Processing {
                sample_rate,
                fragments,
            } => {
                *state = CaptureState::Processing {
                    sample_rate,
                    fragments: Vec::new(),
                };
                Some((sample_rate, fragments))
            }
        }
    }

    async fn process(&self, sample_rate: u32, fragments: Vec<Vec<f32>>) -> Option<String> {
        let samples: Vec<f32> = fragments.into_iter().flatten().collect();
        if samples.is_empty() {
            self.view.notify("No audio captured");
            return None;
        }

        log::info!(
            "Captured {} samples ({:.1}s at {}Hz)",
            samples.len(),
            samples.len() as f32 / sample_rate as f32,
            sample_rate
        );

        let payload = match samples_to_wav(&samples, sample_rate) {
            Ok(bytes) => AudioPayload::wav(bytes),
            Err(e) => {
                log::error!("Failed to encode recording: {e}");
                self.view.alert(TRANSCRIPTION_FAILED);
                return None;
            }
        };

        self.view
            .set_input_state(false, TRANSCRIBING_PLACEHOLDER, None);

        let transcript = match self.backend.transcribe(self.user_id, payload).await {
            Ok(reply) => reply.transcript.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                log::error!("Transcription failed: {e}");
                self.view.alert(TRANSCRIPTION_FAILED);
                None
            }
        };

        match &transcript {
            Some(text) => {
                self.view
                    .set_input_state(true, INPUT_PLACEHOLDER, Some(text));
                self.view.focus_input();
            }
            None => self.view.set_input_state(true, INPUT_PLACEHOLDER, None),
        }
        transcript
    }
}
