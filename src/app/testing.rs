//! Headless fakes for the backend, the view and the microphone.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;

use super::capture::{CaptureDevice, DeviceEvent, DeviceHandle};
use super::view::{Bubble, Header, View};
use crate::api::{
    ApiError, AudioPayload, Backend, ChatMessage, ChatReply, ChatRequest, SessionRecord,
    TranscriptReply,
};
use crate::recorder::CaptureError;

pub fn offline() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "offline".into(),
    }
}

pub fn session(id: &str, messages: &[(&str, &str)]) -> SessionRecord {
    SessionRecord {
        session_id: id.into(),
        created_at: Some("2025-01-02T09:30:00".into()),
        messages: messages
            .iter()
            .map(|(sender, text)| ChatMessage {
                sender: (*sender).into(),
                text: (*text).into(),
            })
            .collect(),
    }
}

/// Backend answering from queued responses and recording every call.
#[derive(Default)]
pub struct FakeBackend {
    pub sessions: RefCell<VecDeque<Result<Vec<SessionRecord>, ApiError>>>,
    pub replies: RefCell<VecDeque<Result<ChatReply, ApiError>>>,
    pub transcripts: RefCell<VecDeque<Result<TranscriptReply, ApiError>>>,
    pub list_calls: Cell<usize>,
    pub sent: RefCell<Vec<ChatRequest>>,
    pub uploads: RefCell<Vec<(i64, AudioPayload)>>,
    /// When set, each upload records the input state `(enabled, placeholder)` seen mid-flight.
    pub observe: RefCell<Option<Rc<FakeView>>>,
    pub input_during_upload: RefCell<Vec<(bool, String)>>,
    /// When set, the next reply is held until a value arrives on this channel.
    pub reply_gate: RefCell<Option<async_channel::Receiver<()>>>,
}

impl FakeBackend {
    pub fn queue_sessions(&self, sessions: Vec<SessionRecord>) {
        self.sessions.borrow_mut().push_back(Ok(sessions));
    }

    pub fn queue_sessions_error(&self) {
        self.sessions.borrow_mut().push_back(Err(offline()));
    }

    pub fn queue_reply(&self, text: &str) {
        self.replies.borrow_mut().push_back(Ok(ChatReply {
            response: text.into(),
        }));
    }

    pub fn queue_reply_error(&self) {
        self.replies.borrow_mut().push_back(Err(offline()));
    }

    pub fn queue_transcript(&self, transcript: Option<&str>) {
        self.transcripts.borrow_mut().push_back(Ok(TranscriptReply {
            transcript: transcript.map(str::to_string),
        }));
    }

    pub fn queue_transcript_error(&self) {
        self.transcripts.borrow_mut().push_back(Err(offline()));
    }
}

#[async_trait(?Send)]
impl Backend for FakeBackend {
    async fn list_sessions(&self, _user_id: i64) -> Result<Vec<SessionRecord>, ApiError> {
        self.list_calls.set(self.list_calls.get() + 1);
        self.sessions
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.sent.borrow_mut().push(request.clone());
        let gate = self.reply_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.recv().await;
        }
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(offline()))
    }

    async fn transcribe(
        &self,
        user_id: i64,
        audio: AudioPayload,
    ) -> Result<TranscriptReply, ApiError> {
        self.uploads.borrow_mut().push((user_id, audio));
        if let Some(view) = self.observe.borrow().as_ref() {
            self.input_during_upload
                .borrow_mut()
                .push((view.input_enabled.get(), view.placeholder.borrow().clone()));
        }
        self.transcripts
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(TranscriptReply::default()))
    }
}

/// View that remembers the latest state of every surface.
pub struct FakeView {
    pub transcript: RefCell<Vec<Bubble>>,
    pub transcript_renders: Cell<usize>,
    pub session_list: RefCell<Vec<String>>,
    pub session_list_renders: Cell<usize>,
    pub active_marker: RefCell<Option<String>>,
    pub header: RefCell<Option<Header>>,
    pub input: RefCell<String>,
    pub input_enabled: Cell<bool>,
    pub placeholder: RefCell<String>,
    pub focused: Cell<bool>,
    pub recording: Cell<bool>,
    pub alerts: RefCell<Vec<String>>,
    pub notices: RefCell<Vec<String>>,
}

impl Default for FakeView {
    fn default() -> Self {
        Self {
            transcript: RefCell::default(),
            transcript_renders: Cell::new(0),
            session_list: RefCell::default(),
            session_list_renders: Cell::new(0),
            active_marker: RefCell::default(),
            header: RefCell::default(),
            input: RefCell::default(),
            input_enabled: Cell::new(true),
            placeholder: RefCell::default(),
            focused: Cell::new(false),
            recording: Cell::new(false),
            alerts: RefCell::default(),
            notices: RefCell::default(),
        }
    }
}

impl FakeView {
    pub fn type_text(&self, text: &str) {
        *self.input.borrow_mut() = text.to_string();
    }
}

impl View for FakeView {
    fn render_transcript(&self, bubbles: &[Bubble]) {
        *self.transcript.borrow_mut() = bubbles.to_vec();
        self.transcript_renders.set(self.transcript_renders.get() + 1);
    }

    fn render_session_list(&self, sessions: &[SessionRecord], active_id: &str) {
        *self.session_list.borrow_mut() = sessions.iter().map(|s| s.session_id.clone()).collect();
        *self.active_marker.borrow_mut() = sessions
            .iter()
            .find(|s| s.session_id == active_id)
            .map(|s| s.session_id.clone());
        self.session_list_renders
            .set(self.session_list_renders.get() + 1);
    }

    fn set_header(&self, header: &Header) {
        *self.header.borrow_mut() = Some(header.clone());
    }

    fn set_input_state(&self, enabled: bool, placeholder: &str, value: Option<&str>) {
        self.input_enabled.set(enabled);
        *self.placeholder.borrow_mut() = placeholder.to_string();
        if let Some(v) = value {
            *self.input.borrow_mut() = v.to_string();
        }
    }

    fn input_text(&self) -> String {
        self.input.borrow().clone()
    }

    fn clear_input(&self) {
        self.input.borrow_mut().clear();
    }

    fn focus_input(&self) {
        self.focused.set(true);
    }

    fn set_recording(&self, recording: bool) {
        self.recording.set(recording);
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}

/// Microphone that either refuses access or hands out scripted handles.
#[derive(Default)]
pub struct FakeDevice {
    pub deny: Cell<bool>,
    pub acquisitions: Rc<Cell<usize>>,
    pub stops: Rc<Cell<usize>>,
    /// Sender of the latest acquisition, for pushing fragments from tests.
    pub events: RefCell<Option<async_channel::Sender<DeviceEvent>>>,
}

impl FakeDevice {
    pub fn denied() -> Self {
        let device = Self::default();
        device.deny.set(true);
        device
    }

    pub fn emit(&self, samples: &[f32]) {
        if let Some(tx) = self.events.borrow().as_ref() {
            let _ = tx.try_send(DeviceEvent::Fragment(samples.to_vec()));
        }
    }
}

impl CaptureDevice for Rc<FakeDevice> {
    fn acquire(
        &self,
        events: async_channel::Sender<DeviceEvent>,
    ) -> Result<Box<dyn DeviceHandle>, CaptureError> {
        if self.deny.get() {
            return Err(CaptureError::Device("permission denied".into()));
        }
        self.acquisitions.set(self.acquisitions.get() + 1);
        *self.events.borrow_mut() = Some(events.clone());
        Ok(Box::new(FakeHandle {
            events,
            stops: self.stops.clone(),
        }))
    }
}

struct FakeHandle {
    events: async_channel::Sender<DeviceEvent>,
    stops: Rc<Cell<usize>>,
}

impl DeviceHandle for FakeHandle {
    fn sample_rate(&self) -> u32 {
        16000
    }

    fn stop(self: Box<Self>) {
        self.stops.set(self.stops.get() + 1);
        let _ = self.events.try_send(DeviceEvent::Stopped);
    }
}
