use std::rc::Rc;

use super::capture::{CaptureDevice, CapturePipeline, DeviceEvent};
use super::context::SessionContext;
use super::session::SessionManager;
use super::view::View;
use crate::api::{Backend, SessionRecord};

/// Events sent from the chat window to the main-loop handler.
#[derive(Debug, Clone)]
pub enum AppEvent {
    SendRequested,
    MicToggled,
    NewChatRequested,
    SessionSelected(SessionRecord),
}

/// Central application state. Lives on the GTK main thread inside an `Rc`.
pub struct AppState {
    pub sessions: SessionManager,
    pub capture: CapturePipeline,
    pub auto_send_dictation: bool,
}

impl AppState {
    pub fn new(
        user_id: i64,
        context: Rc<SessionContext>,
        backend: Rc<dyn Backend>,
        view: Rc<dyn View>,
        device: Box<dyn CaptureDevice>,
        device_events: async_channel::Sender<DeviceEvent>,
    ) -> Self {
        Self {
            sessions: SessionManager::new(user_id, context, backend.clone(), view.clone()),
            capture: CapturePipeline::new(user_id, device, backend, view, device_events),
            auto_send_dictation: false,
        }
    }

    pub fn with_auto_send(mut self, enabled: bool) -> Self {
        self.auto_send_dictation = enabled;
        self
    }
}
