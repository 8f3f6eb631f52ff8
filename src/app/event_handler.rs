use std::rc::Rc;

use super::capture::DeviceEvent;
use super::session::MessageOrigin;
use super::state::{AppEvent, AppState};

/// Handle one UI event. Each event runs in its own local future, so a slow
/// send never blocks the microphone toggle.
pub async fn handle_app_event(state: Rc<AppState>, event: AppEvent) {
    match event {
        AppEvent::SendRequested => state.sessions.submit_input().await,
        AppEvent::MicToggled => state.capture.toggle(),
        AppEvent::NewChatRequested => state.sessions.start_new().await,
        AppEvent::SessionSelected(session) => state.sessions.switch_to(&session).await,
    }
}

/// Handle one device event. Device events must be fed in order.
pub async fn handle_device_event(state: &AppState, event: DeviceEvent) {
    let Some(transcript) = state.capture.on_device_event(event).await else {
        return;
    };
    if state.auto_send_dictation {
        // The input holds the transcript; clear it so Send cannot repeat it.
        state.sessions.clear_input();
        state
            .sessions
            .send_message(&transcript, MessageOrigin::Dictated)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::capture::CapturePhase;
    use crate::app::context::SessionContext;
    use crate::app::testing::{session, FakeBackend, FakeDevice, FakeView};
    use crate::app::view::{Bubble, View};
    use crate::storage::MemoryStorage;

    struct Harness {
        device: Rc<FakeDevice>,
        backend: Rc<FakeBackend>,
        view: Rc<FakeView>,
        device_rx: async_channel::Receiver<DeviceEvent>,
        state: Rc<AppState>,
    }

    fn harness(auto_send: bool) -> Harness {
        let device = Rc::new(FakeDevice::default());
        let backend = Rc::new(FakeBackend::default());
        let view = Rc::new(FakeView::default());
        let (device_tx, device_rx) = async_channel::unbounded();
        let context = Rc::new(SessionContext::restore(Rc::new(MemoryStorage::default())));
        let state = AppState::new(
            3,
            context,
            backend.clone(),
            view.clone(),
            Box::new(device.clone()),
            device_tx,
        )
        .with_auto_send(auto_send);
        Harness {
            device,
            backend,
            view,
            device_rx,
            state: Rc::new(state),
        }
    }

    async fn dictate(h: &Harness, transcript: &str) {
        h.backend.queue_transcript(Some(transcript));
        handle_app_event(h.state.clone(), AppEvent::MicToggled).await;
        h.device.emit(&[0.1, 0.1]);
        handle_app_event(h.state.clone(), AppEvent::MicToggled).await;
        while let Ok(event) = h.device_rx.try_recv() {
            handle_device_event(&h.state, event).await;
        }
    }

    #[tokio::test]
    async fn dictation_fills_input_then_typed_send_delivers_it() {
        let h = harness(false);
        h.state.sessions.open().await;

        dictate(&h, "my ear hurts").await;
        assert!(h.backend.sent.borrow().is_empty());
        assert_eq!(h.view.input_text(), "my ear hurts");

        h.backend.queue_reply("Which ear?");
        handle_app_event(h.state.clone(), AppEvent::SendRequested).await;

        assert_eq!(h.view.input_text(), "");
        assert_eq!(
            h.view.transcript.borrow()[1..],
            [Bubble::user("my ear hurts"), Bubble::assistant("Which ear?")]
        );
    }

    #[tokio::test]
    async fn auto_send_delivers_dictation_once() {
        let h = harness(true);
        h.state.sessions.open().await;
        h.backend.queue_reply("Understood.");

        dictate(&h, "fever since monday").await;

        assert_eq!(h.backend.sent.borrow().len(), 1);
        assert_eq!(h.backend.sent.borrow()[0].message, "fever since monday");
        assert_eq!(h.view.input_text(), "");
        assert_eq!(h.state.capture.phase(), CapturePhase::Idle);

        handle_app_event(h.state.clone(), AppEvent::SendRequested).await;
        assert_eq!(h.backend.sent.borrow().len(), 1);
        assert_eq!(
            h.view.transcript.borrow()[1..],
            [
                Bubble::user("fever since monday"),
                Bubble::assistant("Understood.")
            ]
        );
    }

    #[tokio::test]
    async fn selected_session_becomes_the_send_target() {
        let h = harness(false);
        let past = session("sess_1", &[("patient", "hi")]);
        handle_app_event(h.state.clone(), AppEvent::SessionSelected(past)).await;
        assert_eq!(*h.view.transcript.borrow(), vec![Bubble::user("hi")]);

        h.backend.queue_reply("Welcome back");
        h.view.type_text("still unwell");
        handle_app_event(h.state.clone(), AppEvent::SendRequested).await;
        assert_eq!(h.backend.sent.borrow()[0].session_id, "sess_1");

        handle_app_event(h.state.clone(), AppEvent::NewChatRequested).await;
        assert_ne!(h.state.sessions.active_session_id(), "sess_1");
    }
}
