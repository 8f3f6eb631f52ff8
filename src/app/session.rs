use std::cell::RefCell;
use std::rc::Rc;

use super::context::{new_session_id, SessionContext};
use super::view::{Bubble, Header, View};
use crate::api::{ApiError, Backend, ChatRequest, SessionRecord};

pub const GREETING: &str =
    "Hello. I am your Medical AI Assistant. How can I help you today?";

/// Where an outgoing message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Typed into the input; the input is cleared once the bubble is shown.
    Typed,
    /// Produced by dictation; the input is left for the caller to manage.
    Dictated,
}

/// Owns the active consultation and its rendered transcript.
pub struct SessionManager {
    user_id: i64,
    context: Rc<SessionContext>,
    backend: Rc<dyn Backend>,
    view: Rc<dyn View>,
    transcript: RefCell<Vec<Bubble>>,
    sessions: RefCell<Vec<SessionRecord>>,
}

impl SessionManager {
    pub fn new(
        user_id: i64,
        context: Rc<SessionContext>,
        backend: Rc<dyn Backend>,
        view: Rc<dyn View>,
    ) -> Self {
        Self {
            user_id,
            context,
            backend,
            view,
            transcript: RefCell::new(Vec::new()),
            sessions: RefCell::new(Vec::new()),
        }
    }

    pub fn active_session_id(&self) -> String {
        self.context.active_id()
    }

    pub fn transcript(&self) -> Vec<Bubble> {
        self.transcript.borrow().clone()
    }

    /// Last successfully fetched session list.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.borrow().clone()
    }

    /// Initial view: greeting for the restored session, then the sidebar.
    pub async fn open(&self) {
        self.show_greeting();
        self.refresh_sessions().await;
    }

    /// Fetch every session belonging to the signed-in user.
    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>, ApiError> {
        self.backend.list_sessions(self.user_id).await
    }

    /// Re-fetch and re-render the sidebar. On failure the previous list stays.
    pub async fn refresh_sessions(&self) {
        match self.list_sessions().await {
            Ok(sessions) => {
                log::debug!("Loaded {} sessions", sessions.len());
                *self.sessions.borrow_mut() = sessions;
                self.render_session_list();
            }
            Err(e) => log::error!("History load error: {e}"),
        }
    }

    /// Make a past session active and show its messages.
    pub async fn switch_to(&self, session: &SessionRecord) {
        self.show_session(session);
        self.refresh_sessions().await;
    }

    /// Start a blank consultation under a fresh identifier.
    pub async fn start_new(&self) {
        let id = new_session_id();
        log::info!("Starting new session {id}");
        self.context.activate(&id);
        self.show_greeting();
        self.refresh_sessions().await;
    }

    pub fn clear_input(&self) {
        self.view.clear_input();
    }

    /// Send whatever is in the input field.
    pub async fn submit_input(&self) {
        let text = self.view.input_text();
        self.send_message(&text, MessageOrigin::Typed).await;
    }

    /// Deliver a message on the active session with an optimistic local echo.
    ///
    /// The echo is never rolled back: a failed send only logs.
    pub async fn send_message(&self, text: &str, origin: MessageOrigin) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.push_bubble(Bubble::user(text));
        if origin == MessageOrigin::Typed {
            self.view.clear_input();
        }

        let request = ChatRequest {
            user_id: self.user_id,
            session_id: self.context.active_id(),
            message: text.to_string(),
        };
        match self.backend.send_message(&request).await {
            Ok(reply) => {
                if self.context.is_active(&request.session_id) {
                    self.push_bubble(Bubble::assistant(reply.response));
                } else {
                    log::info!(
                        "Reply for {} arrived after switching away, not rendered",
                        request.session_id
                    );
                }
                self.refresh_sessions().await;
            }
            Err(e) => log::error!("Message send failed: {e}"),
        }
    }

    fn show_session(&self, session: &SessionRecord) {
        log::info!("Switching to session {}", session.session_id);
        self.context.activate(&session.session_id);
        let bubbles: Vec<Bubble> = session.messages.iter().map(Bubble::from).collect();
        self.replace_transcript(bubbles);
        self.view.set_header(&Header::PastConsultation {
            date: session.created_date(),
        });
        self.render_session_list();
    }

    fn show_greeting(&self) {
        self.replace_transcript(vec![Bubble::assistant(GREETING)]);
        self.view.set_header(&Header::NewConsultation);
        self.render_session_list();
    }

    fn replace_transcript(&self, bubbles: Vec<Bubble>) {
        *self.transcript.borrow_mut() = bubbles;
        self.view.render_transcript(&self.transcript.borrow());
    }

    fn push_bubble(&self, bubble: Bubble) {
        self.transcript.borrow_mut().push(bubble);
        self.view.render_transcript(&self.transcript.borrow());
    }

    fn render_session_list(&self) {
        let active = self.context.active_id();
        self.view
            .render_session_list(&self.sessions.borrow(), &active);
    }
}
