use crate::api::{ChatMessage, SessionRecord};

/// Placeholder of the chat input when it accepts text.
pub const INPUT_PLACEHOLDER: &str = "Type or dictate...";
/// Placeholder while a recording is being transcribed.
pub const TRANSCRIBING_PLACEHOLDER: &str = "Transcribing\u{2026}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleRole {
    User,
    Assistant,
}

/// One rendered chat bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: BubbleRole,
    pub text: String,
}

impl Bubble {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: BubbleRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: BubbleRole::Assistant,
            text: text.into(),
        }
    }
}

impl From<&ChatMessage> for Bubble {
    fn from(msg: &ChatMessage) -> Self {
        if msg.is_patient() {
            Self::user(msg.text.clone())
        } else {
            Self::assistant(msg.text.clone())
        }
    }
}

/// Conversation header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    NewConsultation,
    PastConsultation { date: Option<String> },
}

impl Header {
    pub fn title(&self) -> &str {
        match self {
            Header::NewConsultation => "New Consultation",
            Header::PastConsultation { .. } => "Past Consultation",
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Header::NewConsultation => "Active",
            Header::PastConsultation { date } => date.as_deref().unwrap_or(""),
        }
    }
}

/// Everything the core needs from the screen. Implemented by the GTK chat
/// window and by a recording fake in tests.
pub trait View {
    fn render_transcript(&self, bubbles: &[Bubble]);
    fn render_session_list(&self, sessions: &[SessionRecord], active_id: &str);
    fn set_header(&self, header: &Header);
    /// `value: None` leaves the current input text untouched.
    fn set_input_state(&self, enabled: bool, placeholder: &str, value: Option<&str>);
    fn input_text(&self) -> String;
    fn clear_input(&self);
    fn focus_input(&self);
    fn set_recording(&self, recording: bool);
    /// Blocking notice the user must acknowledge.
    fn alert(&self, message: &str);
    /// Transient notice that dismisses itself.
    fn notify(&self, message: &str);
}
