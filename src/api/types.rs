use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Patient,
    Doctor,
}

/// The signed-in user, as returned by `/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
}

impl UserRecord {
    /// Local part of the email address.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// One message of a stored consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
}

impl ChatMessage {
    pub fn is_patient(&self) -> bool {
        self.sender == "patient"
    }
}

/// A past consultation as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

const PREVIEW_CHARS: usize = 20;

impl SessionRecord {
    /// Sidebar preview: start of the first message, or a placeholder.
    pub fn preview(&self) -> String {
        match self.messages.first() {
            Some(first) => {
                let head: String = first.text.chars().take(PREVIEW_CHARS).collect();
                format!("{head}...")
            }
            None => "Empty Chat".to_string(),
        }
    }

    /// Creation date as `YYYY-MM-DD`, if the backend sent a parsable timestamp.
    pub fn created_date(&self) -> Option<String> {
        let raw = self.created_at.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.format("%Y-%m-%d").to_string());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

/// `/chat/` request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub user_id: i64,
    pub session_id: String,
    pub message: String,
}

/// `/chat/` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// `/transcribe/` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptReply {
    #[serde(default)]
    pub transcript: Option<String>,
}

/// An encoded recording ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub file_name: &'static str,
    pub mime_type: &'static str,
}

impl AudioPayload {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "voice_note.wav",
            mime_type: "audio/wav",
        }
    }
}
