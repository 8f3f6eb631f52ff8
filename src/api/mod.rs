//! REST client for the consultation backend.

mod types;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

pub use types::{
    AudioPayload, ChatMessage, ChatReply, ChatRequest, Credentials, Role, SessionRecord,
    TranscriptReply, UserRecord,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("background task failed: {0}")]
    Task(String),
}

/// The backend calls the session manager and capture pipeline depend on.
#[async_trait(?Send)]
pub trait Backend {
    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionRecord>, ApiError>;
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;
    async fn transcribe(
        &self,
        user_id: i64,
        audio: AudioPayload,
    ) -> Result<TranscriptReply, ApiError>;
}

/// HTTP implementation of [`Backend`].
///
/// Requests run on the given tokio runtime; the returned futures only await
/// the join handle, so they can be polled from the GTK main loop.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokio_rt: tokio::runtime::Handle,
}

impl ApiClient {
    pub fn new(config: &Config, tokio_rt: tokio::runtime::Handle) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            tokio_rt,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn run<T, F>(&self, request: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.tokio_rt
            .spawn(request)
            .await
            .map_err(|e| ApiError::Task(e.to_string()))?
    }

    /// Exchange credentials for the user record.
    pub async fn login(&self, credentials: Credentials) -> Result<UserRecord, ApiError> {
        let http = self.http.clone();
        let url = self.url("/login");
        self.run(async move {
            let resp = http.post(&url).json(&credentials).send().await?;
            Ok(ensure_success(resp).await?.json().await?)
        })
        .await
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

#[async_trait(?Send)]
impl Backend for ApiClient {
    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionRecord>, ApiError> {
        let http = self.http.clone();
        let url = self.url(&format!("/users/{user_id}/chats/"));
        self.run(async move {
            let resp = http.get(&url).send().await?;
            Ok(ensure_success(resp).await?.json().await?)
        })
        .await
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let http = self.http.clone();
        let url = self.url("/chat/");
        let body = request.clone();
        self.run(async move {
            let resp = http.post(&url).json(&body).send().await?;
            Ok(ensure_success(resp).await?.json().await?)
        })
        .await
    }

    async fn transcribe(
        &self,
        user_id: i64,
        audio: AudioPayload,
    ) -> Result<TranscriptReply, ApiError> {
        let http = self.http.clone();
        let url = self.url("/transcribe/");
        self.run(async move {
            let file = reqwest::multipart::Part::bytes(audio.bytes)
                .file_name(audio.file_name)
                .mime_str(audio.mime_type)?;
            let form = reqwest::multipart::Form::new()
                .part("file", file)
                .text("user_id", user_id.to_string());
            let resp = http.post(&url).multipart(form).send().await?;
            Ok(ensure_success(resp).await?.json().await?)
        })
        .await
    }
}
