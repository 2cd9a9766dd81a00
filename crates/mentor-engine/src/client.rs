//! Client for the remote chat service.
//!
//! The chat widget only needs [`ChatService::send_message`]. The auxiliary
//! calls on [`HttpChatService`] (health, platforms, history) back the CLI's
//! one-shot commands.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Path of the chat endpoint, relative to the configured base URL.
pub const CHAT_PATH: &str = "chat";

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Learning platform the question relates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ChatRequest {
    /// Create a request carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            platform: None,
        }
    }

    /// Attach a platform id.
    #[must_use]
    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }
}

/// Successful reply from the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Reply text shown to the user.
    pub response: String,
    /// Server-side timestamp of the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Number of knowledge-base sections the reply drew on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_used: Option<u32>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub chatbot_initialized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A learning platform known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct PlatformList {
    platforms: Vec<Platform>,
}

/// One exchange recorded by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub bot: String,
    pub timestamp: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub sources_used: u32,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

/// The remote chat service: one message in, one reply out.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send one message and wait for the reply.
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ServiceError>;
}

/// [`ChatService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatService {
    client: reqwest::Client,
    base: Url,
}

impl HttpChatService {
    /// Create a client for the service rooted at `endpoint`.
    ///
    /// `timeout` of `None` means requests may wait forever.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| ServiceError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::InvalidEndpoint(endpoint.to_string()));
        }
        // Url::join replaces the last path segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ServiceError::Client)?;

        Ok(Self { client, base })
    }

    /// Base URL all endpoint paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an endpoint path against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|e| ServiceError::InvalidEndpoint(format!("{path}: {e}")))
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, ServiceError> {
        self.get_json("health").await
    }

    /// `GET /platforms`.
    pub async fn platforms(&self) -> Result<Vec<Platform>, ServiceError> {
        let list: PlatformList = self.get_json("platforms").await?;
        Ok(list.platforms)
    }

    /// `GET /history`.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ServiceError> {
        self.get_json("history").await
    }

    /// `DELETE /history`. Returns the server's confirmation message.
    pub async fn clear_history(&self) -> Result<String, ServiceError> {
        let url = self.url_for("history")?;
        debug!(%url, "DELETE");
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(ServiceError::Transport)?;
        let body: MessageBody = decode(response).await?;
        Ok(body.message)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.url_for(path)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ServiceError::Transport)?;
        decode(response).await
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply, ServiceError> {
        let url = self.url_for(CHAT_PATH)?;
        debug!(%url, chars = request.message.chars().count(), "POST chat message");
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(ServiceError::Transport)?;
        decode(response).await
    }
}

/// Check the status and decode a JSON body. Any non-2xx status is a failure.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response.text().await.map_err(ServiceError::Transport)?;
    if !status.is_success() {
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(ServiceError::Decode)
}

/// Errors talking to the chat service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The configured endpoint is not a usable base URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, or I/O failure.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Service returned HTTP {status}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON.
    #[error("Malformed response: {0}")]
    Decode(#[source] serde_json::Error),
}
