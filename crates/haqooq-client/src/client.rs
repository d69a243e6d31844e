use async_trait::async_trait;
use haqooq_core::{RequestToken, SessionEvent};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Default answer endpoint
pub const DEFAULT_ENDPOINT: &str = "https://ary91-haqooqai-backend.hf.space/ask/";

#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub query: &'a str,
}

/// Body returned by the answer service.
///
/// Only `answer` matters to the session. The reference backend also sends
/// `status` and, on its own failures, `message`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AskResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AskResponse {
    /// The answer text if present and non-empty
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.is_empty())
    }
}

/// Something that can answer a single query
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, query: &str) -> ClientResult<AskResponse>;
}

/// HTTP client for the answer service
#[derive(Debug, Clone)]
pub struct AnswerClient {
    endpoint: String,
    client: Client,
}

impl AnswerClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for AnswerClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl AnswerService for AnswerClient {
    async fn ask(&self, query: &str) -> ClientResult<AskResponse> {
        let request = AskRequest { query };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: AskResponse = serde_json::from_str(&text)?;
        Ok(body)
    }
}

/// Map a finished request onto the session event it produces.
pub fn completion_event(token: RequestToken, result: ClientResult<AskResponse>) -> SessionEvent {
    match result {
        Ok(response) => {
            if response.answer().is_none() {
                warn!(
                    %token,
                    status = response.status.as_deref().unwrap_or("-"),
                    message = response.message.as_deref().unwrap_or("-"),
                    "answer service returned no answer"
                );
            } else {
                debug!(%token, "answer received");
            }
            SessionEvent::Answered {
                token,
                answer: response.answer,
            }
        }
        Err(e) => {
            warn!(%token, kind = e.kind(), error = %e, "answer request failed");
            SessionEvent::TransportFailed { token }
        }
    }
}
