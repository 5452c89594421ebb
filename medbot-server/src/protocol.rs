use axum::{
    Form,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use medbot_rag::ChatExchange;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Longest accepted chat message, in characters, after trimming.
pub const MAX_MESSAGE_LENGTH: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    /// The trimmed message, or a reason it cannot be answered.
    pub fn validated(&self) -> Result<&str, String> {
        let message = self.message.trim();
        if message.is_empty() {
            return Err("Message cannot be empty".to_string());
        }
        let len = message.chars().count();
        if len > MAX_MESSAGE_LENGTH {
            return Err(format!(
                "Message is too long ({len} characters, maximum is {MAX_MESSAGE_LENGTH})"
            ));
        }
        Ok(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub context_used: Vec<String>,
}

impl From<ChatExchange> for ChatResponse {
    fn from(exchange: ChatExchange) -> Self {
        Self { answer: exchange.answer, context_used: exchange.context_used }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self { status: "healthy".into(), message: "Chat service is operational".into() }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self { status: "unhealthy".into(), message: message.into() }
    }
}

/// Liveness payload for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Form body (or query string) of the plain-text `/get` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyForm {
    pub msg: String,
}

/// The `msg` field of a `/get` request, from the query string, a urlencoded
/// body or a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct LegacyMessage(pub String);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

impl<S> FromRequest<S> for LegacyMessage
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Form(form) = Form::<LegacyForm>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Ok(Self(form.msg));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        while let Some(field) =
            multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            if field.name() == Some("msg") {
                let msg = field.text().await.map_err(|e| ApiError::BadRequest(e.body_text()))?;
                return Ok(Self(msg));
            }
        }
        Err(ApiError::BadRequest("Missing form field `msg`".to_string()))
    }
}
