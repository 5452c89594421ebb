//! Gemini completion model using the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::synthesis::CompletionModel;

/// The default Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// The default completion model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A [`CompletionModel`] backed by Gemini's `generateContent` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use medbot_rag::gemini::GeminiCompletionModel;
///
/// let model = GeminiCompletionModel::new(api_key, "gemini-2.5-flash")?;
/// let answer = model.complete("You are a Medical assistant...", "What does aspirin do?").await?;
/// ```
pub struct GeminiCompletionModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiCompletionModel {
    /// Create a client for `model`, authenticated with `api_key`.
    ///
    /// Requests time out after 60 seconds unless overridden with
    /// [`with_timeout`](Self::with_timeout).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(RagError::Synthesis { model, message: "API key must not be empty".into() });
        }
        let client = Self::build_client(&model, DEFAULT_TIMEOUT)?;
        Ok(Self { client, api_key, model, base_url: DEFAULT_BASE_URL.into() })
    }

    /// Point the client at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Bound each completion call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Self::build_client(&self.model, timeout)?;
        Ok(self)
    }

    fn build_client(model: &str, timeout: Duration) -> Result<reqwest::Client> {
        reqwest::Client::builder().timeout(timeout).build().map_err(|e| RagError::Synthesis {
            model: model.to_string(),
            message: format!("failed to build http client: {e}"),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}models/{}:generateContent", self.base_url, self.model)
    }

    fn err(&self, message: impl Into<String>) -> RagError {
        RagError::Synthesis { model: self.model.clone(), message: message.into() }
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn describe_status(status: reqwest::StatusCode) -> &'static str {
    match status.as_u16() {
        401 | 403 => "authentication failed",
        429 => "rate limited",
        _ => "request rejected",
    }
}

/// The most useful description of a failed call: the API's own error
/// message when the body parses, the raw body otherwise, or why the body
/// could not be read.
fn error_detail<E: std::fmt::Display>(body: std::result::Result<String, E>) -> String {
    match body {
        Ok(body) => {
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
        }
        Err(e) => format!("failed to read error body: {e}"),
    }
}

fn answer_text(response: GenerateContentResponse) -> std::result::Result<String, String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(format!("prompt blocked: {reason}"));
    }
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err("response contained no text".into());
    }
    Ok(text)
}

#[async_trait]
impl CompletionModel for GeminiCompletionModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_instruction: &str, user_content: &str) -> Result<String> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: system_instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: user_content }],
            }],
        };

        debug!(model = %self.model, prompt_len = user_content.len(), "calling gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "request failed");
                self.err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await);
            error!(model = %self.model, %status, "API error");
            return Err(self.err(format!("{} ({status}): {detail}", describe_status(status))));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse response");
            self.err(format!("failed to parse response: {e}"))
        })?;

        answer_text(parsed).map_err(|message| self.err(message))
    }
}
