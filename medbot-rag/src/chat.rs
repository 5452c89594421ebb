//! Question answering over the indexed corpus.

use tracing::{error, info, warn};

use crate::document::ChatExchange;
use crate::error::Result;
use crate::pipeline::RagPipeline;
use crate::synthesis::AnswerSynthesizer;

/// The fixed question used by [`ChatService::health_check`].
pub const HEALTH_PROBE: &str = "test";

const LOG_PREVIEW_CHARS: usize = 50;

fn preview(question: &str) -> String {
    let mut out: String = question.chars().take(LOG_PREVIEW_CHARS).collect();
    if question.chars().nth(LOG_PREVIEW_CHARS).is_some() {
        out.push_str("...");
    }
    out
}

/// Retrieves context for a question and asks the completion model to answer it.
///
/// Holds no per-request state; one instance is shared by every request.
pub struct ChatService {
    pipeline: RagPipeline,
    synthesizer: AnswerSynthesizer,
}

impl ChatService {
    pub fn new(pipeline: RagPipeline, synthesizer: AnswerSynthesizer) -> Self {
        Self { pipeline, synthesizer }
    }

    /// Answer `question` from the top-k retrieved chunks.
    ///
    /// `context_used` lists the distinct source paths of those chunks in
    /// retrieval order.
    ///
    /// # Errors
    ///
    /// Any loader, embedding, index or synthesis failure is returned as-is.
    pub async fn process(&self, question: &str) -> Result<ChatExchange> {
        info!(question = %preview(question), "processing question");

        let results = self.pipeline.query(question).await?;
        let contexts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        let answer = self.synthesizer.synthesize(question, &contexts).await?;

        let mut context_used: Vec<String> = Vec::new();
        for result in &results {
            if !context_used.iter().any(|s| *s == result.chunk.source) {
                context_used.push(result.chunk.source.clone());
            }
        }

        info!(chunks = results.len(), sources = context_used.len(), "question answered");
        Ok(ChatExchange { question: question.to_string(), answer, context_used })
    }

    /// Run [`HEALTH_PROBE`] through the full pipeline.
    ///
    /// Healthy means a non-empty answer came back. Failures are logged and
    /// reported as `false`, never returned.
    pub async fn health_check(&self) -> bool {
        match self.process(HEALTH_PROBE).await {
            Ok(exchange) if !exchange.answer.trim().is_empty() => true,
            Ok(_) => {
                warn!("health check produced an empty answer");
                false
            }
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_questions() {
        let long = "a".repeat(80);
        assert_eq!(preview(&long), format!("{}...", "a".repeat(50)));
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"é".repeat(50)), "é".repeat(50));
    }
}
