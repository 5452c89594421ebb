//! Grounded answer synthesis.
//!
//! An [`AnswerSynthesizer`] turns a question and its retrieved context into a
//! single completion request: a system instruction with the context inlined,
//! and the question as the user turn. The backend is any [`CompletionModel`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{RagError, Result};

const CONCISE_TEMPLATE: &str = "You are a Medical assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\n{context}";

const DETAILED_TEMPLATE: &str = "\
You are an expert medical assistant designed to help with medical questions. \
Use the provided medical context to answer questions accurately and safely. \
Always prioritize patient safety and recommend consulting healthcare professionals \
for serious medical concerns. \
If the context doesn't contain relevant information, clearly state that you don't have \
enough information to answer the question.\n\n\
Context: {context}";

/// Appended to answers when the disclaimer is enabled.
pub const SAFETY_DISCLAIMER: &str = "\n\n\
Important: This information is for educational purposes only \
and should not replace professional medical advice. \
Please consult with a healthcare provider for proper diagnosis and treatment.";

/// A chat-completion backend taking a system instruction and one user turn.
///
/// Implementations report every upstream failure, including authentication
/// and rate limiting, as [`RagError::Synthesis`]. No retries happen here.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// The model identifier, used in logs and errors.
    fn name(&self) -> &str;

    /// Generate a reply to `user_content` under `system_instruction`.
    async fn complete(&self, system_instruction: &str, user_content: &str) -> Result<String>;
}

/// Which system instruction template to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Short grounded answers, at most three sentences.
    #[default]
    Concise,
    /// Longer answers that stress patient safety.
    Detailed,
}

impl PromptStyle {
    fn template(self) -> &'static str {
        match self {
            PromptStyle::Concise => CONCISE_TEMPLATE,
            PromptStyle::Detailed => DETAILED_TEMPLATE,
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStyle::Concise => f.write_str("concise"),
            PromptStyle::Detailed => f.write_str("detailed"),
        }
    }
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(PromptStyle::Concise),
            "detailed" => Ok(PromptStyle::Detailed),
            other => {
                Err(format!("unknown prompt style '{other}' (expected 'concise' or 'detailed')"))
            }
        }
    }
}

/// Builds the grounded prompt and calls the completion model.
pub struct AnswerSynthesizer {
    model: Arc<dyn CompletionModel>,
    style: PromptStyle,
    safety_disclaimer: bool,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model, style: PromptStyle::default(), safety_disclaimer: false }
    }

    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self
    }

    /// Append [`SAFETY_DISCLAIMER`] to every answer.
    pub fn with_safety_disclaimer(mut self, enabled: bool) -> Self {
        self.safety_disclaimer = enabled;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// The system instruction for the given context chunks, joined by blank lines.
    pub fn system_instruction(&self, contexts: &[&str]) -> String {
        self.style.template().replace("{context}", &contexts.join("\n\n"))
    }

    /// Answer `question` from `contexts`, returning the model text as-is.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`RagError::Synthesis`] unchanged.
    pub async fn synthesize(&self, question: &str, contexts: &[&str]) -> Result<String> {
        let instruction = self.system_instruction(contexts);
        debug!(model = self.model.name(), context_chunks = contexts.len(), "requesting completion");

        let mut answer = self.model.complete(&instruction, question).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "completion failed");
            match e {
                RagError::Synthesis { .. } => e,
                other => RagError::Synthesis {
                    model: self.model.name().to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        if self.safety_disclaimer {
            answer.push_str(SAFETY_DISCLAIMER);
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl CompletionModel for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn complete(&self, system_instruction: &str, user_content: &str) -> Result<String> {
            self.calls.lock().unwrap().push((system_instruction.into(), user_content.into()));
            if self.fail {
                return Err(RagError::Synthesis {
                    model: "recorder".into(),
                    message: "429 quota".into(),
                });
            }
            Ok("Aspirin reduces fever.".into())
        }
    }

    #[tokio::test]
    async fn context_is_inlined_and_question_is_user_turn() {
        let model = Arc::new(Recorder::default());
        let synth = AnswerSynthesizer::new(model.clone());
        let answer =
            synth.synthesize("What does aspirin do?", &["ctx one", "ctx two"]).await.unwrap();
        assert_eq!(answer, "Aspirin reduces fever.");

        let calls = model.calls.lock().unwrap();
        let (system, user) = &calls[0];
        assert!(system.starts_with("You are a Medical assistant"));
        assert!(system.ends_with("ctx one\n\nctx two"));
        assert!(system.contains("say that you don't know"));
        assert_eq!(user, "What does aspirin do?");
    }

    #[tokio::test]
    async fn upstream_errors_propagate() {
        let synth = AnswerSynthesizer::new(Arc::new(Recorder { fail: true, ..Default::default() }));
        let err = synth.synthesize("q", &[]).await.unwrap_err();
        assert!(matches!(err, RagError::Synthesis { ref message, .. } if message == "429 quota"));
    }

    #[tokio::test]
    async fn disclaimer_is_appended_when_enabled() {
        let synth =
            AnswerSynthesizer::new(Arc::new(Recorder::default())).with_safety_disclaimer(true);
        let answer = synth.synthesize("q", &["c"]).await.unwrap();
        assert!(answer.starts_with("Aspirin reduces fever."));
        assert!(answer.ends_with("proper diagnosis and treatment."));
    }

    #[test]
    fn detailed_style_uses_safety_prompt() {
        let synth = AnswerSynthesizer::new(Arc::new(Recorder::default()))
            .with_style(PromptStyle::Detailed);
        let instruction = synth.system_instruction(&["insulin lowers glucose"]);
        assert!(instruction.contains("patient safety"));
        assert!(instruction.ends_with("Context: insulin lowers glucose"));
    }

    #[test]
    fn prompt_style_parses_and_displays() {
        assert_eq!("Detailed".parse::<PromptStyle>().unwrap(), PromptStyle::Detailed);
        assert_eq!(PromptStyle::Concise.to_string(), "concise");
        assert!("verbose".parse::<PromptStyle>().is_err());
    }
}
