//! AI text generation over an [`LlmClient`].

use std::sync::Arc;

use async_trait::async_trait;

use super::{SourceError, TextGenerator};
use crate::llm::{ChatMessage, ChatOptions, LlmClient, LlmError, LlmErrorKind};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert AI Travel Scout.";

/// Text generator backed by a chat-completion model.
pub struct LlmTextGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    options: ChatOptions,
}

impl LlmTextGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions {
                temperature: Some(0.7),
                max_tokens: Some(1500),
            },
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<LlmError> for SourceError {
    fn from(e: LlmError) -> Self {
        match e.kind {
            LlmErrorKind::NetworkError => SourceError::Network(e.message),
            LlmErrorKind::ParseError => SourceError::Malformed(e.message),
            LlmErrorKind::RateLimited | LlmErrorKind::ServerError | LlmErrorKind::ClientError => {
                SourceError::Http {
                    status: e.status_code.unwrap_or(500),
                    body: e.message,
                }
            }
        }
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, SourceError> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(prompt)];
        let response = self
            .client
            .chat_completion(&self.model, &messages, self.options)
            .await?;

        if let Some(usage) = response.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        response
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SourceError::Malformed("completion had no content".to_string()))
    }
}

/// Used when no API key is configured. Every call fails so callers fall
/// back to their canned text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str, _system_prompt: &str) -> Result<String, SourceError> {
        Err(SourceError::MissingCredential("OPENROUTER_API_KEY"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::llm::{ChatResponse, Role};

    /// Records the messages it receives and replies with a fixed text.
    struct Scripted {
        reply: Option<String>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmClient for Scripted {
        async fn chat_completion(
            &self,
            model: &str,
            messages: &[ChatMessage],
            _options: ChatOptions,
        ) -> Result<ChatResponse, LlmError> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            Ok(ChatResponse {
                content: self.reply.clone(),
                usage: None,
                model: Some(model.to_string()),
            })
        }
    }

    #[tokio::test]
    async fn sends_system_then_user_message() {
        let client = Arc::new(Scripted {
            reply: Some("  Try Kyoto in spring. ".into()),
            seen: Mutex::new(Vec::new()),
        });
        let generator = LlmTextGenerator::new(client.clone(), "test/model");
        let text = generator.generate("Where next?", DEFAULT_SYSTEM_PROMPT).await.unwrap();
        assert_eq!(text, "Try Kyoto in spring.");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].role, Role::System);
        assert_eq!(seen[1].content, "Where next?");
    }

    #[tokio::test]
    async fn empty_completion_is_malformed() {
        let client = Arc::new(Scripted {
            reply: None,
            seen: Mutex::new(Vec::new()),
        });
        let err = LlmTextGenerator::new(client, "m")
            .generate("p", "s")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn unconfigured_generator_names_the_key() {
        let err = UnconfiguredGenerator.generate("p", "s").await.unwrap_err();
        assert_eq!(err.to_string(), "OPENROUTER_API_KEY is not configured");
    }

    #[test]
    fn llm_errors_keep_transience() {
        let rate: SourceError = LlmError::rate_limited("slow".into(), None).into();
        assert!(rate.is_transient());
        let auth: SourceError = LlmError::client_error(401, "bad key".into()).into();
        assert!(!auth.is_transient());
    }
}
