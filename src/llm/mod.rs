//! LLM chat completion: trait seam, error taxonomy and the truncation-retry
//! policy around JSON-object responses.

mod openai;

pub use openai::OpenAiChat;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY manquant.")]
    NotConfigured,
    #[error("Appel au modèle échoué: {0}")]
    Request(String),
    #[error("Réponse vide du modèle")]
    Empty,
    #[error("Réponse du modèle tronquée")]
    Truncated,
    #[error("Impossible de parser la réponse JSON du modèle.")]
    Unparsable,
    #[error("La génération IA a été interrompue. Réessayez.")]
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Chat-completion backend returning the raw content string. `Truncated` is
/// surfaced as its own error so the caller can retry with a tighter prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete_json(
        &self,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, LlmError>;
}

/// Strips a Markdown fence or surrounding prose and returns the first JSON
/// object embedded in `content`, if any.
pub fn extract_first_json_block(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if !inner.is_empty() {
                return Some(inner);
            }
        }
    }
    let open = trimmed.find('{')?;
    let close = trimmed.rfind('}')?;
    (close > open).then(|| &trimmed[open..=close])
}

/// Requests a JSON object from the model, retrying once with a "be concise"
/// instruction and a raised token cap when the first attempt was truncated.
/// A second failure surfaces as `Interrupted`.
pub async fn complete_json_with_retry(
    model: &dyn ChatModel,
    messages: &[ChatMessage],
    options: ChatOptions,
) -> Result<serde_json::Value, LlmError> {
    let mut attempt_messages = messages.to_vec();
    let mut attempt_options = options;

    for attempt in 0..2 {
        match model.complete_json(&attempt_messages, attempt_options).await {
            Ok(content) => {
                let cleaned = extract_first_json_block(&content).unwrap_or(content.trim());
                return serde_json::from_str(cleaned).map_err(|e| {
                    warn!(error = %e, "model response is not valid JSON");
                    LlmError::Unparsable
                });
            }
            Err(LlmError::Truncated) if attempt == 0 => {
                warn!("model response truncated, retrying with shorter prompt");
                attempt_messages = messages.to_vec();
                attempt_messages.push(ChatMessage::system(
                    "La réponse précédente était trop longue. Génère de nouveau un JSON concis \
                     en respectant exactement le format demandé, avec uniquement le nombre de \
                     jours requis et au plus 3 repas et 3 ingrédients principaux par repas.",
                ));
                attempt_options.max_tokens = (attempt_options.max_tokens + 500).min(3500);
            }
            Err(LlmError::Truncated) => return Err(LlmError::Interrupted),
            Err(e) => return Err(e),
        }
    }

    Err(LlmError::Interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedModel {
        responses: Vec<Result<String, LlmError>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete_json(
            &self,
            _messages: &[ChatMessage],
            _options: ChatOptions,
        ) -> Result<String, LlmError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.responses[idx.min(self.responses.len() - 1)] {
                Ok(s) => Ok(s.clone()),
                Err(LlmError::Truncated) => Err(LlmError::Truncated),
                Err(LlmError::Empty) => Err(LlmError::Empty),
                Err(_) => Err(LlmError::Interrupted),
            }
        }
    }

    #[test]
    fn extracts_fenced_and_bare_json() {
        assert_eq!(
            extract_first_json_block("```json\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(
            extract_first_json_block("Voici le plan: {\"days\": []} merci"),
            Some("{\"days\": []}")
        );
        assert_eq!(extract_first_json_block("no json here"), None);
    }

    #[tokio::test]
    async fn retries_once_on_truncation() {
        let model = ScriptedModel {
            responses: vec![Err(LlmError::Truncated), Ok("{\"days\": []}".into())],
            calls: AtomicUsize::new(0),
        };
        let value = complete_json_with_retry(&model, &[ChatMessage::user("x")], ChatOptions::default())
            .await
            .unwrap();
        assert_eq!(value["days"], serde_json::json!([]));
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_truncation_is_fatal() {
        let model = ScriptedModel {
            responses: vec![Err(LlmError::Truncated), Err(LlmError::Truncated)],
            calls: AtomicUsize::new(0),
        };
        let err = complete_json_with_retry(&model, &[ChatMessage::user("x")], ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Interrupted));
    }

    #[tokio::test]
    async fn unparsable_json_is_not_retried() {
        let model = ScriptedModel {
            responses: vec![Ok("not json at all".into())],
            calls: AtomicUsize::new(0),
        };
        let err = complete_json_with_retry(&model, &[ChatMessage::user("x")], ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Unparsable));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
