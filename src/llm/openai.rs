use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::{ChatMessage, ChatModel, ChatOptions, LlmError};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    finish_reason: Option<String>,
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete_json(
        &self,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let body = json!({
            "model": self.model,
            "messages": messages
                .iter()
                .map(|m| json!({ "role": m.role, "content": m.content }))
                .collect::<Vec<_>>(),
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            error!(%status, detail, "chat completion request failed");
            return Err(LlmError::Request(detail));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let choice = completion.choices.into_iter().next().ok_or(LlmError::Empty)?;
        match choice.finish_reason.as_deref() {
            None | Some("stop") => {}
            Some("length") => return Err(LlmError::Truncated),
            Some(reason) => {
                error!(reason, "unexpected finish reason");
                return Err(LlmError::Interrupted);
            }
        }

        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(content)
    }
}
