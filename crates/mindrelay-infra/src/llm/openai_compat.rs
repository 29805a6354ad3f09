//! OpenAI chat-completions wire shape.
//!
//! Spoken by OpenAI, Groq, Ollama, OpenRouter and any `custom` endpoint.
//! The system prompt travels as a leading `system` message.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use mindrelay_types::llm::{LlmError, Message, ProviderConfig, ProviderKind};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub(crate) fn body<'a>(
    config: &'a ProviderConfig,
    system_prompt: &'a str,
    tail: &'a [Message],
) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(tail.len() + 1);
    messages.push(ChatMessage {
        role: "system",
        content: system_prompt,
    });
    messages.extend(tail.iter().map(|m| ChatMessage {
        role: m.role.as_str(),
        content: &m.content,
    }));
    ChatRequest {
        model: &config.model,
        messages,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

pub(crate) fn request(
    client: &reqwest::Client,
    config: &ProviderConfig,
    system_prompt: &str,
    tail: &[Message],
) -> Result<reqwest::RequestBuilder, LlmError> {
    let mut builder = client
        .post(config.endpoint()?)
        .json(&body(config, system_prompt, tail));
    if config.provider.requires_api_key() {
        builder = builder.bearer_auth(config.api_key.expose_secret());
    }
    if config.provider == ProviderKind::OpenRouter {
        if let Some(referer) = &config.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
    }
    Ok(builder)
}

/// `choices[0].message.content`.
pub(crate) fn extract_text(raw: &str) -> Result<String, LlmError> {
    let response: ChatResponse =
        serde_json::from_str(raw).map_err(|e| LlmError::Parse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::Parse("missing choices[0].message.content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> ProviderConfig {
        ProviderConfig {
            provider: ProviderKind::Groq,
            api_key: SecretString::from("gsk-test"),
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            base_url: None,
            referer: None,
        }
    }

    #[test]
    fn test_body_leads_with_system_message() {
        let config = config();
        let tail = vec![Message::user("hi"), Message::assistant("MSG: hello")];
        let json = serde_json::to_value(body(&config, "SYS", &tail)).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "SYS");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][2]["role"], "assistant");
    }

    #[test]
    fn test_extract_text() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"MSG: hi"}}]}"#;
        assert_eq!(extract_text(raw).unwrap(), "MSG: hi");
    }

    #[test]
    fn test_extract_text_missing_field() {
        assert!(matches!(extract_text(r#"{"choices":[]}"#), Err(LlmError::Parse(_))));
        assert!(matches!(
            extract_text(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(LlmError::Parse(_))
        ));
        assert!(matches!(extract_text(r#"{"id":"x"}"#), Err(LlmError::Parse(_))));
    }
}
