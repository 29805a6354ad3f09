//! Gemini `generateContent` wire shape.
//!
//! `base_url` is the API root; the model sits in the path and the key in
//! the `key` query parameter. Gemini has no system slot, so the prompt is
//! sent as a leading user turn, and assistant turns are relabelled `model`.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use mindrelay_types::llm::{LlmError, Message, MessageRole, ProviderConfig};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub role: &'a str,
    pub parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct Part<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    }
}

fn content<'a>(role: &'static str, text: &'a str) -> Content<'a> {
    Content {
        role,
        parts: [Part { text }],
    }
}

pub(crate) fn url(config: &ProviderConfig) -> Result<String, LlmError> {
    Ok(format!(
        "{}/models/{}:generateContent",
        config.endpoint()?,
        config.model
    ))
}

pub(crate) fn body<'a>(
    config: &ProviderConfig,
    system_prompt: &'a str,
    tail: &'a [Message],
) -> GenerateRequest<'a> {
    let mut contents = Vec::with_capacity(tail.len() + 1);
    contents.push(content("user", system_prompt));
    contents.extend(tail.iter().map(|m| content(role(m.role), &m.content)));
    GenerateRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
        },
    }
}

pub(crate) fn request(
    client: &reqwest::Client,
    config: &ProviderConfig,
    system_prompt: &str,
    tail: &[Message],
) -> Result<reqwest::RequestBuilder, LlmError> {
    Ok(client
        .post(url(config)?)
        .query(&[("key", config.api_key.expose_secret())])
        .json(&body(config, system_prompt, tail)))
}

/// `candidates[0].content.parts[0].text`.
pub(crate) fn extract_text(raw: &str) -> Result<String, LlmError> {
    let response: GenerateResponse =
        serde_json::from_str(raw).map_err(|e| LlmError::Parse(e.to_string()))?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            LlmError::Parse("missing candidates[0].content.parts[0].text".to_string())
        })
}
