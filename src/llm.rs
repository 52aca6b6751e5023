//! Generative language backend for open-ended questions

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Answers free-form prompts
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt` with at most `max_tokens` tokens
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// `OpenAI` chat completions client
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    system_prompt: String,
}

impl OpenAiChat {
    /// Create a client that answers as `assistant_name`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        api_key: Option<SecretString>,
        model: String,
        assistant_name: &str,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| Error::Config("OpenAI API key required for questions".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            system_prompt: system_prompt(assistant_name),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion error");
            return Err(Error::Llm(format!("chat completion error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await?;
        let answer = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::Llm("empty completion".to_string()))?;

        tracing::debug!(model = %self.model, answer_len = answer.len(), "completion received");
        Ok(answer)
    }
}

/// Build the system prompt for an assistant name
fn system_prompt(assistant_name: &str) -> String {
    format!(
        "You are a helpful and concise assistant named {}. Respond in the language of the query.",
        capitalize(assistant_name)
    )
}

/// Uppercase the first character
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_assistant() {
        assert_eq!(
            system_prompt("pasha"),
            "You are a helpful and concise assistant named Pasha. Respond in the language of the query."
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("pasha"), "Pasha");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        assert!(OpenAiChat::new(None, "gpt-3.5-turbo".to_string(), "pasha").is_err());
    }

    #[test]
    fn test_response_parse() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":" Paris. "}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" Paris. "));
    }
}
