use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::models::{ChatMessage, LlmConfig, Provider};

/// The completion capability the core depends on: a model name, the full
/// ordered history and a temperature in, one plain-text assistant reply out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError>;
}

/// HTTP client for OpenAI-compatible and Ollama chat endpoints
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    api_key: Option<String>,
    stream_to_stdout: bool,
}

/// Request body for both chat endpoints
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama streaming chunk
#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    done: bool,
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// OpenAI-compatible completion response
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<serde_json::Value>,
}

/// Flatten a message `content` that is either a string or an array of parts
fn normalize_content(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(parts) => parts
            .iter()
            .filter_map(|p| match p {
                serde_json::Value::String(s) => Some(s.as_str()),
                other => other.get("text").and_then(|t| t.as_str()),
            })
            .collect::<Vec<_>>()
            .join(""),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl LlmClient {
    /// Create a client; the API key is read from the configured env var
    pub fn new(config: LlmConfig, stream_to_stdout: bool) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            client,
            config,
            api_key,
            stream_to_stdout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_connect() {
            LlmError::ConnectionRefused(format!(
                "Could not connect to {}. Is the LLM endpoint running?",
                self.config.url
            ))
        } else if e.is_timeout() {
            LlmError::Timeout(self.config.timeout_seconds)
        } else {
            LlmError::from(e)
        }
    }

    async fn complete_openai(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.config.api_key_env.clone()))?;
        let url = format!("{}/chat/completions", self.config.url.trim_end_matches('/'));
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            temperature: Some(temperature),
            options: None,
        };

        debug!("Sending chat request to {} ({} messages)", url, messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpError { status, message });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let content = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(normalize_content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        info!("Received {} characters", content.len());
        Ok(content)
    }

    async fn complete_ollama(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.config.url.trim_end_matches('/'));
        let request = ChatRequest {
            model,
            messages,
            stream: true,
            temperature: None,
            options: Some(OllamaOptions { temperature }),
        };

        debug!("Sending chat request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpError { status, message });
        }

        let mut full_response = String::new();
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        'outer: while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_seconds)
                } else {
                    LlmError::StreamError(e.to_string())
                }
            })?;

            // Ollama sends newline-delimited JSON
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline_pos) = buffer.find('\n') {
                let line = buffer[..newline_pos].to_string();
                buffer.drain(..=newline_pos);

                if line.trim().is_empty() {
                    continue;
                }

                let parsed: OllamaChunk = match serde_json::from_str(&line) {
                    Ok(p) => p,
                    Err(e) if !full_response.is_empty() => {
                        debug!("Ignoring parse error on trailing chunk: {}", e);
                        continue;
                    }
                    Err(e) => return Err(LlmError::ParseError(e.to_string())),
                };

                let content = parsed.message.as_ref().map(|m| m.content.as_str()).unwrap_or("");
                full_response.push_str(content);

                if self.stream_to_stdout {
                    print!("{}", content);
                    io::stdout().flush().ok();
                }

                if parsed.done {
                    if self.stream_to_stdout {
                        println!();
                    }
                    if let Some(duration) = parsed.total_duration {
                        debug!("Generation completed in {}ms", duration / 1_000_000);
                    }
                    if let Some(count) = parsed.eval_count {
                        debug!("Tokens generated: {}", count);
                    }
                    break 'outer;
                }
            }
        }

        if full_response.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        info!("Generated {} characters", full_response.len());
        Ok(full_response)
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        match self.config.provider {
            Provider::Openai => self.complete_openai(model, messages, temperature).await,
            Provider::Ollama => self.complete_ollama(model, messages, temperature).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_request_serialization() {
        let messages = vec![ChatMessage::system("Be helpful"), ChatMessage::user("Hello")];
        let request = ChatRequest {
            model: "gpt-4",
            messages: &messages,
            stream: false,
            temperature: Some(0.3),
            options: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"gpt-4\""));
        assert!(json.contains("\"temperature\":0.3"));
        assert!(json.contains("\"role\":\"system\""));
        assert!(!json.contains("options"));
    }

    #[test]
    fn test_ollama_request_serialization() {
        let messages = vec![ChatMessage::user("Hello")];
        let request = ChatRequest {
            model: "qwen2.5",
            messages: &messages,
            stream: true,
            temperature: None,
            options: Some(OllamaOptions { temperature: 0.5 }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"stream\":true"));
        assert!(json.contains("\"options\":{\"temperature\":0.5}"));
    }

    #[test]
    fn test_ollama_chunk_done_without_message() {
        let chunk: OllamaChunk =
            serde_json::from_str(r#"{"done":true,"total_duration":1000000000}"#).unwrap();
        assert!(chunk.done);
        assert!(chunk.message.is_none());
    }

    #[test]
    fn test_normalize_string_content() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#,
        )
        .unwrap();
        let content = body.choices[0].message.content.as_ref().unwrap();
        assert_eq!(normalize_content(content), "Hi there");
    }

    #[test]
    fn test_normalize_parts_content() {
        let value = serde_json::json!([
            {"type": "text", "text": "Hello "},
            {"type": "text", "text": "world"},
            {"type": "image_url", "image_url": {"url": "x"}}
        ]);
        assert_eq!(normalize_content(&value), "Hello world");
        assert_eq!(normalize_content(&serde_json::Value::Null), "");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: "AIRECRUIT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(config, false).unwrap();
        let err = client
            .complete("gpt-4", &[ChatMessage::user("hi")], 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(_)));
    }
}
