/// LLM Client: every completion call in Resume Radar goes through here.
///
/// Used by the match scorer and by resume section extraction. Both ask the
/// model for a JSON object and read the first well-formed object out of the
/// reply, so chatty preambles and code fences are tolerated.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("reply did not match the expected shape: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reply contained no JSON object")]
    NoJson,

    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    /// `timeout` bounds each HTTP attempt; `None` leaves reqwest's default.
    pub fn new(api_key: String, timeout: Option<Duration>) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            api_key,
        })
    }

    /// Sends one prompt and returns the text of the first text block.
    /// 429 and 5xx responses are retried with exponential backoff.
    pub async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM attempt {attempt} failed, retrying after {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: text,
                });
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                    .map(|e| e.error.message)
                    .unwrap_or(text);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let reply: MessagesResponse = response.json().await?;
            debug!(
                input_tokens = reply.usage.input_tokens,
                output_tokens = reply.usage.output_tokens,
                "LLM call succeeded"
            );

            return reply
                .content
                .into_iter()
                .find(|b| b.block_type == "text")
                .and_then(|b| b.text)
                .filter(|t| !t.trim().is_empty())
                .ok_or(LlmError::EmptyContent);
        }

        Err(last_error.unwrap_or(LlmError::Exhausted {
            attempts: MAX_ATTEMPTS,
        }))
    }

    /// Completes `prompt` and decodes the first JSON object in the reply as `T`.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.complete(prompt, system).await?;
        parse_json_reply(&text)
    }
}

/// Decodes the first JSON object embedded in a model reply.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let object = extract_json_object(text).ok_or(LlmError::NoJson)?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Finds the first well-formed JSON object in `text`, ignoring any
/// surrounding prose or code fences.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .find_map(|(start, _)| {
            let mut values =
                serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
            match values.next() {
                Some(Ok(Value::Object(map))) => Some(map),
                _ => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        let map = extract_json_object(r#"{"score": 7, "reasoning": "ok"}"#).unwrap();
        assert_eq!(map["score"], 7);
    }

    #[test]
    fn test_extract_object_surrounded_by_prose() {
        let reply = "Sure! Here is my assessment:\n\
                     {\"score\": 8.5, \"reasoning\": \"Strong fit\"}\n\
                     Let me know if you need more.";
        let map = extract_json_object(reply).unwrap();
        assert_eq!(map["score"], 8.5);
        assert_eq!(map["reasoning"], "Strong fit");
    }

    #[test]
    fn test_extract_object_inside_code_fence() {
        let reply = "```json\n{\"score\": 3, \"reasoning\": \"weak\"}\n```";
        assert_eq!(extract_json_object(reply).unwrap()["score"], 3);
    }

    #[test]
    fn test_extract_skips_malformed_braces() {
        let reply = "Scores use {braces} sometimes. {\"score\": 5, \"reasoning\": \"mid\"}";
        assert_eq!(extract_json_object(reply).unwrap()["score"], 5);
    }

    #[test]
    fn test_extract_returns_first_of_several_objects() {
        let reply = r#"{"score": 1, "reasoning": "a"} {"score": 9, "reasoning": "b"}"#;
        assert_eq!(extract_json_object(reply).unwrap()["score"], 1);
    }

    #[test]
    fn test_extract_none_without_object() {
        assert!(extract_json_object("I cannot score this resume.").is_none());
        assert!(extract_json_object("[1, 2, 3]").is_none());
    }

    #[derive(Debug, Deserialize)]
    struct Verdict {
        score: f64,
    }

    #[test]
    fn test_parse_json_reply_reports_missing_json() {
        let err = parse_json_reply::<Verdict>("no braces here").unwrap_err();
        assert!(matches!(err, LlmError::NoJson));
    }

    #[test]
    fn test_parse_json_reply_reports_shape_mismatch() {
        let err = parse_json_reply::<Verdict>(r#"{"rating": 4}"#).unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[test]
    fn test_parse_json_reply_decodes() {
        let verdict: Verdict = parse_json_reply("result: {\"score\": 6.5}").unwrap();
        assert_eq!(verdict.score, 6.5);
    }
}
