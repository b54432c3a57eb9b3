use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::US::Eastern;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};
use crate::prompts::{
    daily_recap_prompt, stock_summary_prompt, weekly_recap_prompt, StockSummaryInput, NO_HEADLINES,
    RECAP_SYSTEM_PROMPT, STOCK_SYSTEM_PROMPT,
};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const FALLBACK_MODEL: &str = "gpt-3.5-turbo";

/// Anything that turns a system + user prompt into text.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> LlmResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice(resp: ChatResponse) -> LlmResult<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(LlmError::EmptyResponse)
}

/// OpenAI chat-completions client that drops to a cheaper model when the
/// primary one is rate limited.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    fallback_model: Option<String>,
    temperature: f32,
}

impl LlmClient {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fallback_model: Some(FALLBACK_MODEL.to_string()),
            temperature: 0.1,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, model: &str, system: &str, prompt: &str) -> LlmResult<String> {
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited(model.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        first_choice(resp.json().await?)
    }
}

#[async_trait]
impl Summarize for LlmClient {
    async fn complete(&self, system: &str, prompt: &str) -> LlmResult<String> {
        match self.chat(&self.model, system, prompt).await {
            Err(LlmError::RateLimited(model)) => match &self.fallback_model {
                Some(fallback) => {
                    tracing::warn!("{} quota exceeded, switching to {}", model, fallback);
                    self.chat(fallback, system, prompt).await
                }
                None => Err(LlmError::RateLimited(model)),
            },
            other => other,
        }
    }
}

pub async fn summarize_stock<L: Summarize + ?Sized>(llm: &L, input: &StockSummaryInput) -> LlmResult<String> {
    let prompt = stock_summary_prompt(input);
    tracing::debug!("Summary prompt for {} ({} chars)", input.symbol, prompt.len());
    llm.complete(STOCK_SYSTEM_PROMPT, &prompt).await
}

/// Daily recap as of now in US/Eastern. Empty headlines short-circuit
/// without calling the model.
pub async fn daily_recap<L: Summarize + ?Sized>(
    llm: &L,
    headlines: &str,
    indices: &str,
    sectors: &str,
) -> LlmResult<String> {
    if headlines.trim().is_empty() {
        return Ok(NO_HEADLINES.to_string());
    }
    let now = Utc::now().with_timezone(&Eastern);
    let prompt = daily_recap_prompt(headlines, indices, sectors, &now);
    llm.complete(RECAP_SYSTEM_PROMPT, &prompt).await
}

pub async fn weekly_recap<L: Summarize + ?Sized>(
    llm: &L,
    past_key_points: &[String],
    weekend_headlines: &str,
) -> LlmResult<String> {
    if weekend_headlines.trim().is_empty() {
        return Ok(NO_HEADLINES.to_string());
    }
    let now = Utc::now().with_timezone(&Eastern);
    let prompt = weekly_recap_prompt(past_key_points, weekend_headlines, &now);
    llm.complete(RECAP_SYSTEM_PROMPT, &prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records prompts and answers with a canned reply.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Summarize for Recorder {
        async fn complete(&self, system: &str, prompt: &str) -> LlmResult<String> {
            self.calls.lock().unwrap().push((system.to_string(), prompt.to_string()));
            Ok("summary".to_string())
        }
    }

    #[test]
    fn test_first_choice() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  Stocks rose.\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(resp).unwrap(), "Stocks rose.");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_choice(empty), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: DEFAULT_MODEL,
            messages: vec![
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
            temperature: 0.1,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4-turbo");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn test_empty_headlines_skip_model() {
        let llm = Recorder::default();
        let out = daily_recap(&llm, "  ", "", "").await.unwrap();
        assert_eq!(out, NO_HEADLINES);
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompts_reach_model() {
        let llm = Recorder::default();
        daily_recap(&llm, "Headline: Fed", "- SPY", "- XLK").await.unwrap();
        let input = StockSummaryInput {
            symbol: "AAPL".into(),
            ..Default::default()
        };
        summarize_stock(&llm, &input).await.unwrap();

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls[0].0, RECAP_SYSTEM_PROMPT);
        assert!(calls[0].1.contains("Updates:\nHeadline: Fed"));
        assert_eq!(calls[1].0, STOCK_SYSTEM_PROMPT);
        assert!(calls[1].1.contains("summarizing AAPL's market behavior"));
    }
}
