use pulse_core::PulseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limited by model {0}")]
    RateLimited(String),

    #[error("Completion API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion had no content")]
    EmptyResponse,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LlmResult<T> = Result<T, LlmError>;

impl From<LlmError> for PulseError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::RateLimited(model) => PulseError::RateLimited(model),
            other => PulseError::Llm(other.to_string()),
        }
    }
}
