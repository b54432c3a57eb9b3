use pulse_core::PulseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("News API returned status {0}")]
    Status(u16),

    #[error("No 'data' key in news API response")]
    MissingData,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type NewsResult<T> = Result<T, NewsError>;

impl From<NewsError> for PulseError {
    fn from(e: NewsError) -> Self {
        match e {
            NewsError::Status(429) => PulseError::RateLimited("stock news API".to_string()),
            other => PulseError::Api(other.to_string()),
        }
    }
}
