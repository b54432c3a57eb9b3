pub mod client;
pub mod error;
pub mod key_points;
pub mod prompts;

pub use client::{daily_recap, summarize_stock, weekly_recap, LlmClient, Summarize};
pub use error::{LlmError, LlmResult};
pub use key_points::{extract_key_points, SUMMARY_MAX_AGE_HOURS};
pub use prompts::*;
