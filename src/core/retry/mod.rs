mod r#impl;
mod types;
mod utils;

pub use r#impl::{DEFAULT_RETRY_STATUS_CODES, DEFAULT_RETRY_TIMES};
pub use types::{
    BackoffPolicy, CategoryConfig, ContentRetryCondition, RetryCategory, RetryCondition,
    RetryConfig, RetryState,
};
