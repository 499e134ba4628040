use super::types::*;
use regex::Regex;
use std::time::Duration;

pub fn retry_condition_should_apply(condition: &RetryCondition, status: u16, content: &str) -> bool {
    match condition {
        RetryCondition::StatusCode(code) => *code == status,
        RetryCondition::Content(content_condition) => {
            check_content_condition(content_condition, content)
        }
        RetryCondition::Transport => false,
    }
}

fn check_content_condition(condition: &ContentRetryCondition, content: &str) -> bool {
    if condition.is_regex {
        Regex::new(&condition.pattern)
            .map(|re| re.is_match(content))
            .unwrap_or(false)
    } else {
        content
            .to_lowercase()
            .contains(&condition.pattern.to_lowercase())
    }
}

pub fn calculate_delay(config: &CategoryConfig, attempt: usize) -> Duration {
    if attempt == 0 {
        return config.initial_delay.min(config.max_delay);
    }

    let multiplier = match config.backoff_policy {
        BackoffPolicy::Constant => 1.0,
        BackoffPolicy::Linear => attempt as f64,
        BackoffPolicy::Exponential { factor } => {
            f64::from(factor).powi(i32::try_from(attempt).unwrap_or(i32::MAX))
        }
    };

    // Out-of-range products (overflow, inf, NaN) fall back to the cap.
    Duration::try_from_secs_f64(config.initial_delay.as_secs_f64() * multiplier)
        .unwrap_or(config.max_delay)
        .min(config.max_delay)
}
