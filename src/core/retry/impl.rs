use super::types::*;
use super::utils::*;
use std::collections::HashMap;
use std::time::Duration;

/// Status codes the crawl retries out of the box.
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 7] = [500, 502, 503, 504, 522, 524, 408];
pub const DEFAULT_RETRY_TIMES: usize = 2;

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_policy: BackoffPolicy::Exponential { factor: 2.0 },
            conditions: Vec::new(),
        }
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            total_retries: 0,
        }
    }
}

impl RetryConfig {
    /// Server errors, 429 and transport failures, each retried up to `max_retries` times.
    pub fn http_defaults(max_retries: usize) -> Self {
        let mut config = Self::default();
        if max_retries == 0 {
            return config;
        }

        let base = CategoryConfig {
            max_retries,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_policy: BackoffPolicy::Exponential { factor: 2.0 },
            conditions: Vec::new(),
        };

        config.categories.insert(
            RetryCategory::ServerError,
            CategoryConfig {
                conditions: DEFAULT_RETRY_STATUS_CODES
                    .iter()
                    .map(|code| RetryCondition::StatusCode(*code))
                    .collect(),
                ..base.clone()
            },
        );
        config.categories.insert(
            RetryCategory::RateLimit,
            CategoryConfig {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
                conditions: vec![RetryCondition::StatusCode(429)],
                ..base.clone()
            },
        );
        config.categories.insert(
            RetryCategory::Network,
            CategoryConfig {
                conditions: vec![RetryCondition::Transport],
                ..base
            },
        );
        config
    }

    /// Picks the first category whose budget in `state` is not spent and whose
    /// conditions match the response, charging one retry to it.
    pub fn should_retry_request(
        &self,
        state: &mut RetryState,
        status: u16,
        content: &str,
    ) -> Option<(RetryCategory, Duration)> {
        self.next_retry(state, |condition| {
            retry_condition_should_apply(condition, status, content)
        })
    }

    pub fn should_retry_transport(&self, state: &mut RetryState) -> Option<(RetryCategory, Duration)> {
        self.next_retry(state, |condition| {
            matches!(condition, RetryCondition::Transport)
        })
    }

    fn next_retry<F>(&self, state: &mut RetryState, applies: F) -> Option<(RetryCategory, Duration)>
    where
        F: Fn(&RetryCondition) -> bool,
    {
        for (category, config) in &self.categories {
            let current_retries = state.counts.get(category).copied().unwrap_or(0);
            if current_retries >= config.max_retries {
                continue;
            }

            if config.conditions.iter().any(&applies) {
                state.counts.insert(category.clone(), current_retries + 1);
                state.total_retries += 1;
                let delay = calculate_delay(config, current_retries);
                return Some((category.clone(), delay));
            }
        }
        None
    }
}

impl CategoryConfig {
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        calculate_delay(self, attempt)
    }
}
