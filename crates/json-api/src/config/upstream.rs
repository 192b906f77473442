//! Upstream Client Config

use std::time::Duration;

use clap::Args;

use cowork_app::resilience::{CircuitBreakerConfig, ResilienceConfig, RetryPolicy};

/// Retry and circuit breaker knobs shared by the HTTP collaborator clients.
#[derive(Debug, Args)]
pub struct UpstreamPolicyConfig {
    /// Retries after the first attempt of a transient failure
    #[arg(long, env = "UPSTREAM_MAX_RETRIES", default_value_t = 2_u32)]
    pub upstream_max_retries: u32,

    /// Delay before the first retry, doubled for each following one
    #[arg(long, env = "UPSTREAM_RETRY_INITIAL_DELAY_MS", default_value_t = 100_u64)]
    pub upstream_retry_initial_delay_ms: u64,

    /// Upper bound on the delay between retries
    #[arg(long, env = "UPSTREAM_RETRY_MAX_DELAY_MS", default_value_t = 2_000_u64)]
    pub upstream_retry_max_delay_ms: u64,

    /// Consecutive failures that open the circuit
    #[arg(long, env = "UPSTREAM_BREAKER_FAILURE_THRESHOLD", default_value_t = 5_u32)]
    pub upstream_breaker_failure_threshold: u32,

    /// How long an open circuit rejects calls before probing again
    #[arg(long, env = "UPSTREAM_BREAKER_OPEN_TIMEOUT_MS", default_value_t = 30_000_u64)]
    pub upstream_breaker_open_timeout_ms: u64,

    /// Successful trial calls needed to close a half-open circuit
    #[arg(long, env = "UPSTREAM_BREAKER_SUCCESS_THRESHOLD", default_value_t = 1_u32)]
    pub upstream_breaker_success_threshold: u32,
}

impl UpstreamPolicyConfig {
    /// Combine the shared policy with a client's request deadline.
    #[must_use]
    pub fn resilience(&self, timeout_ms: u64) -> ResilienceConfig {
        ResilienceConfig {
            timeout: Duration::from_millis(timeout_ms),
            retry: RetryPolicy {
                max_retries: self.upstream_max_retries,
                initial_delay: Duration::from_millis(self.upstream_retry_initial_delay_ms),
                max_delay: Duration::from_millis(self.upstream_retry_max_delay_ms),
            },
            breaker: CircuitBreakerConfig {
                failure_threshold: self.upstream_breaker_failure_threshold,
                open_timeout: Duration::from_millis(self.upstream_breaker_open_timeout_ms),
                success_threshold: self.upstream_breaker_success_threshold,
            },
        }
    }
}
