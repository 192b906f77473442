//! Circuit breaker for collaborator calls.
//!
//! Closed: calls pass through and consecutive failures are counted.
//! Open: calls are rejected until `open_timeout` has elapsed since the last failure.
//! `HalfOpen`: calls are let through as trials; `success_threshold` successes close
//! the circuit again, a single failure re-opens it.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Returned when a call is rejected without being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("circuit breaker is open")]
pub struct CircuitOpen;

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Check whether a call may proceed, moving Open to `HalfOpen` once the
    /// open timeout has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitOpen`] while the circuit is open.
    pub fn try_acquire(&self) -> Result<(), CircuitOpen> {
        let mut state = self.lock();

        if state.state != CircuitState::Open {
            return Ok(());
        }

        let expired = state
            .opened_at
            .is_none_or(|opened_at| opened_at.elapsed() >= self.config.open_timeout);

        if !expired {
            return Err(CircuitOpen);
        }

        info!(breaker = self.name, "circuit breaker half-open");

        state.state = CircuitState::HalfOpen;
        state.successes = 0;

        Ok(())
    }

    pub fn record_success(&self) {
        let mut state = self.lock();

        match state.state {
            CircuitState::Closed => state.failures = 0,
            CircuitState::HalfOpen => {
                state.successes += 1;

                if state.successes >= self.config.success_threshold {
                    info!(breaker = self.name, "circuit breaker closed");

                    state.state = CircuitState::Closed;
                    state.failures = 0;
                    state.successes = 0;
                    state.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();

        match state.state {
            CircuitState::Closed => {
                state.failures += 1;

                if state.failures >= self.config.failure_threshold {
                    warn!(
                        breaker = self.name,
                        failures = state.failures,
                        "circuit breaker opened"
                    );

                    state.state = CircuitState::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!(breaker = self.name, "circuit breaker re-opened after failed trial call");

                state.state = CircuitState::Open;
                state.successes = 0;
                state.opened_at = Some(Instant::now());
            }
            CircuitState::Open => state.opened_at = Some(Instant::now()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
