//! # Circuit Breaker Metrics
//!
//! Point-in-time snapshot of a breaker's counters, for health endpoints and logs.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};

/// Metrics for a single circuit breaker instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Total number of outcomes recorded
    pub total_calls: u64,

    /// Number of successful calls
    pub success_count: u64,

    /// Number of failed calls
    pub failure_count: u64,

    /// Current consecutive failure count
    pub consecutive_failures: u64,

    /// How many times the circuit has opened
    pub times_opened: u64,

    /// Current circuit breaker state
    pub current_state: CircuitState,

    /// Calculated failure rate (0.0 to 1.0)
    pub failure_rate: f64,
}

impl CircuitBreakerMetrics {
    /// Human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Bypassing cache",
        }
    }

    /// One-line summary used in transition logs and the validator's health check
    pub fn format_summary(&self) -> String {
        format!(
            "State: {} | Calls: {} | Failures: {} ({:.1}%) | Consecutive: {} | Opened: {}x",
            self.state_description(),
            self.total_calls,
            self.failure_count,
            self.failure_rate * 100.0,
            self.consecutive_failures,
            self.times_opened
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(current_state: CircuitState) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            total_calls: 10,
            success_count: 7,
            failure_count: 3,
            consecutive_failures: 3,
            times_opened: 1,
            current_state,
            failure_rate: 0.3,
        }
    }

    #[test]
    fn test_state_description() {
        assert_eq!(
            snapshot(CircuitState::Closed).state_description(),
            "Healthy - Normal operation"
        );
        assert_eq!(
            snapshot(CircuitState::Open).state_description(),
            "Failing - Bypassing cache"
        );
    }

    #[test]
    fn test_format_summary_mentions_state() {
        let summary = snapshot(CircuitState::Open).format_summary();
        assert_eq!(
            summary,
            "State: Failing - Bypassing cache | Calls: 10 | Failures: 3 (30.0%) | Consecutive: 3 | Opened: 1x"
        );
    }
}
