//! # Circuit Breaker Implementation
//!
//! Fixed-threshold, fixed-timeout breaker guarding the cache backend. Two states:
//! Closed (normal operation) and Open (backend bypassed). There is no half-open
//! probe: the circuit closes unconditionally once the recovery window elapses.
//!
//! All state is atomic. The Closed→Open edge is a compare-and-swap, so it fires
//! once per threshold crossing however many callers fail concurrently, and
//! failures while Open never reschedule recovery. The scheduled close is applied
//! lazily by whichever caller first observes the breaker after the deadline.

use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Sentinel for "no close scheduled"
const NOT_SCHEDULED: u64 = 0;

/// Lock-free atomic counters for circuit breaker metrics.
#[derive(Debug)]
struct AtomicCircuitBreakerMetrics {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    times_opened: AtomicU64,
}

impl AtomicCircuitBreakerMetrics {
    fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            times_opened: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_success(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_failure(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, state: CircuitState, consecutive_failures: u64) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);

        let failure_rate = if total_calls > 0 {
            failure_count as f64 / total_calls as f64
        } else {
            0.0
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count,
            consecutive_failures,
            times_opened: self.times_opened.load(Ordering::Relaxed),
            current_state: state,
            failure_rate,
        }
    }
}

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - store calls are allowed through
    Closed = 0,
    /// Failure mode - store calls are skipped until the recovery window elapses
    Open = 1,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

/// Core circuit breaker implementation with atomic state management
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Current circuit state (atomic for thread safety)
    state: AtomicU8,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    /// Consecutive failures since the last reset
    consecutive_failures: AtomicU64,

    /// Lock-free atomic metrics
    metrics: AtomicCircuitBreakerMetrics,

    /// Reference point for `close_at_nanos`
    epoch: Instant,

    /// Nanos since `epoch` at which an open circuit closes (0 = not scheduled)
    close_at_nanos: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            recovery_timeout_ms = config.recovery_timeout.as_millis() as u64,
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            consecutive_failures: AtomicU64::new(0),
            metrics: AtomicCircuitBreakerMetrics::new(),
            epoch: Instant::now(),
            close_at_nanos: AtomicU64::new(NOT_SCHEDULED),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        self.apply_scheduled_close();
        self.raw_state()
    }

    /// True iff the circuit is Closed
    pub fn is_available(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// Consecutive failures counted so far
    pub fn failure_count(&self) -> u64 {
        self.apply_scheduled_close();
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Record a failed backend operation
    ///
    /// Opens the circuit when the consecutive count reaches the threshold while
    /// Closed, scheduling the close after the recovery window.
    pub fn record_failure(&self) {
        self.apply_scheduled_close();
        self.metrics.record_failure();

        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(
            component = %self.name,
            consecutive_failures = failures,
            "Operation failed"
        );

        if failures >= u64::from(self.config.failure_threshold) {
            self.transition_to_open(failures);
        }
    }

    /// Record a successful backend operation
    ///
    /// Resets the failure count while Closed; ignored while Open.
    pub fn record_success(&self) {
        self.apply_scheduled_close();
        self.metrics.record_success();

        if self.raw_state() == CircuitState::Closed {
            self.consecutive_failures.store(0, Ordering::Release);
        }
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        let failures = self.consecutive_failures.load(Ordering::Acquire);
        self.transition_to_open(failures);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        self.consecutive_failures.store(0, Ordering::Release);
        self.close_at_nanos.store(NOT_SCHEDULED, Ordering::Release);
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let state = self.state();
        self.metrics
            .snapshot(state, self.consecutive_failures.load(Ordering::Acquire))
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the breaker configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn raw_state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    fn elapsed_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Closed→Open, at most once per crossing
    fn transition_to_open(&self, consecutive_failures: u64) {
        if self
            .state
            .compare_exchange(
                CircuitState::Closed as u8,
                CircuitState::Open as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        let recovery_nanos = self.config.recovery_timeout.as_nanos() as u64;
        let close_at = self
            .elapsed_nanos()
            .saturating_add(recovery_nanos)
            .max(1);
        self.close_at_nanos.store(close_at, Ordering::Release);
        self.metrics.times_opened.fetch_add(1, Ordering::Relaxed);

        error!(
            component = %self.name,
            consecutive_failures = consecutive_failures,
            failure_threshold = self.config.failure_threshold,
            recovery_timeout_ms = self.config.recovery_timeout.as_millis() as u64,
            summary = %self
                .metrics
                .snapshot(CircuitState::Open, consecutive_failures)
                .format_summary(),
            "Circuit breaker opened (bypassing backend)"
        );
    }

    /// Open→Closed once the recovery deadline has passed
    fn apply_scheduled_close(&self) {
        if self.raw_state() != CircuitState::Open {
            return;
        }

        let close_at = self.close_at_nanos.load(Ordering::Acquire);
        if close_at == NOT_SCHEDULED || self.elapsed_nanos() < close_at {
            return;
        }

        // Claiming the deadline makes the close single-flight
        if self
            .close_at_nanos
            .compare_exchange(close_at, NOT_SCHEDULED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.consecutive_failures.store(0, Ordering::Release);
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);

        info!(
            component = %self.name,
            summary = %self.metrics.snapshot(CircuitState::Closed, 0).format_summary(),
            "Circuit breaker closed (recovery window elapsed)"
        );
    }
}
