//! Bounded background re-login.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default delay between login retries.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Default number of consecutive failed retries tolerated.
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 100;

/// Something that can report readiness and log in again.
#[async_trait]
pub trait Reauthenticate: Send + Sync {
    /// Whether a session is currently held.
    async fn is_ready(&self) -> bool;

    /// Log in again. Returns whether a session is now held.
    async fn reauthenticate(&self) -> bool;
}

/// Retry cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between ticks
    pub interval: Duration,
    /// Consecutive failures tolerated before giving up
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
        }
    }
}

/// Lifecycle of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Not started
    Disabled,
    /// Last tick found the bridge not ready
    Retrying,
    /// Last tick found (or made) the bridge ready
    Ready,
    /// Budget spent; no further logins
    Exhausted,
}

/// Re-login loop driven by a fixed interval.
#[derive(Debug)]
pub struct LoginRetrySupervisor<R> {
    target: Arc<R>,
    policy: RetryPolicy,
    attempts: u32,
    state: SupervisorState,
}

impl<R: Reauthenticate> LoginRetrySupervisor<R> {
    /// Create a disabled supervisor.
    #[must_use]
    pub fn new(target: Arc<R>, policy: RetryPolicy) -> Self {
        Self {
            target,
            policy,
            attempts: 0,
            state: SupervisorState::Disabled,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Consecutive failed attempts so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run until the retry budget is spent.
    ///
    /// The first tick fires one interval after the call.
    pub async fn run(mut self) -> SupervisorState {
        let mut ticker = interval_at(Instant::now() + self.policy.interval, self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.tick().await == SupervisorState::Exhausted {
                return SupervisorState::Exhausted;
            }
        }
    }

    /// Handle one tick.
    pub async fn tick(&mut self) -> SupervisorState {
        if self.state == SupervisorState::Exhausted {
            return self.state;
        }

        if self.target.is_ready().await {
            self.state = SupervisorState::Ready;
            return self.state;
        }

        tracing::info!(attempt = self.attempts + 1, "Retrying login");

        if self.target.reauthenticate().await {
            self.attempts = 0;
            self.state = SupervisorState::Ready;
            return self.state;
        }

        self.attempts += 1;
        if self.attempts > self.policy.max_attempts {
            tracing::error!(
                attempts = self.attempts,
                "Reached max login attempts, login retry disabled"
            );
            self.state = SupervisorState::Exhausted;
        } else {
            self.state = SupervisorState::Retrying;
        }
        self.state
    }
}
