// Renewal timing: grace-period policy and the self-chaining renewal task

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use super::endpoint::AuthEndpoint;
use super::manager::CredentialManager;
use crate::error::FatalError;

/// Lifetimes above this many seconds get the long grace period
pub const LONG_LIVED_THRESHOLD_SECS: i64 = 15;

/// Grace for tokens living longer than the threshold
pub const LONG_GRACE_SECS: i64 = 10;

/// Grace for short-lived tokens, so renewal does not hammer the endpoint
pub const SHORT_GRACE_SECS: i64 = 2;

/// Seconds before expiry at which a token with this lifetime is renewed
pub fn grace_period(expires_in: i64) -> i64 {
    if expires_in > LONG_LIVED_THRESHOLD_SECS {
        LONG_GRACE_SECS
    } else {
        SHORT_GRACE_SECS
    }
}

/// Seconds from acquisition until the next renewal.
///
/// Not clamped: lifetimes at or below the grace period give zero or negative delays.
pub fn renewal_delay_secs(expires_in: i64) -> i64 {
    expires_in.saturating_sub(grace_period(expires_in))
}

/// Timer duration for a renewal delay; negative delays fire immediately
pub fn timer_duration(delay_secs: i64) -> Duration {
    Duration::from_secs(delay_secs.max(0) as u64)
}

/// Stand-in for "never" when a reported lifetime overflows the clock
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// The single outstanding "renew at time T" unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalTask {
    /// Delay computed from the last response, before clamping to the timer
    pub delay_secs: i64,

    /// Monotonic instant the renewal fires at
    pub due: Instant,

    /// Wall-clock equivalent of `due`, for logs
    pub due_at: DateTime<Utc>,
}

impl RenewalTask {
    /// Task due `delay_secs` from now
    pub fn after(delay_secs: i64) -> Self {
        let wait = timer_duration(delay_secs);
        let due_at = chrono::Duration::from_std(wait)
            .ok()
            .and_then(|wait| Utc::now().checked_add_signed(wait))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let now = Instant::now();

        Self {
            delay_secs,
            due: now.checked_add(wait).unwrap_or(now + FAR_FUTURE),
            due_at,
        }
    }
}

/// Runs renewals one at a time on a dedicated task, forever
pub struct RenewalScheduler;

impl RenewalScheduler {
    /// Spawn the renewal chain; the first renewal fires after `first_delay_secs`.
    ///
    /// Each iteration sleeps, renews, and derives the next delay from the fresh
    /// response, so exactly one renewal is ever pending. The task only finishes
    /// when a renewal fails.
    pub fn spawn<A: AuthEndpoint>(
        manager: Arc<CredentialManager<A>>,
        first_delay_secs: i64,
    ) -> RenewalHandle {
        let task = tokio::spawn(async move {
            let mut delay_secs = first_delay_secs;
            loop {
                tokio::time::sleep(timer_duration(delay_secs)).await;
                match manager.renew().await {
                    Ok(next) => delay_secs = next,
                    Err(e) => {
                        tracing::error!("Token renewal failed, renewal chain stopped: {}", e);
                        return e;
                    }
                }
            }
        });

        RenewalHandle { task }
    }
}

/// Handle onto a running renewal chain
pub struct RenewalHandle {
    task: JoinHandle<FatalError>,
}

impl RenewalHandle {
    /// Wait for the chain to end. It only ends with the error that stopped it,
    /// or a `JoinError` if the task panicked or was aborted.
    pub async fn wait(self) -> Result<FatalError, JoinError> {
        self.task.await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the chain without waiting for the next renewal
    pub fn abort(&self) {
        self.task.abort();
    }
}
