use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::cell::{TokenCell, TokenReader};
use super::endpoint::{AuthEndpoint, HttpAuthEndpoint};
use super::schedule::{self, RenewalHandle, RenewalScheduler, RenewalTask};
use crate::error::FatalError;

/// Credential manager
/// Keeps a valid token published, renewing it ahead of expiry on its own task
pub struct CredentialManager<A: AuthEndpoint = HttpAuthEndpoint> {
    /// Where tokens come from
    endpoint: A,

    /// Current token; written only by `renew`
    cell: TokenCell,

    /// Renewal currently pending, if the chain is running
    next_renewal: RwLock<Option<RenewalTask>>,

    /// Completed acquisitions
    renewals: AtomicU64,

    /// Set once the renewal chain has been spawned
    started: AtomicBool,
}

impl<A: AuthEndpoint> CredentialManager<A> {
    /// Create a manager with an empty token cell
    pub fn new(endpoint: A) -> Self {
        Self {
            endpoint,
            cell: TokenCell::new(),
            next_renewal: RwLock::new(None),
            renewals: AtomicU64::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// Read handle for consumers of the token
    pub fn token_reader(&self) -> TokenReader {
        self.cell.reader()
    }

    pub fn endpoint(&self) -> &A {
        &self.endpoint
    }

    /// Acquire a fresh token, publish it, and work out when to renew next.
    ///
    /// Returns the unclamped delay in seconds until the next renewal. On error
    /// nothing is published and the previous token (if any) stays in place.
    pub async fn renew(&self) -> Result<i64, FatalError> {
        let token = self.endpoint.acquire().await?;
        let delay_secs = schedule::renewal_delay_secs(token.expires_in);

        tracing::debug!(
            token = ?token,
            grace_secs = schedule::grace_period(token.expires_in),
            "Token acquired"
        );
        self.cell.set(token);

        let task = RenewalTask::after(delay_secs);
        {
            let mut next_renewal = self.next_renewal.write().await;
            *next_renewal = Some(task);
        }
        self.renewals.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            "Successfully refreshed token, refreshing again in {} seconds (at {})",
            delay_secs,
            task.due_at.to_rfc3339()
        );
        if delay_secs <= 0 {
            tracing::warn!(
                delay_secs,
                "Token lifetime is within the grace period, renewing immediately"
            );
        }

        Ok(delay_secs)
    }

    /// Acquire the first token, then hand renewal over to the scheduler.
    ///
    /// The first acquisition completes before this returns, so readers handed
    /// out afterwards always see a token. Must be called at most once.
    pub async fn start(self: &Arc<Self>) -> Result<RenewalHandle, FatalError> {
        assert!(
            !self.started.swap(true, Ordering::SeqCst),
            "credential renewal chain already started"
        );

        let first_delay = self.renew().await?;
        Ok(RenewalScheduler::spawn(self.clone(), first_delay))
    }

    /// Renewal currently pending
    pub async fn next_renewal(&self) -> Option<RenewalTask> {
        *self.next_renewal.read().await
    }

    /// Number of successful acquisitions so far
    pub fn renewals(&self) -> u64 {
        self.renewals.load(Ordering::SeqCst)
    }
}
