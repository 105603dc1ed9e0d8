use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::policy::{ActionKind, ActionPolicy, FailurePolicy, RateLimitPolicies};
use super::store::{AdmitOutcome, AdmitRequest, CounterStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: i64,
    pub reset_time: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("no rate-limit policy configured for action {0}")]
    UnconfiguredAction(ActionKind),
    #[error("rate-limit store unavailable for action {action}: {source}")]
    StoreUnavailable {
        action: ActionKind,
        #[source]
        source: anyhow::Error,
    },
    #[error("rate-limit store timed out after {timeout_ms}ms for action {action}")]
    StoreTimeout { action: ActionKind, timeout_ms: u64 },
    #[error("invalid rate-limit policy for action {action}: {max_requests}/{window_ms}ms")]
    InvalidPolicy {
        action: ActionKind,
        max_requests: i64,
        window_ms: i64,
    },
}

/// Start of the aligned window containing `now`: `floor(now / window) * window`.
/// A non-positive window leaves `now` unaligned.
pub fn window_start(now: DateTime<Utc>, window_ms: i64) -> DateTime<Utc> {
    if window_ms <= 0 {
        return now;
    }
    let start_ms = now.timestamp_millis().div_euclid(window_ms) * window_ms;
    DateTime::<Utc>::from_timestamp_millis(start_ms).unwrap_or(now)
}

/// Fixed-window limiter over an injected [`CounterStore`].
pub struct RateLimiter<S: ?Sized> {
    store: Arc<S>,
    policies: RateLimitPolicies,
    store_timeout: Duration,
}

impl<S: ?Sized> Clone for RateLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policies: self.policies.clone(),
            store_timeout: self.store_timeout,
        }
    }
}

impl<S> RateLimiter<S>
where
    S: CounterStore + ?Sized,
{
    pub fn new(store: Arc<S>, policies: RateLimitPolicies, store_timeout: Duration) -> Self {
        Self {
            store,
            policies,
            store_timeout,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn policy(&self, action: ActionKind) -> Option<&ActionPolicy> {
        self.policies.get(action)
    }

    pub async fn check_rate_limit(
        &self,
        client_id: &str,
        action: ActionKind,
    ) -> Result<RateLimitDecision, RateLimitError> {
        self.check_rate_limit_at(client_id, action, Utc::now()).await
    }

    pub async fn check_rate_limit_at(
        &self,
        client_id: &str,
        action: ActionKind,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let policy = *self
            .policies
            .get(action)
            .ok_or(RateLimitError::UnconfiguredAction(action))?;

        let invalid = || RateLimitError::InvalidPolicy {
            action,
            max_requests: policy.max_requests,
            window_ms: policy.window_ms,
        };
        let window = policy.window().ok_or_else(invalid)?;
        let since = now.checked_sub_signed(window).ok_or_else(invalid)?;
        let reset_time = now.checked_add_signed(window).ok_or_else(invalid)?;
        let current_window = window_start(now, policy.window_ms);

        let req = AdmitRequest {
            client_id,
            action,
            window_start: current_window,
            since,
            max_requests: policy.max_requests,
        };

        let outcome = match tokio::time::timeout(self.store_timeout, self.store.admit(req)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(source)) => {
                return self.on_store_failure(
                    &policy,
                    reset_time,
                    RateLimitError::StoreUnavailable { action, source },
                )
            }
            Err(_) => {
                return self.on_store_failure(
                    &policy,
                    reset_time,
                    RateLimitError::StoreTimeout {
                        action,
                        timeout_ms: self.store_timeout.as_millis() as u64,
                    },
                )
            }
        };

        match outcome {
            AdmitOutcome::Admitted { prior_count } => Ok(RateLimitDecision {
                allowed: true,
                remaining: (policy.max_requests - prior_count - 1).max(0),
                reset_time,
            }),
            AdmitOutcome::Rejected {
                prior_count,
                oldest_window_start,
            } => {
                debug!(
                    client_id,
                    action = action.as_str(),
                    count = prior_count,
                    max = policy.max_requests,
                    "rate limit exceeded"
                );
                Ok(RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_time: oldest_window_start
                        .unwrap_or(current_window)
                        .checked_add_signed(window)
                        .unwrap_or(reset_time),
                })
            }
        }
    }

    /// Removes counters whose window started more than `retention` ago.
    pub async fn sweep(&self, retention: TimeDelta) -> anyhow::Result<u64> {
        self.sweep_at(Utc::now(), retention).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>, retention: TimeDelta) -> anyhow::Result<u64> {
        anyhow::ensure!(
            retention > TimeDelta::zero(),
            "sweep retention must be positive, got {retention}"
        );
        let cutoff = now
            .checked_sub_signed(retention)
            .ok_or_else(|| anyhow::anyhow!("sweep retention {retention} is out of range"))?;
        self.store.sweep(cutoff).await
    }

    fn on_store_failure(
        &self,
        policy: &ActionPolicy,
        reset_time: DateTime<Utc>,
        err: RateLimitError,
    ) -> Result<RateLimitDecision, RateLimitError> {
        match policy.on_store_failure {
            FailurePolicy::Open => {
                warn!(error = %err, "rate-limit store failure, failing open");
                Ok(RateLimitDecision {
                    allowed: true,
                    remaining: policy.max_requests,
                    reset_time,
                })
            }
            FailurePolicy::Closed => {
                warn!(error = %err, "rate-limit store failure, failing closed");
                Err(err)
            }
        }
    }
}
