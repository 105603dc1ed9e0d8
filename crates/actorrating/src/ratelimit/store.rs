use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::policy::ActionKind;

/// One admission attempt against the counter store.
#[derive(Debug, Clone)]
pub struct AdmitRequest<'a> {
    pub client_id: &'a str,
    pub action: ActionKind,
    /// Aligned start of the window `now` falls into.
    pub window_start: DateTime<Utc>,
    /// Rows with `window_start >= since` count toward the quota.
    pub since: DateTime<Utc>,
    pub max_requests: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// The current window's counter was incremented.
    Admitted { prior_count: i64 },
    /// Quota already used up; nothing was written.
    Rejected {
        prior_count: i64,
        oldest_window_start: Option<DateTime<Utc>>,
    },
}

/// Durable fixed-window counters keyed by (client_id, action, window_start).
///
/// `admit` must be atomic per (client_id, action): the read of recent counts,
/// the quota decision and the increment happen as one step, so concurrent
/// callers can never be admitted past `max_requests`.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn admit(&self, req: AdmitRequest<'_>) -> anyhow::Result<AdmitOutcome>;

    /// Deletes rows whose window started before `cutoff`. Returns rows deleted.
    async fn sweep(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64>;
}

/// Process-local store for tests and single-instance development. The whole
/// map sits behind one mutex.
#[derive(Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<(String, ActionKind, DateTime<Utc>), i64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count_for(
        &self,
        client_id: &str,
        action: ActionKind,
        window_start: DateTime<Utc>,
    ) -> Option<i64> {
        self.windows
            .lock()
            .await
            .get(&(client_id.to_string(), action, window_start))
            .copied()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn admit(&self, req: AdmitRequest<'_>) -> anyhow::Result<AdmitOutcome> {
        let mut windows = self.windows.lock().await;

        let mut prior_count = 0;
        let mut oldest: Option<DateTime<Utc>> = None;
        for ((client_id, action, window_start), count) in windows.iter() {
            if client_id == req.client_id && *action == req.action && *window_start >= req.since
            {
                prior_count += *count;
                oldest = Some(oldest.map_or(*window_start, |o| o.min(*window_start)));
            }
        }

        if prior_count >= req.max_requests {
            return Ok(AdmitOutcome::Rejected {
                prior_count,
                oldest_window_start: oldest,
            });
        }

        *windows
            .entry((req.client_id.to_string(), req.action, req.window_start))
            .or_insert(0) += 1;

        Ok(AdmitOutcome::Admitted { prior_count })
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|(_, _, window_start), _| *window_start >= cutoff);
        Ok((before - windows.len()) as u64)
    }
}
