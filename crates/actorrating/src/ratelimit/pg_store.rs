use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::store::{AdmitOutcome, AdmitRequest, CounterStore};

/// Counter store on the `rate_limit_windows` table.
#[derive(Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn admit(&self, req: AdmitRequest<'_>) -> anyhow::Result<AdmitOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serializes every admission for this (client_id, action) across all
        // server instances until the transaction ends. The upsert alone cannot
        // do it: the quota is a sum over recent windows, read before writing.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1 || '|' || $2, 0))")
            .bind(req.client_id)
            .bind(req.action.as_str())
            .execute(&mut *tx)
            .await?;

        let (prior_count, oldest_window_start): (i64, Option<DateTime<Utc>>) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(count), 0)::BIGINT, MIN(window_start)
            FROM rate_limit_windows
            WHERE client_id = $1
              AND action = $2
              AND window_start >= $3
            "#,
        )
        .bind(req.client_id)
        .bind(req.action.as_str())
        .bind(req.since)
        .fetch_one(&mut *tx)
        .await?;

        if prior_count >= req.max_requests {
            tx.commit().await?;
            return Ok(AdmitOutcome::Rejected {
                prior_count,
                oldest_window_start,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO rate_limit_windows (client_id, action, window_start, count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (client_id, action, window_start)
            DO UPDATE SET count = rate_limit_windows.count + 1,
                          updated_at = now()
            "#,
        )
        .bind(req.client_id)
        .bind(req.action.as_str())
        .bind(req.window_start)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AdmitOutcome::Admitted { prior_count })
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM rate_limit_windows
            WHERE window_start < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }
}
