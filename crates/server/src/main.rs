use actorrating::api;
use actorrating::catalog::CatalogRepo;
use actorrating::config;
use actorrating::db;
use actorrating::ratelimit::{CounterStore, PgCounterStore, RateLimitPolicies, RateLimiter};
use actorrating::rating::RatingsRepo;
use actorrating::telemetry;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::Config::from_env()?;
    telemetry::init(&cfg.log_filter)?;

    let api_addr = cfg.api_addr.clone();
    let retention = cfg.rate_limit_retention()?;
    let sweep_interval = Duration::from_secs(cfg.rate_limit_sweep_secs.max(1));

    info!(
        api = %api_addr.clone().unwrap_or_else(|| "disabled".to_string()),
        migrate_on_startup = cfg.migrate_on_startup,
        rate_limit_timeout_ms = cfg.rate_limit_timeout_ms,
        rate_limit_retention_hours = cfg.rate_limit_retention_hours,
        rate_limit_sweep_secs = cfg.rate_limit_sweep_secs,
        rate_limit_overrides = cfg.rate_limit_overrides.len(),
        "actorrating starting"
    );

    let pool = db::make_pool(&cfg.database_url).await?;
    if cfg.migrate_on_startup {
        db::run_migrations(&pool).await?;
    }

    let store: Arc<dyn CounterStore> = Arc::new(PgCounterStore::new(pool.clone()));
    let limiter = RateLimiter::new(
        store,
        RateLimitPolicies::reference().with_overrides(&cfg.rate_limit_overrides),
        Duration::from_millis(cfg.rate_limit_timeout_ms),
    );

    // ---- API task ----
    let api_state = api::ApiState {
        ratings: RatingsRepo::new(pool.clone()),
        catalog: CatalogRepo::new(pool.clone()),
        limiter: limiter.clone(),
    };
    let app = api::router(api_state);

    let api_handle = tokio::spawn(async move {
        if let Some(addr) = api_addr {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("api listening on http://{addr}");
            axum::serve(listener, app).await?;
        } else {
            std::future::pending::<()>().await;
        }
        Ok::<(), anyhow::Error>(())
    });

    // ---- Rate-limit sweep task ----
    let sweep_handle = tokio::spawn(async move {
        loop {
            match limiter.sweep(retention).await {
                Ok(n) if n > 0 => info!(deleted = n, "[sweep] removed expired rate-limit windows"),
                Ok(_) => {}
                Err(e) => error!(error = %e, "[sweep] rate-limit sweep failed"),
            }

            tokio::time::sleep(sweep_interval).await;
        }
        #[allow(unreachable_code)]
        Ok::<(), anyhow::Error>(())
    });

    tokio::select! {
        res = api_handle => res??,
        res = sweep_handle => res??,
    }

    Ok(())
}
