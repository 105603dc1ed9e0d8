use std::sync::Arc;
use std::time::Duration;

use actorrating::catalog::CatalogRepo;
use actorrating::config::retention_from_hours;
use actorrating::ratelimit::{PgCounterStore, RateLimitPolicies, RateLimiter};
use actorrating::rating::{score, NewRating, PerformanceRating, PerformanceRatingInput, RatingsRepo};
use actorrating::{db, telemetry};
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgPool;
use tracing::info;

#[derive(Parser)]
#[command(name = "ratingctl", about = "ActorRating maintenance commands")]
struct Cli {
    /// Falls back to TEST_DATABASE_URL when DATABASE_URL is unset.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the embedded migrations.
    Migrate,
    /// Truncate every table.
    Reset,
    /// Insert a small catalog and random ratings.
    Seed {
        #[arg(long, default_value_t = 25)]
        ratings: usize,
    },
    /// Print the weighted score, share score and tier for five sub-scores.
    Score {
        emotional_range_depth: i32,
        character_believability: i32,
        technical_skill: i32,
        screen_presence: i32,
        chemistry_interaction: i32,
    },
    /// Recompute stored weighted/share scores that disagree with the formula.
    BackfillScores,
    /// Fill missing or "Unknown" character labels from the aggregated role.
    BackfillCharacters,
    /// Delete rate-limit counters older than the retention horizon.
    Sweep {
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

const SEED_ACTORS: [(i64, &str); 4] = [
    (3223, "Robert Downey Jr."),
    (1245, "Scarlett Johansson"),
    (6193, "Leonardo DiCaprio"),
    (1892, "Matt Damon"),
];

const SEED_MOVIES: [(i64, &str, i32); 3] = [
    (1726, "Iron Man", 2008),
    (27205, "Inception", 2010),
    (286217, "The Martian", 2015),
];

const SEED_ROLES: [&str; 4] = ["Lead", "Supporting", "Cameo", "Antagonist"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("info")?;

    let Cli {
        database_url,
        command,
    } = Cli::parse();

    match command {
        Command::Score {
            emotional_range_depth,
            character_believability,
            technical_skill,
            screen_presence,
            chemistry_interaction,
        } => {
            let input = PerformanceRatingInput {
                emotional_range_depth: Some(emotional_range_depth),
                character_believability: Some(character_believability),
                technical_skill: Some(technical_skill),
                screen_presence: Some(screen_presence),
                chemistry_interaction: Some(chemistry_interaction),
            };
            let scored = score(&input.validate()?);
            println!(
                "score={:.2} share_score={} tier={}",
                scored.score, scored.share_score, scored.quality_tier
            );
        }
        Command::Migrate => {
            let pool = connect(database_url).await?;
            db::run_migrations(&pool).await?;
            info!("migrations applied");
        }
        Command::Reset => reset(&connect(database_url).await?).await?,
        Command::Seed { ratings } => seed(&connect(database_url).await?, ratings).await?,
        Command::BackfillScores => {
            let pool = connect(database_url).await?;
            let n = RatingsRepo::new(pool).backfill_scores().await?;
            info!(updated = n, "score backfill done");
        }
        Command::BackfillCharacters => {
            let pool = connect(database_url).await?;
            let n = RatingsRepo::new(pool).backfill_characters().await?;
            info!(updated = n, "character backfill done");
        }
        Command::Sweep { hours } => {
            let retention = retention_from_hours(hours)?;
            let pool = connect(database_url).await?;
            let limiter = RateLimiter::new(
                Arc::new(PgCounterStore::new(pool)),
                RateLimitPolicies::reference(),
                Duration::from_secs(30),
            );
            let n = limiter.sweep(retention).await?;
            info!(deleted = n, hours, "rate-limit sweep done");
        }
    }

    Ok(())
}

async fn connect(database_url: Option<String>) -> anyhow::Result<PgPool> {
    let url = database_url
        .or_else(|| std::env::var("TEST_DATABASE_URL").ok())
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL or TEST_DATABASE_URL must be set"))?;
    db::make_pool(&url).await
}

async fn reset(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            rate_limit_windows,
            ratings,
            movies,
            actors
        RESTART IDENTITY CASCADE
        "#,
    )
    .execute(pool)
    .await?;

    info!("reset OK");
    Ok(())
}

async fn seed(pool: &PgPool, n: usize) -> anyhow::Result<()> {
    let catalog = CatalogRepo::new(pool.clone());
    let ratings = RatingsRepo::new(pool.clone());

    for (id, name) in SEED_ACTORS {
        catalog.upsert_actor(id, name).await?;
    }
    for (id, title, year) in SEED_MOVIES {
        catalog.upsert_movie(id, title, Some(year)).await?;
    }

    // ThreadRng is !Send, so build every rating before the first await.
    let batch: Vec<NewRating> = {
        let mut rng = rand::thread_rng();
        (0..n)
            .map(|i| {
                let (actor_id, _) = *SEED_ACTORS.choose(&mut rng).unwrap_or(&SEED_ACTORS[0]);
                let (movie_id, _, _) = *SEED_MOVIES.choose(&mut rng).unwrap_or(&SEED_MOVIES[0]);
                NewRating {
                    user_id: format!("seed-user-{i}"),
                    actor_id,
                    movie_id,
                    scores: PerformanceRating::new(
                        rng.gen_range(40..=100),
                        rng.gen_range(40..=100),
                        rng.gen_range(40..=100),
                        rng.gen_range(40..=100),
                        rng.gen_range(40..=100),
                    ),
                    character_name: None,
                    role_name: SEED_ROLES.choose(&mut rng).map(|r| r.to_string()),
                    comment: None,
                }
            })
            .collect()
    };

    for rating in &batch {
        let row = ratings.upsert_rating(rating).await?;
        println!(
            "+ rating id={} actor={} movie={} score={:.2}",
            row.id, row.actor_id, row.movie_id, row.weighted_score
        );
    }

    Ok(())
}
