use sqlx::PgPool;
use uuid::Uuid;

use super::character::{aggregate_role_name, is_known_label};
use super::model::{NewRating, RatingRow};
use super::score::{compute_weighted_score, share_score};

const RATING_COLUMNS: &str = r#"
    id, user_id, actor_id, movie_id,
    emotional_range_depth, character_believability, technical_skill,
    screen_presence, chemistry_interaction,
    weighted_score, share_score,
    character_name, role_name, comment,
    created_at, updated_at
"#;

#[derive(Clone)]
pub struct RatingsRepo {
    pool: PgPool,
}

impl RatingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the rating, or replaces the user's previous rating of the same
    /// performance. Derived scores are always recomputed from the sub-scores.
    pub async fn upsert_rating(&self, rating: &NewRating) -> anyhow::Result<RatingRow> {
        let score = compute_weighted_score(&rating.scores);

        let row = sqlx::query_as::<_, RatingRow>(&format!(
            r#"
            INSERT INTO ratings (
                id, user_id, actor_id, movie_id,
                emotional_range_depth, character_believability, technical_skill,
                screen_presence, chemistry_interaction,
                weighted_score, share_score,
                character_name, role_name, comment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT ON CONSTRAINT ratings_user_actor_movie_key DO UPDATE
            SET emotional_range_depth = EXCLUDED.emotional_range_depth,
                character_believability = EXCLUDED.character_believability,
                technical_skill = EXCLUDED.technical_skill,
                screen_presence = EXCLUDED.screen_presence,
                chemistry_interaction = EXCLUDED.chemistry_interaction,
                weighted_score = EXCLUDED.weighted_score,
                share_score = EXCLUDED.share_score,
                character_name = EXCLUDED.character_name,
                role_name = EXCLUDED.role_name,
                comment = EXCLUDED.comment,
                updated_at = now()
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&rating.user_id)
        .bind(rating.actor_id)
        .bind(rating.movie_id)
        .bind(rating.scores.emotional_range_depth)
        .bind(rating.scores.character_believability)
        .bind(rating.scores.technical_skill)
        .bind(rating.scores.screen_presence)
        .bind(rating.scores.chemistry_interaction)
        .bind(score)
        .bind(share_score(score))
        .bind(&rating.character_name)
        .bind(&rating.role_name)
        .bind(&rating.comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_rating(&self, id: Uuid) -> anyhow::Result<Option<RatingRow>> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_for_pair(
        &self,
        actor_id: i64,
        movie_id: i64,
    ) -> anyhow::Result<Vec<RatingRow>> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            r#"
            SELECT {RATING_COLUMNS}
            FROM ratings
            WHERE actor_id = $1 AND movie_id = $2
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(actor_id)
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_for_actor(&self, actor_id: i64) -> anyhow::Result<Vec<RatingRow>> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE actor_id = $1 ORDER BY movie_id, created_at"
        ))
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_for_movie(&self, movie_id: i64) -> anyhow::Result<Vec<RatingRow>> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE movie_id = $1 ORDER BY actor_id, created_at"
        ))
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn role_names_for_pair(
        &self,
        actor_id: i64,
        movie_id: i64,
    ) -> anyhow::Result<Vec<Option<String>>> {
        let names: Vec<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT role_name
            FROM ratings
            WHERE actor_id = $1 AND movie_id = $2
            "#,
        )
        .bind(actor_id)
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    pub async fn aggregated_role_for_pair(
        &self,
        actor_id: i64,
        movie_id: i64,
    ) -> anyhow::Result<Option<String>> {
        let names = self.role_names_for_pair(actor_id, movie_id).await?;
        Ok(aggregate_role_name(names.iter().map(|n| n.as_deref())))
    }

    /// Recomputes `weighted_score` / `share_score` for rows whose stored values
    /// drifted from the current weights. Returns rows updated.
    pub async fn backfill_scores(&self) -> anyhow::Result<u64> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for row in rows {
            let score = compute_weighted_score(&row.performance());
            let share = share_score(score);
            if (row.weighted_score - score).abs() < 1e-9 && row.share_score == share {
                continue;
            }

            updated += sqlx::query(
                r#"
                UPDATE ratings
                SET weighted_score = $2, share_score = $3, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(row.id)
            .bind(score)
            .bind(share)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Writes the aggregated role name into `character_name` wherever the
    /// stored label is empty or the "unknown" sentinel. Returns rows updated.
    pub async fn backfill_characters(&self) -> anyhow::Result<u64> {
        let pairs: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT DISTINCT actor_id, movie_id
            FROM ratings
            WHERE character_name IS NULL
               OR btrim(character_name) = ''
               OR lower(btrim(character_name)) = 'unknown'
            ORDER BY actor_id, movie_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut updated = 0;
        for (actor_id, movie_id) in pairs {
            let Some(role) = self.aggregated_role_for_pair(actor_id, movie_id).await? else {
                continue;
            };
            if !is_known_label(&role) {
                continue;
            }

            updated += sqlx::query(
                r#"
                UPDATE ratings
                SET character_name = $3, updated_at = now()
                WHERE actor_id = $1
                  AND movie_id = $2
                  AND (character_name IS NULL
                       OR btrim(character_name) = ''
                       OR lower(btrim(character_name)) = 'unknown')
                "#,
            )
            .bind(actor_id)
            .bind(movie_id)
            .bind(&role)
            .execute(&self.pool)
            .await?
            .rows_affected();
        }

        Ok(updated)
    }
}
