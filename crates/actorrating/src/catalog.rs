use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_year: Option<i32>,
}

#[derive(Clone)]
pub struct CatalogRepo {
    pool: PgPool,
}

impl CatalogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert_actor(&self, id: i64, name: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO actors (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, updated_at = now()
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn upsert_movie(
        &self,
        id: i64,
        title: &str,
        release_year: Option<i32>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO movies (id, title, release_year)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                release_year = EXCLUDED.release_year,
                updated_at = now()
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(release_year)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_actor(&self, id: i64) -> anyhow::Result<Option<Actor>> {
        let actor = sqlx::query_as::<_, Actor>("SELECT id, name FROM actors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(actor)
    }

    pub async fn get_movie(&self, id: i64) -> anyhow::Result<Option<Movie>> {
        let movie =
            sqlx::query_as::<_, Movie>("SELECT id, title, release_year FROM movies WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(movie)
    }

    /// Case-insensitive substring search; an empty query lists by name.
    pub async fn search_actors(&self, q: &str, limit: i64) -> anyhow::Result<Vec<Actor>> {
        let rows = sqlx::query_as::<_, Actor>(
            r#"
            SELECT id, name
            FROM actors
            WHERE name ILIKE '%' || $1 || '%'
            ORDER BY name, id
            LIMIT $2
            "#,
        )
        .bind(escape_like(q.trim()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn search_movies(&self, q: &str, limit: i64) -> anyhow::Result<Vec<Movie>> {
        let rows = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, release_year
            FROM movies
            WHERE title ILIKE '%' || $1 || '%'
            ORDER BY title, id
            LIMIT $2
            "#,
        )
        .bind(escape_like(q.trim()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn escape_like(q: &str) -> String {
    q.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
