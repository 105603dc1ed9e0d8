use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::score::{PerformanceRating, PerformanceRatingInput};
use super::tier::QualityTier;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatingRow {
    pub id: Uuid,
    pub user_id: String,
    pub actor_id: i64,
    pub movie_id: i64,

    pub emotional_range_depth: i32,
    pub character_believability: i32,
    pub technical_skill: i32,
    pub screen_presence: i32,
    pub chemistry_interaction: i32,

    pub weighted_score: f64,
    pub share_score: i32,

    pub character_name: Option<String>,
    pub role_name: Option<String>,
    pub comment: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RatingRow {
    pub fn performance(&self) -> PerformanceRating {
        PerformanceRating::new(
            self.emotional_range_depth,
            self.character_believability,
            self.technical_skill,
            self.screen_presence,
            self.chemistry_interaction,
        )
    }
}

/// A rating as submitted by a user, already validated.
#[derive(Debug, Clone)]
pub struct NewRating {
    pub user_id: String,
    pub actor_id: i64,
    pub movie_id: i64,
    pub scores: PerformanceRating,
    pub character_name: Option<String>,
    pub role_name: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub user_id: String,
    pub actor_id: i64,
    pub movie_id: i64,
    #[serde(flatten)]
    pub scores: PerformanceRatingInput,
    pub character_name: Option<String>,
    pub role_name: Option<String>,
    pub comment: Option<String>,
}

/// Read-side shape of a rating: stored fields plus derived tier and the
/// resolved character label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: Uuid,
    pub user_id: String,
    pub actor_id: i64,
    pub movie_id: i64,
    #[serde(flatten)]
    pub scores: PerformanceRating,
    pub weighted_score: f64,
    pub share_score: i32,
    pub quality_tier: QualityTier,
    pub character: String,
    pub role_name: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (actor, movie) pair rolled up across every rating for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub actor_id: i64,
    pub movie_id: i64,
    pub rating_count: usize,
    pub mean_score: f64,
    pub share_score: i32,
    pub quality_tier: QualityTier,
    pub aggregated_role: Option<String>,
    pub character: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCard {
    pub rating_id: Uuid,
    pub actor_name: String,
    pub movie_title: String,
    pub character: String,
    pub score: f64,
    pub share_score: i32,
    pub quality_tier: QualityTier,
    pub headline: String,
}
