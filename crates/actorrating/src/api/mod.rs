use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::catalog::{Actor, CatalogRepo, Movie};
use crate::ratelimit::{ActionKind, CounterStore, RateLimitDecision, RateLimiter};
use crate::rating::character::is_known_label;
use crate::rating::model::SubmitRatingRequest;
use crate::rating::{
    aggregate_role_name, enrich_rating, score, summarize_performances, FieldError, NewRating,
    PerformanceRatingInput, PerformanceSummary, RatingView, RatingsRepo, ShareCard,
    ValidationError, WeightedScore,
};

pub mod client;
pub mod error;

pub use client::client_id;
pub use error::ApiError;

#[derive(Clone)]
pub struct ApiState {
    pub ratings: RatingsRepo,
    pub catalog: CatalogRepo,
    pub limiter: RateLimiter<dyn CounterStore>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Scoring
        .route("/score", post(preview_score))
        // Ratings
        .route("/ratings", get(list_ratings).post(submit_rating))
        .route("/ratings/:id", get(get_rating))
        .route("/ratings/:id/share", get(share_rating))
        // Catalog
        .route("/actors", get(search_actors))
        .route("/actors/:id/performances", get(actor_performances))
        .route("/movies", get(search_movies))
        .route("/movies/:id/cast", get(movie_cast))
        // Rate limiting for the auth front end
        .route("/rate-limit/:action", post(check_rate_limit))
        .with_state(state)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn preview_score(
    Json(body): Json<PerformanceRatingInput>,
) -> Result<Json<WeightedScore>, ApiError> {
    let scores = body.validate()?;
    Ok(Json(score(&scores)))
}

async fn enforce(
    state: &ApiState,
    headers: &HeaderMap,
    action: ActionKind,
) -> Result<RateLimitDecision, ApiError> {
    let decision = state
        .limiter
        .check_rate_limit(&client_id(headers), action)
        .await?;
    if !decision.allowed {
        return Err(ApiError::rate_limited(&decision));
    }
    Ok(decision)
}

// A failed role lookup degrades to "no aggregated role".
async fn aggregated_role(state: &ApiState, actor_id: i64, movie_id: i64) -> Option<String> {
    match state
        .ratings
        .aggregated_role_for_pair(actor_id, movie_id)
        .await
    {
        Ok(role) => role,
        Err(e) => {
            warn!(actor_id, movie_id, error = %e, "role aggregation failed");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn submit_rating(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<RatingView>), ApiError> {
    enforce(&state, &headers, ActionKind::Rating).await?;

    let SubmitRatingRequest {
        user_id,
        actor_id,
        movie_id,
        scores,
        character_name,
        role_name,
        comment,
    } = body;

    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("userId is required".into()));
    }
    let scores = scores.validate()?;

    let mut unknown = Vec::new();
    if state.catalog.get_actor(actor_id).await?.is_none() {
        unknown.push(FieldError::unknown_reference("actorId", actor_id));
    }
    if state.catalog.get_movie(movie_id).await?.is_none() {
        unknown.push(FieldError::unknown_reference("movieId", movie_id));
    }
    if !unknown.is_empty() {
        return Err(ValidationError { fields: unknown }.into());
    }

    let row = state
        .ratings
        .upsert_rating(&NewRating {
            user_id: user_id.trim().to_string(),
            actor_id,
            movie_id,
            scores,
            character_name: non_empty(character_name),
            role_name: non_empty(role_name),
            comment: non_empty(comment),
        })
        .await?;

    let aggregated = aggregated_role(&state, row.actor_id, row.movie_id).await;
    Ok((
        StatusCode::CREATED,
        Json(enrich_rating(row, aggregated.as_deref())),
    ))
}

pub async fn get_rating(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RatingView>, ApiError> {
    let row = state
        .ratings
        .get_rating(id)
        .await?
        .ok_or(ApiError::NotFound("rating"))?;

    let aggregated = aggregated_role(&state, row.actor_id, row.movie_id).await;
    Ok(Json(enrich_rating(row, aggregated.as_deref())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRatingsQuery {
    pub actor_id: i64,
    pub movie_id: i64,
}

pub async fn list_ratings(
    State(state): State<ApiState>,
    Query(q): Query<ListRatingsQuery>,
) -> Result<Json<Vec<RatingView>>, ApiError> {
    let rows = state.ratings.list_for_pair(q.actor_id, q.movie_id).await?;
    let aggregated = aggregate_role_name(rows.iter().map(|r| r.role_name.as_deref()));

    Ok(Json(
        rows.into_iter()
            .map(|row| enrich_rating(row, aggregated.as_deref()))
            .collect(),
    ))
}

pub async fn share_rating(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareCard>, ApiError> {
    let row = state
        .ratings
        .get_rating(id)
        .await?
        .ok_or(ApiError::NotFound("rating"))?;
    let actor = state
        .catalog
        .get_actor(row.actor_id)
        .await?
        .ok_or(ApiError::NotFound("actor"))?;
    let movie = state
        .catalog
        .get_movie(row.movie_id)
        .await?
        .ok_or(ApiError::NotFound("movie"))?;

    let aggregated = aggregated_role(&state, row.actor_id, row.movie_id).await;
    let view = enrich_rating(row, aggregated.as_deref());

    Ok(Json(share_card(&view, &actor, &movie)))
}

pub fn share_card(view: &RatingView, actor: &Actor, movie: &Movie) -> ShareCard {
    let headline = if is_known_label(&view.character) {
        format!(
            "{} as {} in {}: {}/100 ({})",
            actor.name, view.character, movie.title, view.share_score, view.quality_tier
        )
    } else {
        format!(
            "{} in {}: {}/100 ({})",
            actor.name, movie.title, view.share_score, view.quality_tier
        )
    };

    ShareCard {
        rating_id: view.id,
        actor_name: actor.name.clone(),
        movie_title: movie.title.clone(),
        character: view.character.clone(),
        score: view.weighted_score,
        share_score: view.share_score,
        quality_tier: view.quality_tier,
        headline,
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

pub async fn search_actors(
    State(state): State<ApiState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<Actor>>, ApiError> {
    let limit = q.limit.unwrap_or(20).clamp(1, 100);
    let actors = state
        .catalog
        .search_actors(q.q.as_deref().unwrap_or(""), limit)
        .await?;
    Ok(Json(actors))
}

pub async fn search_movies(
    State(state): State<ApiState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let limit = q.limit.unwrap_or(20).clamp(1, 100);
    let movies = state
        .catalog
        .search_movies(q.q.as_deref().unwrap_or(""), limit)
        .await?;
    Ok(Json(movies))
}

pub async fn actor_performances(
    State(state): State<ApiState>,
    Path(actor_id): Path<i64>,
) -> Result<Json<Vec<PerformanceSummary>>, ApiError> {
    let rows = state.ratings.list_for_actor(actor_id).await?;
    Ok(Json(summarize_performances(&rows)))
}

pub async fn movie_cast(
    State(state): State<ApiState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<Vec<PerformanceSummary>>, ApiError> {
    let rows = state.ratings.list_for_movie(movie_id).await?;
    Ok(Json(summarize_performances(&rows)))
}

pub async fn check_rate_limit(
    State(state): State<ApiState>,
    Path(action): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RateLimitDecision>, ApiError> {
    let action: ActionKind = action.parse()?;
    let decision = enforce(&state, &headers, action).await?;
    Ok(Json(decision))
}
