use std::collections::BTreeMap;

use super::character::{aggregate_role_name, resolve_character_display};
use super::model::{PerformanceSummary, RatingRow, RatingView};
use super::score::share_score;
use super::tier::QualityTier;

pub fn enrich_rating(row: RatingRow, aggregated_role: Option<&str>) -> RatingView {
    let character = resolve_character_display(
        row.character_name.as_deref(),
        aggregated_role,
        row.comment.as_deref(),
    );

    RatingView {
        id: row.id,
        scores: row.performance(),
        quality_tier: QualityTier::classify(row.weighted_score),
        weighted_score: row.weighted_score,
        share_score: row.share_score,
        character,
        user_id: row.user_id,
        actor_id: row.actor_id,
        movie_id: row.movie_id,
        role_name: row.role_name,
        comment: row.comment,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Rolls ratings up per (actor, movie) pair. `share_score` is the rounded
/// mean of the per-rating share scores. Ordered by mean score descending,
/// then by (actor_id, movie_id).
pub fn summarize_performances(rows: &[RatingRow]) -> Vec<PerformanceSummary> {
    let mut groups: BTreeMap<(i64, i64), Vec<&RatingRow>> = BTreeMap::new();
    for row in rows {
        groups.entry((row.actor_id, row.movie_id)).or_default().push(row);
    }

    let mut out: Vec<PerformanceSummary> = groups
        .into_iter()
        .map(|((actor_id, movie_id), group)| {
            let rating_count = group.len();
            let mean_score =
                group.iter().map(|r| r.weighted_score).sum::<f64>() / rating_count as f64;
            let mean_share = group.iter().map(|r| f64::from(r.share_score)).sum::<f64>()
                / rating_count as f64;

            let aggregated_role = aggregate_role_name(group.iter().map(|r| r.role_name.as_deref()));

            let latest = group
                .iter()
                .max_by_key(|r| (r.updated_at, r.id))
                .copied();

            let character = resolve_character_display(
                latest.and_then(|r| r.character_name.as_deref()),
                aggregated_role.as_deref(),
                latest.and_then(|r| r.comment.as_deref()),
            );

            PerformanceSummary {
                actor_id,
                movie_id,
                rating_count,
                mean_score,
                share_score: share_score(mean_share),
                quality_tier: QualityTier::classify(mean_score),
                aggregated_role,
                character,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        b.mean_score
            .total_cmp(&a.mean_score)
            .then_with(|| (a.actor_id, a.movie_id).cmp(&(b.actor_id, b.movie_id)))
    });

    out
}
