use actorrating::rating::{
    enrich_rating, summarize_performances, QualityTier, RatingRow, UNKNOWN_CHARACTER,
};
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

fn row(actor_id: i64, movie_id: i64, score: f64, role: Option<&str>, minutes: i64) -> RatingRow {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
    RatingRow {
        id: Uuid::new_v4(),
        user_id: format!("user-{minutes}"),
        actor_id,
        movie_id,
        emotional_range_depth: 80,
        character_believability: 80,
        technical_skill: 80,
        screen_presence: 80,
        chemistry_interaction: 80,
        weighted_score: score,
        share_score: score.round() as i32,
        character_name: None,
        role_name: role.map(str::to_string),
        comment: None,
        created_at: at,
        updated_at: at,
    }
}

#[test]
fn enrich_adds_tier_and_resolved_character() {
    let mut r = row(1, 10, 91.2, None, 0);
    r.character_name = Some("unknown".into());
    r.comment = Some("Character: Iron Man, Director: Jon Favreau".into());

    let view = enrich_rating(r.clone(), None);
    assert_eq!(view.character, "Iron Man");
    assert_eq!(view.quality_tier, QualityTier::Masterpiece);

    let view = enrich_rating(r, Some("Tony Stark"));
    assert_eq!(view.character, "Tony Stark");
}

#[test]
fn rating_view_serializes_camel_case_with_flattened_scores() {
    let view = enrich_rating(row(1, 10, 80.0, Some("Lead"), 0), Some("Lead"));
    let json = serde_json::to_value(&view).unwrap();

    assert_eq!(json["qualityTier"], "Excellent");
    assert_eq!(json["character"], "Lead");
    assert_eq!(json["emotionalRangeDepth"], 80);
    assert_eq!(json["shareScore"], 80);
}

#[test]
fn summaries_group_by_pair_and_sort_by_mean_score() {
    let rows = vec![
        row(1, 10, 60.0, Some("Lead"), 0),
        row(1, 10, 80.0, Some("Lead"), 1),
        row(1, 10, 70.0, Some("Supporting"), 2),
        row(1, 20, 95.0, None, 3),
        row(2, 10, 39.0, None, 4),
    ];

    let out = summarize_performances(&rows);
    assert_eq!(out.len(), 3);

    assert_eq!((out[0].actor_id, out[0].movie_id), (1, 20));
    assert_eq!(out[0].quality_tier, QualityTier::Masterpiece);
    assert_eq!(out[0].character, UNKNOWN_CHARACTER);
    assert_eq!(out[0].aggregated_role, None);

    assert_eq!((out[1].actor_id, out[1].movie_id), (1, 10));
    assert_eq!(out[1].rating_count, 3);
    assert!((out[1].mean_score - 70.0).abs() < 1e-9);
    assert_eq!(out[1].share_score, 70);
    assert_eq!(out[1].aggregated_role.as_deref(), Some("Lead"));
    assert_eq!(out[1].character, "Lead");

    assert_eq!((out[2].actor_id, out[2].movie_id), (2, 10));
    assert_eq!(out[2].quality_tier, QualityTier::NeedsWork);
}

#[test]
fn summary_prefers_latest_stored_label() {
    let mut older = row(1, 10, 80.0, Some("Lead"), 0);
    older.character_name = Some("Old Label".into());
    let mut newer = row(1, 10, 80.0, Some("Lead"), 5);
    newer.character_name = Some("Tony Stark".into());

    let out = summarize_performances(&[older, newer]);
    assert_eq!(out[0].character, "Tony Stark");
}

#[test]
fn equal_means_fall_back_to_pair_order() {
    let rows = vec![row(3, 1, 75.0, None, 0), row(1, 2, 75.0, None, 1), row(1, 1, 75.0, None, 2)];
    let pairs: Vec<(i64, i64)> = summarize_performances(&rows)
        .iter()
        .map(|s| (s.actor_id, s.movie_id))
        .collect();
    assert_eq!(pairs, vec![(1, 1), (1, 2), (3, 1)]);
}

#[test]
fn summary_share_score_is_the_rounded_mean_of_stored_share_scores() {
    let rows = vec![
        row(1, 10, 80.5, None, 0),
        row(1, 10, 80.5, None, 1),
        row(1, 10, 80.4, None, 2),
    ];

    let out = summarize_performances(&rows);
    assert_eq!(out.len(), 1);
    assert!((out[0].mean_score - 80.466_666).abs() < 1e-4);
    // Stored shares are 81, 81 and 80.
    assert_eq!(out[0].share_score, 81);
}
