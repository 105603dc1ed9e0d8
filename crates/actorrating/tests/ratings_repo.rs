mod common;

use actorrating::catalog::CatalogRepo;
use actorrating::rating::{NewRating, PerformanceRating, RatingsRepo};
use common::{seed_pair, setup_db};
use serial_test::serial;

fn new_rating(user: &str, scores: PerformanceRating, role: Option<&str>) -> NewRating {
    NewRating {
        user_id: user.to_string(),
        actor_id: 3223,
        movie_id: 1726,
        scores,
        character_name: None,
        role_name: role.map(str::to_string),
        comment: None,
    }
}

#[tokio::test]
#[serial]
async fn upsert_computes_scores_and_replaces_the_users_previous_rating() {
    let Some(pool) = setup_db().await else { return };
    seed_pair(&pool, 3223, "Robert Downey Jr.", 1726, "Iron Man").await;
    let repo = RatingsRepo::new(pool.clone());

    let first = repo
        .upsert_rating(&new_rating("u1", PerformanceRating::new(80, 85, 78, 90, 82), None))
        .await
        .unwrap();
    assert!((first.weighted_score - 82.65).abs() < 1e-9);
    assert_eq!(first.share_score, 83);

    let second = repo
        .upsert_rating(&new_rating("u1", PerformanceRating::new(100, 100, 100, 100, 100), None))
        .await
        .unwrap();
    assert_eq!(second.id, first.id, "same user + performance updates in place");
    assert!((second.weighted_score - 100.0).abs() < 1e-9);
    assert_eq!(second.share_score, 100);

    let rows = repo.list_for_pair(3223, 1726).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
#[serial]
async fn aggregated_role_uses_every_rating_for_the_pair() {
    let Some(pool) = setup_db().await else { return };
    seed_pair(&pool, 3223, "Robert Downey Jr.", 1726, "Iron Man").await;
    let repo = RatingsRepo::new(pool.clone());
    let scores = PerformanceRating::new(70, 70, 70, 70, 70);

    for (user, role) in [("u1", Some("Lead")), ("u2", Some("Lead")), ("u3", Some("Supporting")), ("u4", None)] {
        repo.upsert_rating(&new_rating(user, scores, role)).await.unwrap();
    }

    let role = repo.aggregated_role_for_pair(3223, 1726).await.unwrap();
    assert_eq!(role.as_deref(), Some("Lead"));

    assert_eq!(repo.aggregated_role_for_pair(3223, 9999).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn backfill_scores_repairs_drifted_rows_only() {
    let Some(pool) = setup_db().await else { return };
    seed_pair(&pool, 3223, "Robert Downey Jr.", 1726, "Iron Man").await;
    let repo = RatingsRepo::new(pool.clone());

    let good = repo
        .upsert_rating(&new_rating("u1", PerformanceRating::new(80, 85, 78, 90, 82), None))
        .await
        .unwrap();
    let drifted = repo
        .upsert_rating(&new_rating("u2", PerformanceRating::new(50, 50, 50, 50, 50), None))
        .await
        .unwrap();

    sqlx::query("UPDATE ratings SET weighted_score = 12.0, share_score = 12 WHERE id = $1")
        .bind(drifted.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(repo.backfill_scores().await.unwrap(), 1);

    let fixed = repo.get_rating(drifted.id).await.unwrap().unwrap();
    assert!((fixed.weighted_score - 50.0).abs() < 1e-9);
    assert_eq!(fixed.share_score, 50);

    let untouched = repo.get_rating(good.id).await.unwrap().unwrap();
    assert_eq!(untouched.updated_at, good.updated_at);

    assert_eq!(repo.backfill_scores().await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn backfill_characters_fills_unknown_labels_from_aggregated_role() {
    let Some(pool) = setup_db().await else { return };
    seed_pair(&pool, 3223, "Robert Downey Jr.", 1726, "Iron Man").await;
    let repo = RatingsRepo::new(pool.clone());
    let scores = PerformanceRating::new(70, 70, 70, 70, 70);

    let mut unknown = new_rating("u1", scores, Some("Tony Stark"));
    unknown.character_name = Some("Unknown".into());
    let unknown = repo.upsert_rating(&unknown).await.unwrap();

    let mut labelled = new_rating("u2", scores, Some("Tony Stark"));
    labelled.character_name = Some("Iron Man".into());
    let labelled = repo.upsert_rating(&labelled).await.unwrap();

    let blank = repo
        .upsert_rating(&new_rating("u3", scores, None))
        .await
        .unwrap();

    assert_eq!(repo.backfill_characters().await.unwrap(), 2);

    let get = |id: uuid::Uuid| {
        let repo = repo.clone();
        async move { repo.get_rating(id).await.unwrap().unwrap().character_name }
    };
    assert_eq!(get(unknown.id).await.as_deref(), Some("Tony Stark"));
    assert_eq!(get(blank.id).await.as_deref(), Some("Tony Stark"));
    assert_eq!(get(labelled.id).await.as_deref(), Some("Iron Man"));
}

#[tokio::test]
#[serial]
async fn catalog_search_is_case_insensitive_substring() {
    let Some(pool) = setup_db().await else { return };
    let catalog = CatalogRepo::new(pool.clone());
    catalog.upsert_actor(1, "Scarlett Johansson").await.unwrap();
    catalog.upsert_actor(2, "Scarlett O'Hara").await.unwrap();
    catalog.upsert_actor(3, "Matt Damon").await.unwrap();
    catalog.upsert_movie(10, "100% Wolf", Some(2020)).await.unwrap();
    catalog.upsert_movie(11, "1000 Words", Some(2012)).await.unwrap();

    let found = catalog.search_actors("scarl", 10).await.unwrap();
    let names: Vec<_> = found.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Scarlett Johansson", "Scarlett O'Hara"]);

    let limited = catalog.search_actors("", 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    let movies = catalog.search_movies("100%", 10).await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "100% Wolf");
}
