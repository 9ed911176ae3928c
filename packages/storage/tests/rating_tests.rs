// ABOUTME: Integration tests for rating storage
// ABOUTME: Covers the one-rating-per-user upsert and aggregate summaries

use compass_core::{RadarStatus, RatingInput, SolutionCreateInput};
use compass_storage::{DbState, StorageError};

fn solution(name: &str) -> SolutionCreateInput {
    SolutionCreateInput {
        name: name.to_string(),
        description: format!("{} description", name),
        category: None,
        radar_status: RadarStatus::Adopt,
        stage: None,
        recommend_status: None,
        department: "Platform".to_string(),
        team: "Runtime".to_string(),
        team_email: None,
        maintainer_id: None,
        maintainer_name: None,
        maintainer_email: None,
        official_website: None,
        documentation_url: None,
        demo_url: None,
        version: None,
        tags: vec![],
        pros: vec![],
        cons: vec![],
    }
}

fn rating(score: i64) -> RatingInput {
    RatingInput {
        score,
        comment: None,
    }
}

#[tokio::test]
async fn test_upsert_replaces_and_keeps_created_at() {
    let db = DbState::connect_memory().await.unwrap();
    db.solution_storage.create(solution("Redis"), "alice").await.unwrap();

    let first = db.rating_storage.upsert("redis", "bob", rating(3)).await.unwrap();
    assert_eq!(first.score, 3);

    let second = db
        .rating_storage
        .upsert(
            "redis",
            "bob",
            RatingInput {
                score: 5,
                comment: Some("Improved a lot".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(second.score, 5);
    assert_eq!(second.comment.as_deref(), Some("Improved a lot"));
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);

    // Still a single row for this user
    let all = db.rating_storage.list_for_solution("redis").await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_rating_requires_existing_solution() {
    let db = DbState::connect_memory().await.unwrap();

    let err = db
        .rating_storage
        .upsert("ghost", "bob", rating(4))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_rating_score_must_be_in_range() {
    let db = DbState::connect_memory().await.unwrap();
    db.solution_storage.create(solution("Redis"), "alice").await.unwrap();

    for bad in [0, 6, -1] {
        let err = db
            .rating_storage
            .upsert("redis", "bob", rating(bad))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }
    assert!(db.rating_storage.get("redis", "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_summary_average_and_distribution() {
    let db = DbState::connect_memory().await.unwrap();
    db.solution_storage.create(solution("Redis"), "alice").await.unwrap();

    db.rating_storage.upsert("redis", "bob", rating(5)).await.unwrap();
    db.rating_storage.upsert("redis", "carol", rating(4)).await.unwrap();
    db.rating_storage.upsert("redis", "dave", rating(4)).await.unwrap();

    let summary = db.rating_storage.summary("redis").await.unwrap();
    assert_eq!(summary.count, 3);
    assert_eq!(summary.average, 4.33);
    assert_eq!(summary.distribution["4"], 2);
    assert_eq!(summary.distribution["5"], 1);
    assert_eq!(summary.distribution["1"], 0);
    assert_eq!(summary.distribution.len(), 5);
}

#[tokio::test]
async fn test_summary_empty_solution() {
    let db = DbState::connect_memory().await.unwrap();
    db.solution_storage.create(solution("Redis"), "alice").await.unwrap();

    let summary = db.rating_storage.summary("redis").await.unwrap();
    assert_eq!(summary.count, 0);
    assert_eq!(summary.average, 0.0);
    assert_eq!(summary.distribution.len(), 5);
    assert!(summary.distribution.values().all(|&v| v == 0));
}

#[tokio::test]
async fn test_list_sorted_by_score() {
    let db = DbState::connect_memory().await.unwrap();
    db.solution_storage.create(solution("Redis"), "alice").await.unwrap();
    db.solution_storage.create(solution("Kafka"), "alice").await.unwrap();

    db.rating_storage.upsert("redis", "bob", rating(2)).await.unwrap();
    db.rating_storage.upsert("kafka", "bob", rating(5)).await.unwrap();
    db.rating_storage.upsert("redis", "carol", rating(3)).await.unwrap();

    let (ratings, total) = db.rating_storage.list(0, 10, "-score").await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(ratings[0].score, 5);
    assert_eq!(ratings[2].score, 2);
}

#[tokio::test]
async fn test_delete_rating() {
    let db = DbState::connect_memory().await.unwrap();
    db.solution_storage.create(solution("Redis"), "alice").await.unwrap();
    db.rating_storage.upsert("redis", "bob", rating(4)).await.unwrap();

    assert!(db.rating_storage.delete("redis", "bob").await.unwrap());
    assert!(db.rating_storage.get("redis", "bob").await.unwrap().is_none());
    assert!(!db.rating_storage.delete("redis", "bob").await.unwrap());
}
