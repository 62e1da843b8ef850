use chrono::NaiveDate;
use study_core::model::{AchievementId, AppState, NewGrade, ShopItemId};
use study_core::time::fixed_now;
use storage::repository::StateRepository;
use storage::snapshot::StateSnapshot;
use storage::sqlite::SqliteRepository;
use storage::Storage;

fn sample_state() -> AppState {
    let mut state = AppState::new();
    state.records.add_grade(
        NewGrade {
            subject: "数学".to_string(),
            score: 92.0,
            full_score: 100.0,
            exam_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            exam_type: "期末".to_string(),
            notes: Some("压轴题没做完".to_string()),
        },
        fixed_now(),
    );
    state.user.add_experience(20);
    state.user.add_points(160);
    state.achievements.insert(AchievementId::FirstGrade);
    state
        .shop
        .purchase(ShopItemId::ThemeDark, &mut state.user)
        .unwrap();
    state
}

#[tokio::test]
async fn sqlite_roundtrip_persists_state_document() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_state_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load_snapshot().await.expect("load empty").is_none());

    let state = sample_state();
    repo.save_snapshot(&StateSnapshot::from_state(&state))
        .await
        .expect("save");

    let loaded = repo
        .load_snapshot()
        .await
        .expect("load")
        .expect("snapshot present")
        .into_state();
    assert_eq!(loaded, state);
    assert_eq!(loaded.user.points(), 60);
    assert_eq!(loaded.records.grades()[0].subject, "数学");
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_document() {
    let storage = Storage::sqlite("sqlite:file:memdb_state_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect + migrate");

    let mut state = sample_state();
    storage
        .state
        .save_snapshot(&StateSnapshot::from_state(&state))
        .await
        .expect("first save");

    state.user.add_points(1);
    storage
        .state
        .save_snapshot(&StateSnapshot::from_state(&state))
        .await
        .expect("second save");

    let loaded = storage
        .state
        .load_snapshot()
        .await
        .expect("load")
        .expect("present")
        .into_state();
    assert_eq!(loaded.user.points(), 61);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_state_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .expect("count");
    assert_eq!(count, 1);
}
