//! Postgres store tests against a throwaway container.
//!
//! Ignored by default since they need Docker:
//!   cargo test --test pg_store_tests -- --ignored

use std::sync::Arc;

use anyhow::{Context, Result};
use lobby_core::common::UserId;
use lobby_core::domains::lobby::models::{SwipeDirection, VibeCheck};
use lobby_core::domains::lobby::{actions, Lobby, LobbyStatus};
use lobby_core::domains::visits::Visit;
use lobby_core::kernel::{
    mock_restaurant, BaseLobbyStore, BaseVisitStore, LobbySettings, MockCandidateSupplier,
    PgLobbyStore, PgVisitStore, ServerDeps,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

struct TestDb {
    pool: PgPool,
    _container: ContainerAsync<Postgres>,
}

async fn start_db() -> Result<TestDb> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let container = Postgres::default()
        .with_tag("16")
        .start()
        .await
        .context("Failed to start Postgres container")?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .context("Failed to connect to test database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(TestDb {
        pool,
        _container: container,
    })
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_compare_and_swap_rejects_stale_version() -> Result<()> {
    let db = start_db().await?;
    let store = PgLobbyStore::new(db.pool.clone());

    let mut lobby = Lobby::new("123456".to_string(), UserId::new(), "Ana".to_string());
    assert!(store.insert(&lobby).await?);

    let loaded = store.find(lobby.id).await?.context("lobby missing")?;
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.lobby, lobby);

    lobby.round = 2;
    assert!(store.compare_and_swap(&lobby, 1).await?);
    // Same expected version again: the first writer already won
    assert!(!store.compare_and_swap(&lobby, 1).await?);

    let reloaded = store.find(lobby.id).await?.context("lobby missing")?;
    assert_eq!(reloaded.version, 2);
    assert_eq!(reloaded.lobby.round, 2);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_codes_are_unique_among_active_lobbies_only() -> Result<()> {
    let db = start_db().await?;
    let store = PgLobbyStore::new(db.pool.clone());

    let mut first = Lobby::new("555555".to_string(), UserId::new(), "Ana".to_string());
    assert!(store.insert(&first).await?);
    assert!(store.code_in_use("555555").await?);

    let clash = Lobby::new("555555".to_string(), UserId::new(), "Ben".to_string());
    assert!(!store.insert(&clash).await?);

    // Completing the first lobby frees its code
    first.status = LobbyStatus::Completed;
    assert!(store.compare_and_swap(&first, 1).await?);
    assert!(!store.code_in_use("555555").await?);
    assert!(store.find_active_by_code("555555").await?.is_none());

    let second = Lobby::new("555555".to_string(), UserId::new(), "Ben".to_string());
    assert!(store.insert(&second).await?);

    // Reactivating the first under the same code would clash: lost swap, not an error
    first.status = LobbyStatus::Waiting;
    assert!(!store.compare_and_swap(&first, 2).await?);

    let found = store
        .find_active_by_code("555555")
        .await?
        .context("active lobby missing")?;
    assert_eq!(found.lobby.id, second.id);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_visit_recorded_once_per_round() -> Result<()> {
    let db = start_db().await?;
    let lobbies = PgLobbyStore::new(db.pool.clone());
    let visits = PgVisitStore::new(db.pool.clone());

    let host = UserId::new();
    let guest = UserId::new();
    let lobby = Lobby::new("777777".to_string(), host, "Ana".to_string());
    lobbies.insert(&lobby).await?;

    let visit = Visit {
        lobby_id: lobby.id,
        round: 1,
        restaurant: mock_restaurant("3"),
        participant_ids: vec![host, guest],
        visited_at: chrono::Utc::now(),
    };

    assert!(visits.record(&visit).await?);
    assert!(!visits.record(&visit).await?);

    let history = visits.list_for_user(guest).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].restaurant.id, "3");
    assert_eq!(history[0].participant_ids, vec![host, guest]);

    assert!(visits.list_for_user(UserId::new()).await?.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_full_round_against_postgres() -> Result<()> {
    let db = start_db().await?;
    let visit_store = Arc::new(PgVisitStore::new(db.pool.clone()));
    let deps = ServerDeps::new(
        Arc::new(PgLobbyStore::new(db.pool.clone())),
        visit_store.clone(),
        Arc::new(MockCandidateSupplier::numbered(3)),
        LobbySettings::default(),
    );

    let host = UserId::new();
    let guest = UserId::new();
    let lobby = actions::create_lobby(host, "Ana".to_string(), &deps).await?;
    actions::join_lobby(&lobby.code, guest, "Ben".to_string(), &deps).await?;

    let vibe: VibeCheck = serde_json::from_value(serde_json::json!({
        "mealVolume": "any",
        "budget": "any",
        "mood": "any",
        "distance": "any"
    }))?;
    actions::submit_vibe(lobby.id, host, vibe, &deps).await?;
    actions::submit_vibe(lobby.id, guest, vibe, &deps).await?;

    let matching = actions::start_matching(lobby.id, host, &deps).await?;
    assert_eq!(matching.status, LobbyStatus::Matching);

    for user in [host, guest] {
        for id in ["1", "2", "3"] {
            actions::swipe(lobby.id, user, id, SwipeDirection::Right, &deps).await?;
        }
    }

    actions::vote(lobby.id, host, "2", &deps).await?;
    let done = actions::vote(lobby.id, guest, "2", &deps).await?;
    assert_eq!(done.status, LobbyStatus::Completed);
    assert_eq!(done.winning_restaurant.as_deref(), Some("2"));

    let history = visit_store.list_for_user(host).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].restaurant.id, "2");
    Ok(())
}
