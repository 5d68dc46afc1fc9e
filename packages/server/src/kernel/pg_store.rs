//! Postgres-backed lobby and visit stores.
//!
//! Lobbies live in a single JSONB document per row, guarded by an integer
//! `version`. Writers swap the whole document with
//! `UPDATE ... WHERE version = $expected`, so two racing transitions can
//! never both commit.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::{BaseLobbyStore, BaseVisitStore, VersionedLobby};
use crate::common::{LobbyId, UserId};
use crate::domains::lobby::models::{Lobby, Restaurant};
use crate::domains::visits::Visit;

#[derive(sqlx::FromRow)]
struct LobbyRow {
    document: Json<Lobby>,
    version: i64,
}

impl From<LobbyRow> for VersionedLobby {
    fn from(row: LobbyRow) -> Self {
        Self {
            lobby: row.document.0,
            version: row.version,
        }
    }
}

#[derive(Clone)]
pub struct PgLobbyStore {
    pool: PgPool,
}

impl PgLobbyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseLobbyStore for PgLobbyStore {
    async fn insert(&self, lobby: &Lobby) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO lobbies (id, code, status, active, version, document, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 1, $5, $6, $7)
             ON CONFLICT DO NOTHING",
        )
        .bind(lobby.id)
        .bind(&lobby.code)
        .bind(lobby.status.to_string())
        .bind(lobby.is_active())
        .bind(Json(lobby))
        .bind(lobby.created_at)
        .bind(lobby.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert lobby")?;

        Ok(result.rows_affected() == 1)
    }

    async fn find(&self, id: LobbyId) -> Result<Option<VersionedLobby>> {
        let row = sqlx::query_as::<_, LobbyRow>("SELECT document, version FROM lobbies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load lobby")?;

        Ok(row.map(Into::into))
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<VersionedLobby>> {
        let row = sqlx::query_as::<_, LobbyRow>(
            "SELECT document, version FROM lobbies WHERE code = $1 AND active",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up lobby code")?;

        Ok(row.map(Into::into))
    }

    async fn code_in_use(&self, code: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM lobbies WHERE code = $1 AND active)",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check lobby code")
    }

    async fn compare_and_swap(&self, lobby: &Lobby, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE lobbies
             SET code = $2,
                 status = $3,
                 active = $4,
                 document = $5,
                 updated_at = $6,
                 version = version + 1
             WHERE id = $1 AND version = $7",
        )
        .bind(lobby.id)
        .bind(&lobby.code)
        .bind(lobby.status.to_string())
        .bind(lobby.is_active())
        .bind(Json(lobby))
        .bind(lobby.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await;

        match result {
            Ok(result) => Ok(result.rows_affected() == 1),
            // Reactivating a lobby whose code another active lobby now holds.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(false),
            Err(err) => Err(err).context("Failed to save lobby"),
        }
    }
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    lobby_id: LobbyId,
    round: i32,
    restaurant: Json<Restaurant>,
    participant_ids: Vec<Uuid>,
    visited_at: DateTime<Utc>,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        Self {
            lobby_id: row.lobby_id,
            round: row.round,
            restaurant: row.restaurant.0,
            participant_ids: row.participant_ids.into_iter().map(UserId::from_uuid).collect(),
            visited_at: row.visited_at,
        }
    }
}

#[derive(Clone)]
pub struct PgVisitStore {
    pool: PgPool,
}

impl PgVisitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseVisitStore for PgVisitStore {
    async fn record(&self, visit: &Visit) -> Result<bool> {
        let participant_ids: Vec<Uuid> = visit.participant_ids.iter().map(|id| id.into_uuid()).collect();

        let result = sqlx::query(
            "INSERT INTO visits (lobby_id, round, restaurant_id, restaurant, participant_ids, visited_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (lobby_id, round) DO NOTHING",
        )
        .bind(visit.lobby_id)
        .bind(visit.round)
        .bind(&visit.restaurant.id)
        .bind(Json(&visit.restaurant))
        .bind(participant_ids)
        .bind(visit.visited_at)
        .execute(&self.pool)
        .await
        .context("Failed to record visit")?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Visit>> {
        let rows = sqlx::query_as::<_, VisitRow>(
            "SELECT lobby_id, round, restaurant, participant_ids, visited_at
             FROM visits
             WHERE $1 = ANY(participant_ids)
             ORDER BY visited_at DESC",
        )
        .bind(user_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list visits")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
