//! Lobby effects - run once per committed mutation.
//!
//! Only the writer whose compare-and-swap succeeded runs these, so every
//! event is observed exactly once per process that produced it.

use tracing::{debug, error, info};

use crate::domains::lobby::events::LobbyEvent;
use crate::domains::lobby::models::Lobby;
use crate::domains::visits::Visit;
use crate::kernel::{LobbyUpdate, ServerDeps};

/// A mutation that made it into the store.
#[derive(Debug, Clone)]
pub struct Committed {
    pub lobby: Lobby,
    /// Version the document now has in the store.
    pub version: i64,
    /// Empty when the mutation was a no-op and nothing was written.
    pub events: Vec<LobbyEvent>,
}

impl Committed {
    pub fn completed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, LobbyEvent::Completed { .. }))
    }
}

pub async fn lobby_effect(committed: &Committed, deps: &ServerDeps) {
    if committed.events.is_empty() {
        return;
    }

    log_events(committed);

    deps.stream_hub
        .publish(LobbyUpdate {
            lobby_id: committed.lobby.id,
            status: committed.lobby.status,
            round: committed.lobby.round,
            version: committed.version,
            events: committed.events.clone(),
        })
        .await;

    if committed.completed() {
        record_visit(&committed.lobby, deps).await;
    }
}

fn log_events(committed: &Committed) {
    let lobby = &committed.lobby;
    for event in &committed.events {
        match event.status_after() {
            Some(status) => info!(
                lobby_id = %lobby.id,
                round = lobby.round,
                status = %status,
                event = ?event,
                "Lobby transitioned"
            ),
            None => debug!(lobby_id = %lobby.id, event = ?event, "Lobby event"),
        }
    }
}

/// Write the round's Visit. The store ignores a second write for the same
/// `(lobby, round)`; failures are logged and never undo the completion.
async fn record_visit(lobby: &Lobby, deps: &ServerDeps) {
    let Some(visit) = Visit::for_completed(lobby) else {
        error!(lobby_id = %lobby.id, "Completed lobby has no resolvable winner");
        return;
    };

    match deps.visit_store.record(&visit).await {
        Ok(true) => info!(
            lobby_id = %lobby.id,
            round = lobby.round,
            restaurant_id = %visit.restaurant.id,
            participants = visit.participant_ids.len(),
            "Visit recorded"
        ),
        Ok(false) => debug!(lobby_id = %lobby.id, round = lobby.round, "Visit already recorded"),
        Err(e) => error!(lobby_id = %lobby.id, error = %e, "Failed to record visit"),
    }
}
