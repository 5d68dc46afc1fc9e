//! SSE streaming endpoint.
//!
//! GET /lobby/:id/events?token=JWT
//!
//! Pushes a `lobby_updated` event after every committed mutation of the
//! lobby. Clients re-fetch whatever view they are showing; polling the
//! regular endpoints keeps working without this.
//!
//! Auth strategy: EventSource can't send custom headers, so the JWT may be
//! passed as `?token=`. The Authorization header is honoured too.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path, Query},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::debug;

use crate::domains::lobby::actions::commit::load;
use crate::domains::lobby::LobbyError;
use crate::server::app::AxumAppState;
use crate::server::middleware::{user_from_token, AuthUser};
use crate::server::routes::lobby::parse_lobby_id;

#[derive(Deserialize)]
pub struct StreamQuery {
    /// JWT token for authentication
    token: Option<String>,
}

pub async fn stream_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, LobbyError> {
    let user = match auth {
        Some(Extension(user)) => user,
        None => query
            .token
            .as_deref()
            .and_then(|token| user_from_token(token, &state.jwt_service))
            .ok_or(LobbyError::AuthenticationRequired)?,
    };

    let lobby_id = parse_lobby_id(&id)?;
    let lobby = load(lobby_id, &state.server_deps).await?.lobby;
    if !lobby.is_participant(user.user_id) {
        return Err(LobbyError::Unauthorized(
            "Only participants can follow this lobby".to_string(),
        ));
    }

    let rx = state.server_deps.stream_hub.subscribe(lobby_id).await;
    debug!(lobby_id = %lobby_id, user_id = %user.user_id, "Lobby stream opened");

    // Stream with connected event and lag handling
    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = BroadcastStream::new(rx).filter_map(|result| async {
        match result {
            Ok(update) => Event::default()
                .event("lobby_updated")
                .json_data(&update)
                .ok()
                .map(Ok),
            Err(BroadcastStreamRecvError::Lagged(n)) => Event::default()
                .event("lagged")
                .json_data(serde_json::json!({ "missed": n }))
                .ok()
                .map(Ok),
        }
    });

    Ok(Sse::new(connected.chain(events)).keep_alive(KeepAlive::default()))
}
