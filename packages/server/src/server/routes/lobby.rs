//! Lobby HTTP handlers.
//!
//! Thin adapters: resolve the caller, parse the path, call the action, shape
//! the response. Every failure is a `LobbyError` rendered as JSON.

use axum::{
    body::Bytes,
    extract::{Extension, FromRequest, Path},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::common::{LobbyId, UserId};
use crate::domains::auth::{display_name, issue_guest};
use crate::domains::lobby::actions;
use crate::domains::lobby::data::{
    CreateLobbyInput, CreateLobbyResponse, JoinLobbyInput, JoinLobbyResponse, LobbyData,
    ParticipantData, RestaurantsData, RevoteInput, SwipeInput, SwipeProgressData,
    VibeStatusData, VoteInput, VotingData,
};
use crate::domains::lobby::models::VibeCheck;
use crate::domains::lobby::LobbyError;
use crate::server::app::AxumAppState;
use crate::server::middleware::AuthUser;

type Auth = Option<Extension<AuthUser>>;

/// `Json` whose rejections render as `validation_error` bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(LobbyError))]
pub struct AppJson<T>(pub T);

pub(crate) fn parse_lobby_id(raw: &str) -> Result<LobbyId, LobbyError> {
    LobbyId::parse(raw).map_err(|_| LobbyError::lobby_not_found())
}

/// Caller identity for create/join: the token's user, or a fresh guest when
/// no token was sent. A token that was sent but failed verification is a 401.
struct Caller {
    user_id: UserId,
    name: String,
    guest_token: Option<String>,
}

fn resolve_caller(
    state: &AxumAppState,
    auth: Auth,
    headers: &HeaderMap,
    requested_name: Option<&str>,
) -> Result<Caller, LobbyError> {
    match auth {
        Some(Extension(user)) => Ok(Caller {
            user_id: user.user_id,
            name: display_name(requested_name).unwrap_or(user.name),
            guest_token: None,
        }),
        None if headers.contains_key(header::AUTHORIZATION) => {
            Err(LobbyError::AuthenticationRequired)
        }
        None => {
            let guest = issue_guest(&state.jwt_service, requested_name)?;
            Ok(Caller {
                user_id: guest.user_id,
                name: guest.name,
                guest_token: Some(guest.token),
            })
        }
    }
}

pub async fn create_lobby_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateLobbyResponse>), LobbyError> {
    // The body is optional, but if one is sent it must parse
    let input = if body.is_empty() {
        CreateLobbyInput::default()
    } else {
        Json::<CreateLobbyInput>::from_bytes(&body)?.0
    };
    let caller = resolve_caller(&state, auth, &headers, input.name.as_deref())?;

    let lobby = actions::create_lobby(caller.user_id, caller.name, &state.server_deps).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateLobbyResponse {
            lobby_id: lobby.id,
            code: lobby.code,
            guest_token: caller.guest_token,
        }),
    ))
}

pub async fn join_lobby_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    headers: HeaderMap,
    AppJson(input): AppJson<JoinLobbyInput>,
) -> Result<Json<JoinLobbyResponse>, LobbyError> {
    let caller = resolve_caller(&state, auth, &headers, input.name.as_deref())?;

    let (lobby, participant) =
        actions::join_lobby(&input.code, caller.user_id, caller.name, &state.server_deps).await?;

    Ok(Json(JoinLobbyResponse {
        lobby_id: lobby.id,
        code: lobby.code,
        status: lobby.status,
        participant: ParticipantData::from(&participant),
        guest_token: caller.guest_token,
    }))
}

pub async fn get_lobby_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<String>,
) -> Result<Json<LobbyData>, LobbyError> {
    let lobby = actions::get_lobby(parse_lobby_id(&id)?, &state.server_deps).await?;
    Ok(Json(LobbyData::from(&lobby)))
}

pub async fn start_matching_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<LobbyData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let lobby =
        actions::start_matching(parse_lobby_id(&id)?, user.user_id, &state.server_deps).await?;
    Ok(Json(LobbyData::from(&lobby)))
}

pub async fn submit_vibe_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
    AppJson(vibe): AppJson<VibeCheck>,
) -> Result<Json<VibeStatusData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let lobby =
        actions::submit_vibe(parse_lobby_id(&id)?, user.user_id, vibe, &state.server_deps).await?;
    Ok(Json(VibeStatusData::for_caller(&lobby, user.user_id)))
}

pub async fn vibe_status_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<VibeStatusData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let status = actions::vibe_status(parse_lobby_id(&id)?, user.user_id, &state.server_deps).await?;
    Ok(Json(status))
}

pub async fn restaurants_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<RestaurantsData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let data = actions::restaurants(parse_lobby_id(&id)?, user.user_id, &state.server_deps).await?;
    Ok(Json(data))
}

pub async fn swipe_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
    AppJson(input): AppJson<SwipeInput>,
) -> Result<Json<SwipeProgressData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let lobby = actions::swipe(
        parse_lobby_id(&id)?,
        user.user_id,
        &input.restaurant_id,
        input.direction,
        &state.server_deps,
    )
    .await?;
    Ok(Json(SwipeProgressData::from(&lobby)))
}

pub async fn swipe_progress_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<SwipeProgressData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let data =
        actions::swipe_progress(parse_lobby_id(&id)?, user.user_id, &state.server_deps).await?;
    Ok(Json(data))
}

pub async fn voting_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<VotingData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let data = actions::voting(parse_lobby_id(&id)?, user.user_id, &state.server_deps).await?;
    Ok(Json(data))
}

pub async fn vote_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
    AppJson(input): AppJson<VoteInput>,
) -> Result<Json<VotingData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let lobby = actions::vote(
        parse_lobby_id(&id)?,
        user.user_id,
        &input.restaurant_id,
        &state.server_deps,
    )
    .await?;
    Ok(Json(VotingData::for_caller(&lobby, user.user_id)))
}

pub async fn revote_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
    AppJson(input): AppJson<RevoteInput>,
) -> Result<Json<VotingData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let lobby = actions::revote(
        parse_lobby_id(&id)?,
        user.user_id,
        input.use_tied_only,
        &state.server_deps,
    )
    .await?;
    Ok(Json(VotingData::for_caller(&lobby, user.user_id)))
}

pub async fn reset_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<LobbyData>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let lobby = actions::reset_lobby(parse_lobby_id(&id)?, user.user_id, &state.server_deps).await?;
    Ok(Json(LobbyData::from(&lobby)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResponse {
    pub lobby_id: LobbyId,
    pub left: bool,
}

pub async fn leave_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<LeaveResponse>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let lobby = actions::leave_lobby(parse_lobby_id(&id)?, user.user_id, &state.server_deps).await?;
    Ok(Json(LeaveResponse {
        lobby_id: lobby.id,
        left: true,
    }))
}
