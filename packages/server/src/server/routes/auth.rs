//! Guest identity issuance.

use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};

use crate::common::UserId;
use crate::domains::auth::issue_guest;
use crate::domains::lobby::LobbyError;
use crate::server::app::AxumAppState;

#[derive(Debug, Default, Deserialize)]
pub struct GuestInput {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestResponse {
    pub user_id: UserId,
    pub name: String,
    pub token: String,
}

pub async fn guest_handler(
    Extension(state): Extension<AxumAppState>,
    body: Option<Json<GuestInput>>,
) -> Result<Json<GuestResponse>, LobbyError> {
    let input = body.map(|Json(input)| input).unwrap_or_default();
    let guest = issue_guest(&state.jwt_service, input.name.as_deref())?;

    Ok(Json(GuestResponse {
        user_id: guest.user_id,
        name: guest.name,
        token: guest.token,
    }))
}
