use axum::{extract::Extension, Json};

use crate::domains::lobby::LobbyError;
use crate::domains::visits::{actions::list_visits, Visit};
use crate::server::app::AxumAppState;
use crate::server::middleware::AuthUser;

/// The caller's visit history, newest first.
pub async fn my_visits_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
) -> Result<Json<Vec<Visit>>, LobbyError> {
    let user = AuthUser::require(auth)?;
    let visits = list_visits(user.user_id, &state.server_deps).await?;
    Ok(Json(visits))
}
