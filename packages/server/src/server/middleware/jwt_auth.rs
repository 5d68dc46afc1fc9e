use crate::common::UserId;
use crate::domains::auth::JwtService;
use crate::domains::lobby::LobbyError;
use axum::{extract::Extension, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

/// Caller identity decoded from a verified token.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub name: String,
    pub is_guest: bool,
}

impl AuthUser {
    /// Unwrap the optional extractor, or fail with 401.
    pub fn require(auth: Option<Extension<AuthUser>>) -> Result<AuthUser, LobbyError> {
        auth.map(|Extension(user)| user)
            .ok_or(LobbyError::AuthenticationRequired)
    }
}

/// Attach an `AuthUser` to the request when it carries a valid token.
///
/// Requests without one pass through untouched; handlers that need a caller
/// call `AuthUser::require`.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!(user_id = %user.user_id, is_guest = user.is_guest, "Authenticated user");
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Read the Authorization header, with or without the `Bearer ` prefix.
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    user_from_token(token, jwt_service)
}

/// Verify a raw token into an `AuthUser`.
pub fn user_from_token(token: &str, jwt_service: &JwtService) -> Option<AuthUser> {
    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        user_id: UserId::from_uuid(claims.user_id),
        name: claims.name,
        is_guest: claims.is_guest,
    })
}
