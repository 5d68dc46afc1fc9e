//! Guest identities: a fresh user id and a signed token, no credential.

use anyhow::Result;
use tracing::info;

use super::JwtService;
use crate::common::UserId;

pub const MAX_NAME_CHARS: usize = 40;
pub const DEFAULT_GUEST_NAME: &str = "Guest";

#[derive(Debug, Clone)]
pub struct GuestIdentity {
    pub user_id: UserId,
    pub name: String,
    pub token: String,
}

/// Trimmed display name capped at `MAX_NAME_CHARS`; `None` if blank.
pub fn display_name(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

pub fn issue_guest(jwt: &JwtService, name: Option<&str>) -> Result<GuestIdentity> {
    let user_id = UserId::new();
    let name = display_name(name).unwrap_or_else(|| DEFAULT_GUEST_NAME.to_string());
    let token = jwt.create_token(user_id, name.clone(), true)?;

    info!(user_id = %user_id, "Issued guest identity");
    Ok(GuestIdentity {
        user_id,
        name,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_trims_and_caps() {
        assert_eq!(display_name(Some("  Ana  ")), Some("Ana".to_string()));
        assert_eq!(display_name(Some("   ")), None);
        assert_eq!(display_name(None), None);

        let long = "x".repeat(100);
        assert_eq!(display_name(Some(&long)).unwrap().chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_guest_token_round_trips() {
        let jwt = JwtService::new("secret", "lobby-server".to_string());
        let guest = issue_guest(&jwt, Some("Bo")).unwrap();

        let claims = jwt.verify_token(&guest.token).unwrap();
        assert_eq!(claims.user_id, guest.user_id.into_uuid());
        assert_eq!(claims.name, "Bo");
        assert!(claims.is_guest);
    }

    #[test]
    fn test_unnamed_guest_gets_default_name() {
        let jwt = JwtService::new("secret", "lobby-server".to_string());
        let guest = issue_guest(&jwt, None).unwrap();
        assert_eq!(guest.name, DEFAULT_GUEST_NAME);
    }
}
