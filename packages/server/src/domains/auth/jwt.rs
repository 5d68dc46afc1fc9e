use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::UserId;

const TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried by every lobby token, guest or credentialed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,    // Subject (user_id as string)
    pub user_id: Uuid,  // User UUID
    pub name: String,   // Display name
    pub is_guest: bool, // Issued by the guest flow, no credential behind it
    pub exp: i64,       // Expiration timestamp
    pub iat: i64,       // Issued at timestamp
    pub iss: String,    // Issuer
    pub jti: String,    // JWT ID (unique token identifier)
}

/// HS256 token signing and verification.
///
/// Credentialed tokens come from the external identity provider, signed with
/// the same secret; this service only mints guest tokens itself.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Sign a token for `user_id`, valid for 24 hours.
    pub fn create_token(&self, user_id: UserId, name: String, is_guest: bool) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(TOKEN_TTL_HOURS);

        let claims = Claims {
            sub: user_id.to_string(),
            user_id: user_id.into_uuid(),
            name,
            is_guest,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Check signature, expiry and issuer, then hand back the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}
