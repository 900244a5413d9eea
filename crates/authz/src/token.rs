//! Bearer token issuance and verification.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use atlas_kernel::settings::AuthSettings;

use crate::error::AuthError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Signs and verifies bearer tokens with a shared HMAC secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(&settings.jwt_secret, settings.token_ttl_secs)
    }

    /// Issue a token for `user_id`.
    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.lifetime_secs,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Validate signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let issuer = TokenIssuer::new("test-secret", 3600);

        let token = issuer.issue("user-001").unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", -60);
        let token = issuer.issue("user-001").unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        let other = TokenIssuer::new("other-secret", 3600);
        let token = other.issue("user-001").unwrap();

        assert!(issuer.verify(&token).is_err());
        assert!(issuer.verify("not-a-token").is_err());
    }
}
