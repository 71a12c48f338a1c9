//! Stateless JWT issuing and verification (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{CurrentUser, Role, User};
use crate::shared::{AppError, AppResult};

/// Claims carried in every access token. The middleware trusts this tuple
/// without a database round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub clinic_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Lifetime of issued tokens, for the `expiresIn` field of auth
    /// responses.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            clinic_id: user.clinic_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("token encoding failed: {e}")))
    }

    /// Validate signature and expiry, returning the identity the token
    /// vouches for.
    pub fn verify(&self, token: &str) -> AppResult<CurrentUser> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;
        Ok(CurrentUser {
            id: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
            clinic_id: data.claims.clinic_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "dr.patel@clinic.example".to_string(),
            password_hash: None,
            first_name: "Asha".to_string(),
            last_name: "Patel".to_string(),
            role: Role::Manager,
            clinic_id: Uuid::new_v4(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let svc = TokenService::new("test-secret", 3600);
        let user = user();
        let token = svc.issue(&user).unwrap();
        let current = svc.verify(&token).unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.clinic_id, user.clinic_id);
        assert_eq!(current.role, Role::Manager);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let svc = TokenService::new("test-secret", 3600);
        let other = TokenService::new("other-secret", 3600);
        let token = other.issue(&user()).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = TokenService::new("test-secret", -120);
        let token = svc.issue(&user()).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let svc = TokenService::new("test-secret", 3600);
        assert!(svc.verify("not-a-token").is_err());
    }
}
