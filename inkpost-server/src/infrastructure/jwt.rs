use crate::domain::DomainError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub exp: usize,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64) -> Result<Self, DomainError> {
        if secret.len() < 32 {
            tracing::warn!(
                "JWT secret is too short ({} chars). Minimum recommended is 32 chars.",
                secret.len()
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        })
    }

    pub fn generate_token(&self, user_id: i64, username: String) -> Result<String, DomainError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(self.expiry_hours))
            .expect("valid timestamp")
            .timestamp() as usize;

        let claims = Claims {
            user_id,
            username,
            exp: expiration,
        };

        match encode(&Header::default(), &claims, &self.encoding_key) {
            Ok(token) => Ok(token),
            Err(e) => {
                tracing::error!("Failed to encode token: {}", e);
                Err(DomainError::InternalError(format!(
                    "Failed to generate token: {}",
                    e
                )))
            }
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<i64, DomainError> {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(token_data) => {
                tracing::debug!("Token verified for user_id: {}", token_data.claims.user_id);
                Ok(token_data.claims.user_id)
            }
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
                Err(DomainError::Unauthorized(format!("Invalid token: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-test-secret-that-is-long-enough-0123";

    #[test]
    fn token_roundtrip_yields_user_id() {
        let jwt = JwtService::new(SECRET, 24).unwrap();
        let token = jwt.generate_token(42, "olga".to_string()).unwrap();
        assert_eq!(jwt.verify_token(&token).unwrap(), 42);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Expiry an hour in the past is well beyond the default leeway.
        let jwt = JwtService::new(SECRET, -1).unwrap();
        let token = jwt.generate_token(42, "olga".to_string()).unwrap();
        assert!(matches!(
            jwt.verify_token(&token),
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let jwt = JwtService::new(SECRET, 24).unwrap();
        let other = JwtService::new("another-secret-that-is-long-enough-456", 24).unwrap();
        let token = other.generate_token(42, "olga".to_string()).unwrap();
        assert!(jwt.verify_token(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let jwt = JwtService::new(SECRET, 24).unwrap();
        assert!(jwt.verify_token("not.a.token").is_err());
    }
}
