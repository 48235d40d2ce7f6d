pub mod password;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config;
use crate::types::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, role: UserRole) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

fn secret() -> Result<&'static str, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims
pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

/// SHA-256 hex digest of a raw token, stored on logout instead of the token
pub fn token_fingerprint(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let claims = Claims::new(42, UserRole::Landlord);
        let token = generate_jwt(&claims).unwrap();

        let decoded = validate_jwt(&token).unwrap();
        assert_eq!(decoded.sub, 42);
        assert_eq!(decoded.role, UserRole::Landlord);
        assert!(decoded.exp > decoded.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = generate_jwt(&Claims::new(1, UserRole::Admin)).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(validate_jwt(&tampered), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::new(1, UserRole::Agent);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&claims).unwrap();
        assert!(validate_jwt(&token).is_err());
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = token_fingerprint("abc");
        assert_eq!(a, token_fingerprint("abc"));
        assert_ne!(a, token_fingerprint("abd"));
        assert_eq!(a.len(), 64);
        assert_eq!(a, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}
