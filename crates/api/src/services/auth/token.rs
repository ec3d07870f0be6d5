//! Bearer tokens.
//!
//! Tokens are HS256 JWTs with claims
//! `{"id": <user id>, "iat": <unix secs>, "exp": <unix secs>}`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use fieldops_core::UserId;

use super::AuthError;

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Claims {
    id: UserId,
    iat: i64,
    exp: i64,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer whose tokens live for `ttl`.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a token for `user`, valid from `now` for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the expiry is out of range or the
    /// token cannot be encoded.
    pub fn issue(&self, user: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::TokenSigning("token expiry out of range".to_owned()))?;
        let claims = Claims {
            id: user,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    /// Check a token's signature and expiry and return the user it names.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is malformed, signed
    /// with another secret or algorithm, or expired at `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `now`, not the system clock.
        validation.validate_exp = false;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map_err(|_| AuthError::InvalidToken)?;

        if data.claims.exp <= now.timestamp() {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims.id)
    }
}
