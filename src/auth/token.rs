//! Signing and verifying the JSON Web Tokens used as bearer tokens.

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserId};

/// The claims carried by a session token.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: UserId,
    /// When the token was issued, as a unix timestamp.
    pub iat: i64,
    /// When the token expires, as a unix timestamp. Tokens without an expiry
    /// are valid until the signing secret changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// The keys for signing and verifying session tokens with HS256.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    duration: Option<Duration>,
}

impl Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("encoding_key", &"[redacted]")
            .field("decoding_key", &"[redacted]")
            .field("duration", &self.duration)
            .finish()
    }
}

impl TokenKeys {
    /// Create keys from a shared `secret`. Tokens do not expire unless a
    /// duration is set with [TokenKeys::with_duration].
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            duration: None,
        }
    }

    /// Set how long new tokens are valid for.
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Sign a token for `user_id` issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::TokenCreation] if the token could not be signed.
    pub fn encode(&self, user_id: UserId, now: OffsetDateTime) -> Result<String, Error> {
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: self
                .duration
                .map(|duration| (now + duration).unix_timestamp()),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|error| Error::TokenCreation(error.to_string()))
    }

    /// Verify the signature and expiry of `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidToken] if the token is malformed, was signed
    /// with another secret or has expired.
    pub fn decode(&self, token: &str) -> Result<Claims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is optional, but is still checked when present.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|error| {
                tracing::debug!("Rejected token: {error}");
                Error::InvalidToken
            })
    }
}
