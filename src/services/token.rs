//! Token codec: signed, expiring bearer tokens.
//!
//! Access and email-verification tokens are JWTs carrying `{sub, exp}`
//! signed with the process-wide secret. Decode collapses every failure mode
//! except expiry into `InvalidToken` so callers cannot distinguish a bad
//! signature from malformed claims. Expiry is rejected inside `decode`,
//! against a caller-supplied `now`.

use std::collections::HashSet;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::error::AppError;

/// Scheme label carried inside issued access tokens.
const BEARER_SCHEME: &str = "Bearer";

/// Wire claims. `sub` is the user id, `exp` a Unix timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Authenticated, decoded claims.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_expire_minutes: i64,
    verify_token_expire_hours: i64,
    refresh_token_expire_days: i64,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Result<Self, AppError> {
        let algorithm: Algorithm = config
            .algorithm
            .parse()
            .map_err(|e| AppError::Config(anyhow!("Invalid JWT algorithm: {}", e)))?;

        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AppError::Config(anyhow!(
                "Unsupported JWT algorithm {:?}: only HMAC variants are supported",
                algorithm
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm,
            access_token_expire_minutes: config.access_token_expire_minutes,
            verify_token_expire_hours: config.verify_token_expire_hours,
            refresh_token_expire_days: config.refresh_token_expire_days,
        })
    }

    /// Issue a short-lived access token, scheme prefix included.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let exp = now + Duration::minutes(self.access_token_expire_minutes);
        let jwt = self.sign(user_id, exp)?;
        Ok(format!("{} {}", BEARER_SCHEME, jwt))
    }

    /// Issue an email-verification token: same claim shape, no scheme prefix.
    pub fn issue_verification_token(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let exp = now + Duration::hours(self.verify_token_expire_hours);
        self.sign(user_id, exp)
    }

    /// Decode and authenticate a token.
    ///
    /// Returns `InvalidToken` for anything malformed, unsigned, tampered or
    /// missing/garbled `sub`; `TokenExpired` once `exp <= now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against the injected clock, not the
        // system clock inside jsonwebtoken.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidToken)?;

        let sub = Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::InvalidToken)?;

        if data.claims.exp <= now.timestamp() {
            return Err(AppError::TokenExpired);
        }

        Ok(TokenClaims {
            sub,
            exp: data.claims.exp,
        })
    }

    /// Refresh-session lifetime, in seconds.
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_token_expire_days * 86_400
    }

    /// Access-token lifetime, in minutes.
    pub fn access_ttl_minutes(&self) -> i64 {
        self.access_token_expire_minutes
    }

    fn sign(&self, user_id: Uuid, exp: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
        };
        let header = Header::new(self.algorithm);
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow!("Failed to encode token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&TokenConfig {
            secret: secret.to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            verify_token_expire_hours: 24,
            refresh_token_expire_days: 7,
        })
        .unwrap()
    }

    #[test]
    fn access_token_round_trip_before_expiry() {
        let codec = test_codec("secret");
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let token = codec.issue_access_token(user_id, now).unwrap();
        let bare = token.strip_prefix("Bearer ").expect("scheme prefix");

        let claims = codec.decode(bare, now + Duration::minutes(29)).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn decode_rejects_expired_token() {
        let codec = test_codec("secret");
        let now = Utc::now();
        let token = codec.issue_access_token(Uuid::new_v4(), now).unwrap();
        let bare = token.strip_prefix("Bearer ").unwrap();

        // Exactly at expiry counts as expired.
        let err = codec.decode(bare, now + Duration::minutes(30)).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn decode_rejects_tampered_token() {
        let codec = test_codec("secret");
        let now = Utc::now();
        let token = codec.issue_verification_token(Uuid::new_v4(), now).unwrap();

        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let err = codec.decode(&tampered, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn decode_rejects_foreign_secret() {
        let codec = test_codec("secret");
        let other = test_codec("other-secret");
        let now = Utc::now();

        let token = other.issue_verification_token(Uuid::new_v4(), now).unwrap();
        let err = codec.decode(&token, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn decode_rejects_missing_subject() {
        let codec = test_codec("secret");
        let now = Utc::now();

        #[derive(Serialize)]
        struct NoSub {
            exp: i64,
        }
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &NoSub {
                exp: (now + Duration::hours(1)).timestamp(),
            },
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = codec.decode(&token, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn decode_rejects_non_uuid_subject() {
        let codec = test_codec("secret");
        let now = Utc::now();

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: "not-a-uuid".to_string(),
                exp: (now + Duration::hours(1)).timestamp(),
            },
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = codec.decode(&token, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn verification_token_has_no_scheme_prefix() {
        let codec = test_codec("secret");
        let token = codec
            .issue_verification_token(Uuid::new_v4(), Utc::now())
            .unwrap();
        assert!(!token.starts_with("Bearer "));
    }

    #[test]
    fn rejects_non_hmac_algorithm() {
        let result = TokenCodec::new(&TokenConfig {
            secret: "secret".to_string(),
            algorithm: "RS256".to_string(),
            access_token_expire_minutes: 30,
            verify_token_expire_hours: 24,
            refresh_token_expire_days: 7,
        });
        assert!(result.is_err());
    }
}
