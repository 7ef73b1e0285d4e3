//! JWT access and refresh token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{api::models::users::Role, config::Config, errors::Error, types::UserId};

/// Marker carried by refresh tokens so they can never pass as access tokens
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Claims carried by a short-lived access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,   // Subject (user ID)
    pub email: String, // User email
    pub role: Role,    // User role at issue time
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

impl AccessClaims {
    pub fn new(id: UserId, email: &str, role: Role, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.access_token_ttl;

        Self {
            sub: id,
            email: email.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Claims carried by a long-lived refresh token. Deliberately minimal:
/// everything else is re-read from the database at refresh time.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    #[serde(rename = "type")]
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

impl RefreshClaims {
    pub fn new(id: UserId, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.refresh_token_ttl;

        Self {
            sub: id,
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn encoding_key(config: &Config) -> Result<EncodingKey, Error> {
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "JWT tokens: secret_key is required".to_string(),
    })?;
    Ok(EncodingKey::from_secret(secret_key.as_bytes()))
}

fn decoding_key(config: &Config) -> Result<DecodingKey, Error> {
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "JWT tokens: secret_key is required".to_string(),
    })?;
    Ok(DecodingKey::from_secret(secret_key.as_bytes()))
}

/// Create an access token for a user
pub fn create_access_token(id: UserId, email: &str, role: Role, config: &Config) -> Result<String, Error> {
    let claims = AccessClaims::new(id, email, role, config);
    encode(&Header::default(), &claims, &encoding_key(config)?).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Create a refresh token for a user
pub fn create_refresh_token(id: UserId, config: &Config) -> Result<String, Error> {
    let claims = RefreshClaims::new(id, config);
    encode(&Header::default(), &claims, &encoding_key(config)?).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Map jsonwebtoken failures to client (401) vs server (500) errors
fn classify_jwt_error(e: jsonwebtoken::errors::Error) -> Error {
    match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        // Catch-all for any future error variants (default to server error for safety)
        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    }
}

/// Verify and decode an access token.
///
/// A refresh token presented here decodes but is rejected because its
/// claims are missing `email` and `role`.
pub fn verify_access_token(token: &str, config: &Config) -> Result<AccessClaims, Error> {
    let token_data = decode::<AccessClaims>(token, &decoding_key(config)?, &Validation::default()).map_err(classify_jwt_error)?;
    Ok(token_data.claims)
}

/// Verify and decode a refresh token, rejecting tokens without the refresh marker
pub fn verify_refresh_token(token: &str, config: &Config) -> Result<RefreshClaims, Error> {
    let token_data = decode::<RefreshClaims>(token, &decoding_key(config)?, &Validation::default()).map_err(classify_jwt_error)?;

    if token_data.claims.token_type != REFRESH_TOKEN_TYPE {
        return Err(Error::Unauthenticated {
            message: Some("Invalid refresh token".to_string()),
        });
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn create_test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_verify_access_token() {
        let config = create_test_config();
        let id = Uuid::new_v4();

        let token = create_access_token(id, "test@example.com", Role::Editor, &config).unwrap();
        assert!(!token.is_empty());

        let claims = verify_access_token(&token, &config).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, Role::Editor);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = create_test_config();
        let id = Uuid::new_v4();

        let token = create_refresh_token(id, &config).unwrap();
        let claims = verify_refresh_token(&token, &config).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.token_type, REFRESH_TOKEN_TYPE);
    }

    #[test]
    fn test_refresh_token_rejected_as_access_token() {
        let config = create_test_config();
        let token = create_refresh_token(Uuid::new_v4(), &config).unwrap();

        // Refresh claims lack email/role, so access decoding must fail
        let result = verify_access_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_access_token_rejected_as_refresh_token() {
        let config = create_test_config();
        let token = create_access_token(Uuid::new_v4(), "a@b.c", Role::Viewer, &config).unwrap();

        let result = verify_refresh_token(&token, &config);
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let token = create_access_token(Uuid::new_v4(), "a@b.c", Role::Admin, &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_access_token(&token, &config);
        // Should be Unauthenticated (InvalidSignature), not Internal error
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        let now = Utc::now();

        // Manually create an expired token by setting exp in the past
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::Viewer,
            exp: (now - chrono::Duration::seconds(3600)).timestamp(),
            iat: (now - chrono::Duration::seconds(7200)).timestamp(),
        };

        let key = EncodingKey::from_secret(config.secret_key.as_ref().unwrap().as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let result = verify_access_token(&token, &config);
        // Should be Unauthenticated (ExpiredSignature), not Internal error
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();

        let malformed_tokens = vec!["not.a.token", "invalid", "", "too.many.parts.in.this.token"];

        for token in malformed_tokens {
            let result = verify_access_token(token, &config);
            assert!(
                matches!(result.unwrap_err(), Error::Unauthenticated { .. }),
                "Expected Unauthenticated error for token: {}",
                token
            );
        }
    }

    #[test]
    fn test_ttls_are_independent() {
        let mut config = create_test_config();
        config.auth.access_token_ttl = Duration::from_secs(60);
        config.auth.refresh_token_ttl = Duration::from_secs(3600);

        let id = Uuid::new_v4();
        let access = create_access_token(id, "a@b.c", Role::Viewer, &config).unwrap();
        let refresh = create_refresh_token(id, &config).unwrap();

        let access_claims = verify_access_token(&access, &config).unwrap();
        let refresh_claims = verify_refresh_token(&refresh, &config).unwrap();
        assert!(refresh_claims.exp > access_claims.exp);
    }
}
