//! Staff and dashboard session tokens.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload. They
//! are issued by the account service; this crate only validates them, plus
//! [`generate_access_token`] for operators and tests.

use backstage_core::error::CoreError;
use backstage_core::roles::Actor;
use backstage_core::types::DbId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Role name (`admin`, `manager`, `organizer`, `promoter`, `artist`).
    pub role: String,
    /// Account email; required for organizer and promoter sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Linked artist for artist sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<DbId>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

impl Claims {
    /// The actor these claims describe.
    pub fn actor(&self) -> Result<Actor, CoreError> {
        Actor::from_claims(self.sub, &self.role, self.email.as_deref(), self.artist_id)
    }
}

/// Configuration for JWT validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `15`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
        }
    }
}

/// Generate an HS256 access token for an actor.
pub fn generate_access_token(
    actor: &Actor,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: actor.user_id(),
        role: actor.role().to_string(),
        email: actor.requester_email().map(str::to_string),
        artist_id: actor.artist_id(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        }
    }

    #[test]
    fn organizer_token_round_trips_to_actor() {
        let config = test_config();
        let actor = Actor::Organizer {
            user_id: 42,
            email: "booker@festival.test".to_string(),
        };
        let token = generate_access_token(&actor, &config).expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "organizer");
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.actor().unwrap(), actor);
    }

    #[test]
    fn artist_token_carries_artist_id() {
        let config = test_config();
        let actor = Actor::Artist {
            user_id: 5,
            artist_id: 9,
        };
        let token = generate_access_token(&actor, &config).unwrap();
        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.artist_id, Some(9));
        assert_eq!(claims.email, None);
    }

    #[test]
    fn expired_token_fails() {
        let config = test_config();

        // Past the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "manager".to_string(),
            email: None,
            artist_id: None,
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn different_secrets_fail() {
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            access_token_expiry_mins: 15,
        };
        let token = generate_access_token(&Actor::Admin { user_id: 1 }, &test_config()).unwrap();

        assert!(validate_token(&token, &config_b).is_err());
    }

    #[test]
    fn organizer_claims_without_email_are_rejected() {
        let claims = Claims {
            sub: 3,
            role: "organizer".to_string(),
            email: None,
            artist_id: None,
            exp: 0,
            iat: 0,
            jti: String::new(),
        };
        assert!(matches!(claims.actor(), Err(CoreError::Unauthorized(_))));
    }
}
